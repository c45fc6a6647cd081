//! Authentication module
//!
//! - Password hashing with Argon2id
//! - JWT access token issuance and validation
//! - Identity middleware and the `AuthenticatedUser` extractor
//! - Credential store service over the repository traits

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use credentials::CredentialStore;
pub use jwt::{generate_access_token, validate_access_token, Claims, JwtConfig, JwtError};
pub use middleware::{auth_middleware, authenticate, AuthError, AuthenticatedUser};
pub use password::{hash_password, verify_password, PasswordError};
