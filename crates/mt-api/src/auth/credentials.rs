//! Credential store service
//!
//! Business rules between the handlers and the repositories: password
//! hashing on registration, login checks that cost the same whether or not
//! the email exists, and transaction validation. Works against the
//! repository traits only.

use std::sync::Arc;

use tokio::sync::OnceCell;

use mt_core::{
    MtError, NewTransaction, PasswordHashConfig, Result, TransactionId, TransactionRepository,
    User, UserId, UserRepository,
};

use super::password::{hash_password, verify_password};

/// Plaintext behind the hash that unknown emails are checked against
const DUMMY_PASSWORD: &str = "money-tracker-dummy-password";

/// Outcome of a login check
///
/// Callers must answer `UnknownEmail` and `WrongPassword` identically; the
/// distinction exists for audit logs.
#[derive(Debug, Clone)]
pub enum CredentialCheck {
    Valid(User),
    UnknownEmail,
    WrongPassword,
}

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    transactions: Arc<dyn TransactionRepository>,
    password: PasswordHashConfig,
    /// Hash of `DUMMY_PASSWORD` at the configured cost, built on first use
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(
        users: Arc<dyn UserRepository>,
        transactions: Arc<dyn TransactionRepository>,
        password: PasswordHashConfig,
    ) -> Self {
        Self {
            users,
            transactions,
            password,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Build from one backend that holds both users and transactions
    pub fn from_store<S>(store: Arc<S>, password: PasswordHashConfig) -> Self
    where
        S: UserRepository + TransactionRepository + 'static,
    {
        Self::new(store.clone(), store, password)
    }

    /// Register a new account and return its ID
    ///
    /// The email pre-check only spares a hash computation. A concurrent
    /// registration that slips past it is still refused by the store with
    /// `DuplicateEmail`.
    pub async fn save_user(&self, email: &str, password: &str) -> Result<UserId> {
        if self.users.find_user_by_email(email).await?.is_some() {
            return Err(MtError::DuplicateEmail);
        }

        let hash = self.hash(password).await?;
        self.users.create_user(email, &hash).await
    }

    /// Check an email and password pair
    ///
    /// An unknown email is still verified against a dummy hash of the same
    /// cost, so both failure causes take one Argon2 verification.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CredentialCheck> {
        match self.users.find_user_by_email(email).await? {
            Some(user) => {
                if self.verify(password, &user.password_hash).await? {
                    Ok(CredentialCheck::Valid(user))
                } else {
                    Ok(CredentialCheck::WrongPassword)
                }
            }
            None => {
                let dummy = self
                    .dummy_hash
                    .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
                    .await?;
                self.verify(password, dummy).await?;
                Ok(CredentialCheck::UnknownEmail)
            }
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.users
            .find_user_by_email(email)
            .await?
            .ok_or(MtError::UserNotFound)
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<User> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or(MtError::UserNotFound)
    }

    /// Persist a transaction for an existing owner
    pub async fn save_transaction(&self, tx: NewTransaction) -> Result<TransactionId> {
        tx.validate()?;
        self.transactions.create_transaction(&tx).await
    }

    /// Delete a transaction on behalf of `requesting_user`
    ///
    /// Fails with `TransactionNotFound` both when the ID does not exist and
    /// when it belongs to another user.
    pub async fn remove_transaction(
        &self,
        id: TransactionId,
        requesting_user: UserId,
    ) -> Result<()> {
        self.transactions
            .delete_owned_transaction(id, requesting_user)
            .await
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let config = self.password;

        tokio::task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| MtError::HashingError(format!("hashing task failed: {e}")))?
            .map_err(|e| MtError::HashingError(e.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| MtError::HashingError(format!("verification task failed: {e}")))
    }
}
