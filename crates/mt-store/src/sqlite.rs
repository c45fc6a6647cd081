//! SQLite store
//!
//! Users and transactions in a single SQLite file via SQLx. Email uniqueness,
//! owner existence and delete ownership are enforced by the schema and by
//! single conditional statements; the pre-checks only produce nicer errors
//! on the common path.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use mt_core::{
    DatabaseConfig, MtError, NewTransaction, Result, Transaction, TransactionId,
    TransactionRepository, User, UserId, UserRepository,
};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        amount INTEGER NOT NULL,
        category TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
"#;

const CREATE_TRANSACTIONS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions (user_id)";

/// SQLite-backed user and transaction store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file and bootstrap the schema
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    MtError::DatabaseError(format!(
                        "Failed to create storage directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.storage_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MtError::DatabaseError(format!("SQLite connection failed: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::info!(
            path = %config.storage_path.display(),
            "storage initialized"
        );

        Ok(store)
    }

    /// Private in-memory database
    ///
    /// Limited to a single connection that is never recycled, because every
    /// SQLite memory connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| MtError::DatabaseError(format!("Invalid SQLite options: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| MtError::DatabaseError(format!("SQLite connection failed: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    pub async fn init_schema(&self) -> Result<()> {
        for statement in [
            CREATE_USERS_TABLE,
            CREATE_TRANSACTIONS_TABLE,
            CREATE_TRANSACTIONS_USER_INDEX,
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| MtError::DatabaseError(format!("Schema init failed: {e}")))?;
        }
        Ok(())
    }

    /// Insert a user row, mapping a UNIQUE violation to `DuplicateEmail`
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<UserId> {
        let result =
            sqlx::query("INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)")
                .bind(email)
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        MtError::DuplicateEmail
                    } else {
                        MtError::DatabaseError(format!("Failed to create user: {e}"))
                    }
                })?;

        Ok(result.last_insert_rowid())
    }

    async fn user_exists(&self, id: UserId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MtError::DatabaseError(format!("Failed to check user: {e}")))?;
        Ok(count > 0)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserId> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MtError::DatabaseError(format!("Failed to check existing user: {e}")))?;

        if existing > 0 {
            return Err(MtError::DuplicateEmail);
        }

        // A concurrent registration can still win between the check and the
        // insert; the UNIQUE constraint decides.
        self.insert_user(email, password_hash).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MtError::DatabaseError(format!("Failed to fetch user: {e}")))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MtError::DatabaseError(format!("Failed to fetch user: {e}")))
    }
}

#[async_trait]
impl TransactionRepository for SqliteStore {
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionId> {
        if !self.user_exists(tx.user_id).await? {
            return Err(MtError::UserNotFound);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (user_id, amount, category, description, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.user_id)
        .bind(tx.amount)
        .bind(&tx.category)
        .bind(&tx.description)
        .bind(tx.date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                MtError::UserNotFound
            } else {
                MtError::DatabaseError(format!("Failed to create transaction: {e}"))
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, category, description, date
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MtError::DatabaseError(format!("Failed to fetch transaction: {e}")))
    }

    async fn delete_owned_transaction(&self, id: TransactionId, owner: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| MtError::DatabaseError(format!("Failed to delete transaction: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(MtError::TransactionNotFound);
        }

        Ok(())
    }
}
