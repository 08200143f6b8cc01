use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Mutex;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::Account;

/// Account persistence. Registration mirrors the identity provider's
/// contract: the account is created first, the display name set afterwards.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError>;
    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<Account>, RepositoryError>;
    async fn update_password(&self, id: Uuid, password_hash: &str)
        -> Result<bool, RepositoryError>;
}

// --- Postgres implementation ---

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    password_hash: String,
    created_at: chrono::DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, display_name, photo_url, password_hash, created_at";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO accounts (email, password_hash) VALUES ($1, $2) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET display_name = $1 WHERE id = $2 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(display_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-memory implementation ---

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<Vec<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("account store poisoned");
        if accounts.iter().any(|a| a.email == email) {
            return Err(RepositoryError::Conflict(format!(
                "account already exists for {email}"
            )));
        }
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.accounts.lock().expect("account store poisoned");
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.accounts.lock().expect("account store poisoned");
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("account store poisoned");
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.display_name = Some(display_name.to_string());
                Ok(Some(account.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut accounts = self.accounts.lock().expect("account store poisoned");
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
