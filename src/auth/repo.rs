use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{Account, Admin},
    db::{inserted, PgStore},
};

/// Account persistence. `Ok(None)` means "no such row", never a fault.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    async fn count_by_email(&self, email: &str) -> anyhow::Result<i64>;
    /// Returns `false` when the id or email is already taken.
    async fn insert(&self, account: &Account) -> anyhow::Result<bool>;
    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Admin>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>>;
    async fn list(&self) -> anyhow::Result<Vec<Admin>>;
    /// Returns `false` when the username is already taken.
    async fn insert(&self, admin: &Admin) -> anyhow::Result<bool>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, verified, verification_code, created_at";
const ADMIN_COLUMNS: &str =
    "id, username, password_hash, email, first_name, last_name, is_super, created_at, updated_at";

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn count_by_email(&self, email: &str) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn insert(&self, account: &Account) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, verified, verification_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.verified)
        .bind(account.verification_code)
        .bind(account.created_at)
        .execute(&self.db)
        .await;
        inserted(result)
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(admin)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(admin)
    }

    async fn list(&self) -> anyhow::Result<Vec<Admin>> {
        let admins = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(admins)
    }

    async fn insert(&self, admin: &Admin) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO admins (id, username, password_hash, email, first_name, last_name,
                                is_super, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(&admin.email)
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(admin.is_super)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.db)
        .await;
        inserted(result)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
