//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::auth::{PasswordHash, Principal};
use crate::domain::foundation::{DomainError, UserId, UserRole};
use crate::ports::UserRepository;

const USER_COLUMNS: &str = "id, email, username, full_name, password_hash, is_active, \
     is_verified, is_banned, role, commission_rate, password_reset_token, \
     password_reset_expires, email_verified_at, last_login_at, created_at, updated_at";

/// PostgreSQL-backed principal store.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, clause: &str, value: &str) -> Result<Option<Principal>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch user: {}", e)))?;
        Ok(row.map(|r| row_to_principal(&r)))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, principal: &Principal) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, full_name, password_hash, is_active,
                is_verified, is_banned, role, commission_rate, password_reset_token,
                password_reset_expires, email_verified_at, last_login_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(&principal.email)
        .bind(&principal.username)
        .bind(&principal.full_name)
        .bind(principal.password_hash.as_str())
        .bind(principal.is_active)
        .bind(principal.is_verified)
        .bind(principal.is_banned)
        .bind(principal.role)
        .bind(principal.commission_rate)
        .bind(&principal.password_reset_token)
        .bind(principal.password_reset_expires)
        .bind(principal.email_verified_at)
        .bind(principal.last_login_at)
        .bind(principal.created_at)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert user: {}", e)))?;
        Ok(())
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2, username = $3, full_name = $4, password_hash = $5,
                is_active = $6, is_verified = $7, is_banned = $8, role = $9,
                commission_rate = $10, password_reset_token = $11,
                password_reset_expires = $12, email_verified_at = $13,
                last_login_at = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(&principal.email)
        .bind(&principal.username)
        .bind(&principal.full_name)
        .bind(principal.password_hash.as_str())
        .bind(principal.is_active)
        .bind(principal.is_verified)
        .bind(principal.is_banned)
        .bind(principal.role)
        .bind(principal.commission_rate)
        .bind(&principal.password_reset_token)
        .bind(principal.password_reset_expires)
        .bind(principal.email_verified_at)
        .bind(principal.last_login_at)
        .bind(principal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update user: {}", e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch user: {}", e)))?;
        Ok(row.map(|r| row_to_principal(&r)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError> {
        self.find_one("email = $1", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, DomainError> {
        self.find_one("username = $1", username).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, DomainError> {
        self.find_one("email = $1 OR username = $1", identifier).await
    }
}

fn row_to_principal(row: &PgRow) -> Principal {
    let role: UserRole = row.get("role");
    Principal {
        id: UserId::from_uuid(row.get("id")),
        email: row.get("email"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        password_hash: PasswordHash::from_stored(row.get::<String, _>("password_hash")),
        is_active: row.get("is_active"),
        is_verified: row.get("is_verified"),
        is_banned: row.get("is_banned"),
        role,
        commission_rate: row.get("commission_rate"),
        password_reset_token: row.get("password_reset_token"),
        password_reset_expires: row.get("password_reset_expires"),
        email_verified_at: row.get("email_verified_at"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
