use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::role::RoleSet;
use crate::models::user::{LoginIdentity, User, UserRow};

/// Persistence for user records keyed by the identity provider's uid.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the record on first sign-in or refreshes email, name and
    /// last login otherwise. Roles and creation time are only ever written
    /// by the creating call, and the whole operation is atomic per uid.
    async fn sync_login(&self, identity: &LoginIdentity) -> Result<User>;

    async fn find(&self, uid: &str) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn sync_login(&self, identity: &LoginIdentity) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (uid, email, name, roles, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (uid) DO UPDATE
            SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                last_login_at = NOW()
            RETURNING uid, email, name, roles, created_at, last_login_at
            "#,
        )
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(RoleSet::initial().to_strings())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find(&self, uid: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT uid, email, name, roles, created_at, last_login_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
