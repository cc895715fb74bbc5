use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::RoleSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Fields refreshed on every sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdentity {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            uid: row.uid,
            email: row.email,
            name: row.name,
            roles: RoleSet::from_stored(row.roles.as_slice()),
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}
