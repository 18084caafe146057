use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// PHC-formatted Argon2 hash; never the plaintext.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
}

/// A row of the `sessions` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbSession {
    pub token: String,
    pub user_id: i64,
    pub remember: bool,
    pub created_at: i64,
    pub expires_at: i64,
}
