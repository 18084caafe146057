use crate::db::models::{DbSession, Post, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::LogbookError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct LogbookStorage {
    pool: SqlitePool,
}

impl LogbookStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, LogbookError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let mut pool_opts = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            // Every in-memory connection is its own database; pin a single one.
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), LogbookError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// All posts in storage order.
    pub async fn list_posts(&self) -> Result<Vec<Post>, LogbookError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, title, content, author FROM posts ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, LogbookError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, title, content, author FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        author: &str,
    ) -> Result<Post, LogbookError> {
        let post = sqlx::query_as::<_, Post>(
            r#"INSERT INTO posts (title, content, author) VALUES (?, ?, ?)
               RETURNING id, title, content, author"#,
        )
        .bind(title)
        .bind(content)
        .bind(author)
        .fetch_one(&self.pool)
        .await?;
        debug!(post_id = post.id, author = %post.author, "post stored");
        Ok(post)
    }

    pub async fn find_user_by_username(&self, name: &str) -> Result<Option<User>, LogbookError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password FROM users WHERE username = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, LogbookError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user. UNIQUE violations map to the matching duplicate error.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, LogbookError> {
        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email, password) VALUES (?, ?, ?)
               RETURNING id, username, email, password"#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_insert_error)?;
        debug!(user_id = user.id, "user stored");
        Ok(user)
    }

    pub async fn create_session(&self, session: &DbSession) -> Result<(), LogbookError> {
        sqlx::query(
            r#"INSERT INTO sessions (token, user_id, remember, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.remember)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Resolve a live (unexpired at `now`) session token to its user.
    pub async fn find_session_user(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Option<User>, LogbookError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT u.id, u.username, u.email, u.password
               FROM sessions s JOIN users u ON u.id = s.user_id
               WHERE s.token = ? AND s.expires_at > ?"#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Returns whether a row was removed.
    pub async fn delete_session(&self, token: &str) -> Result<bool, LogbookError> {
        let res = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn purge_expired_sessions(&self, now: i64) -> Result<u64, LogbookError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

fn map_user_insert_error(err: sqlx::Error) -> LogbookError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        let message = db_err.message();
        if message.contains("users.email") {
            return LogbookError::DuplicateEmail;
        }
        if message.contains("users.username") {
            return LogbookError::DuplicateUsername;
        }
    }
    LogbookError::DatabaseError(err)
}
