//! API user and token persistence.
//!
//! # Invariants
//! - Usernames are unique; duplicates surface as `RepoError::Conflict`.
//! - A user owns at most one token (`auth_tokens.user_id` is unique).

use super::{classify_write_error, RepoResult};
use crate::model::user::{AuthToken, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    is_active,
    is_staff,
    created_at
FROM users";

/// Insert payload; the password is already hashed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Returns the user's existing token or issues a new one.
    fn get_or_create_token(&self, user_id: UserId) -> RepoResult<AuthToken>;
    fn find_token(&self, key: &str) -> RepoResult<Option<AuthToken>>;
    /// Returns whether a token row was removed.
    fn delete_token(&self, key: &str) -> RepoResult<bool>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn token_for_user(&self, user_id: UserId) -> RepoResult<Option<AuthToken>> {
        Ok(self
            .conn
            .query_row(
                "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?1;",
                [user_id],
                parse_token_row,
            )
            .optional()?)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3);",
                params![user.username.trim(), user.email.trim(), user.password_hash],
            )
            .map_err(|err| {
                classify_write_error(
                    err,
                    || format!("username `{}` is already taken", user.username.trim()),
                    "user",
                )
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
                [username.trim()],
                parse_user_row,
            )
            .optional()?)
    }

    fn get_or_create_token(&self, user_id: UserId) -> RepoResult<AuthToken> {
        if let Some(token) = self.token_for_user(user_id)? {
            return Ok(token);
        }

        let key = new_token_key();
        self.conn
            .execute(
                "INSERT INTO auth_tokens (key, user_id) VALUES (?1, ?2);",
                params![key, user_id],
            )
            .map_err(|err| classify_write_error(err, || "token already issued".to_string(), "user"))?;

        self.token_for_user(user_id)?.ok_or(super::RepoError::NotFound {
            entity: "token",
            id: user_id,
        })
    }

    fn find_token(&self, key: &str) -> RepoResult<Option<AuthToken>> {
        Ok(self
            .conn
            .query_row(
                "SELECT key, user_id, created_at FROM auth_tokens WHERE key = ?1;",
                [key],
                parse_token_row,
            )
            .optional()?)
    }

    fn delete_token(&self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM auth_tokens WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

/// 40 lowercase hex characters.
fn new_token_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.push_str(&Uuid::new_v4().simple().to_string()[..8]);
    key
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        is_active: row.get("is_active")?,
        is_staff: row.get("is_staff")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_token_row(row: &Row<'_>) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        key: row.get("key")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::new_token_key;

    #[test]
    fn token_keys_are_forty_hex_chars() {
        let key = new_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(key, new_token_key());
    }
}
