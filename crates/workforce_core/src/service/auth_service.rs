//! Token authentication use-cases.
//!
//! # Responsibility
//! - Register users with bcrypt password hashes.
//! - Issue, verify and revoke opaque bearer tokens.
//!
//! # Invariants
//! - Passwords are only ever stored hashed.
//! - A user holds at most one token; repeated logins return the same key.
//! - Log lines carry user ids, never usernames, passwords or token keys.

use super::ErrorKind;
use crate::model::user::{User, UserId};
use crate::model::{require_text, ValidationError};
use crate::repo::user_repo::{NewUser, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USERNAME_MAX_CHARS: usize = 150;
const EMAIL_MAX_CHARS: usize = 254;
const PASSWORD_MIN_CHARS: usize = 8;
const TOKEN_SCHEME: &str = "Token";

/// Password hashing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    Validation(ValidationError),
    /// Username is already registered.
    Conflict(String),
    /// Unknown username or wrong password.
    InvalidCredentials,
    InactiveUser(UserId),
    /// Header absent, malformed, or naming an unknown token.
    InvalidToken,
    Hash(bcrypt::BcryptError),
    Repo(RepoError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ClientInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidCredentials | Self::InactiveUser(_) | Self::InvalidToken => {
                ErrorKind::Unauthorized
            }
            Self::Hash(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::InactiveUser(_) => write!(f, "user account is disabled"),
            Self::InvalidToken => write!(f, "invalid or missing token"),
            Self::Hash(err) => write!(f, "password hashing failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Hash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Hash(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Successful login payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

pub struct AuthService<R: UserRepository> {
    repo: R,
    config: AuthConfig,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    /// Creates an active, non-staff user. Does not log the user in.
    pub fn register(&self, request: &RegisterRequest) -> AuthResult<User> {
        require_text("username", &request.username, USERNAME_MAX_CHARS)?;
        require_text("email", &request.email, EMAIL_MAX_CHARS)?;
        if request.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {PASSWORD_MIN_CHARS} characters"),
            )
            .into());
        }
        if request.password != request.password_confirm {
            return Err(ValidationError::new("password_confirm", "passwords do not match").into());
        }

        let password_hash = bcrypt::hash(&request.password, self.config.bcrypt_cost)?;
        let user_id = self.repo.create_user(&NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash,
        })?;
        info!("event=auth_register module=auth status=ok user_id={user_id}");

        self.repo
            .get_user(user_id)?
            .ok_or(AuthError::Repo(RepoError::NotFound {
                entity: "user",
                id: user_id,
            }))
    }

    pub fn login(&self, username: &str, password: &str) -> AuthResult<LoginResponse> {
        let Some(user) = self.repo.find_by_username(username)? else {
            warn!("event=auth_login module=auth status=denied reason=unknown_user");
            return Err(AuthError::InvalidCredentials);
        };
        if !bcrypt::verify(password, &user.password_hash)? {
            warn!(
                "event=auth_login module=auth status=denied reason=bad_password user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            warn!(
                "event=auth_login module=auth status=denied reason=inactive user_id={}",
                user.id
            );
            return Err(AuthError::InactiveUser(user.id));
        }

        let token = self.repo.get_or_create_token(user.id)?;
        info!("event=auth_login module=auth status=ok user_id={}", user.id);
        Ok(LoginResponse {
            token: token.key,
            user_id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
        })
    }

    /// Revokes the token named by an `Authorization` header value.
    pub fn logout(&self, authorization: &str) -> AuthResult<()> {
        let key = parse_authorization(authorization)?;
        if !self.repo.delete_token(key)? {
            return Err(AuthError::InvalidToken);
        }
        info!("event=auth_logout module=auth status=ok");
        Ok(())
    }

    /// Resolves an `Authorization: Token <key>` header value to its user.
    pub fn verify(&self, authorization: &str) -> AuthResult<User> {
        let key = parse_authorization(authorization)?;
        let token = self.repo.find_token(key)?.ok_or(AuthError::InvalidToken)?;
        let user = self
            .repo
            .get_user(token.user_id)?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::InactiveUser(user.id));
        }
        Ok(user)
    }
}

fn parse_authorization(header: &str) -> AuthResult<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(key), None) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => Ok(key),
        _ => Err(AuthError::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_authorization;

    #[test]
    fn authorization_header_requires_token_scheme() {
        assert_eq!(parse_authorization("Token abc123").unwrap(), "abc123");
        assert_eq!(parse_authorization("  token   abc123 ").unwrap(), "abc123");
        assert!(parse_authorization("Bearer abc123").is_err());
        assert!(parse_authorization("Token").is_err());
        assert!(parse_authorization("Token a b").is_err());
        assert!(parse_authorization("").is_err());
    }
}
