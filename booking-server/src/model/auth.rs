//! Authentication data: password hashes and session tokens

use std::time::Duration;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use color_eyre::Result;
use color_eyre::eyre::{OptionExt, eyre};
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::footer::Footer;
use pasetors::keys::{AsymmetricKeyPair, AsymmetricPublicKey, Generate};
use pasetors::paserk::{self, FormatAsPaserk};
use pasetors::token::UntrustedToken;
use pasetors::version4::V4;
use pasetors::{Public, public};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::users::UserId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Token doesn't exist")]
    NonExistingToken,
    #[error("Missing user id on a token")]
    MissingUserId,
    #[error("Missing token id on a token")]
    MissingTokenId,
    #[error("Missing session data")]
    MissingClaims,
    #[error("Invalid session claim {0}")]
    InvalidSessionClaim(&'static str),
    #[error("Invalid authorization format")]
    InvalidAuthorization,
    #[error("Invalid authorization scheme")]
    InvalidAuthorizationScheme,
}

/// PASETO implicit assertion for session tokens
const SESSION_APP_SECRET: &[u8] = b"BookingServiceSessionTokenSecret";

/// How long a freshly issued session stays valid
const SESSION_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Hashes a plain text password into PHC string format
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| eyre!("Password hashing failed: {err}"))?;

    Ok(hash.to_string())
}

/// Checks a plain text password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// Session data atached to Paseto session token
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    /// User authorized by this token
    pub user_id: UserId,
}

impl SessionData {
    //// Appends data to the session claims
    fn append(&self, mut claims: Claims) -> Result<Claims> {
        claims.issuer(&self.user_id.to_string())?;
        Ok(claims)
    }

    /// Builds session data from token claims
    fn from_claims(claims: &Claims) -> Result<Self> {
        let user_id = claims.get_claim("iss").ok_or_eyre(Error::MissingUserId)?;

        Ok(SessionData {
            user_id: user_id.as_str().ok_or_eyre(Error::MissingUserId)?.parse()?,
        })
    }
}

/// Newtype for session token string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionToken {
    /// Extracts the token from the `Authorization: Bearer [token]` header value
    pub fn from_authorization(header: &str) -> Result<Self, Error> {
        let (scheme, token) = header
            .split_once(' ')
            .ok_or(Error::InvalidAuthorization)?;

        match scheme {
            "Bearer" if !token.trim().is_empty() => Ok(Self(token.trim().to_owned())),
            "Bearer" => Err(Error::InvalidAuthorization),
            _ => Err(Error::InvalidAuthorizationScheme),
        }
    }

    /// Authenticates a token returning session
    pub async fn authenticate(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Session> {
        Session::authenticate(db, self).await
    }
}

/// Session data
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// User ID for this session
    pub user_id: UserId,
    /// Session token
    pub token: SessionToken,
    /// Session expiration time
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session for given user storing it in DB
    pub async fn create(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user_id: UserId,
    ) -> Result<Self> {
        let (session, kid, pk) = Self::new(user_id)?;

        sqlx::query("insert into session_tokens (id, public_key, expires_at) values (?, ?, ?)")
            .bind(kid)
            .bind(pk)
            .bind(session.expires_at)
            .execute(db)
            .await?;

        Ok(session)
    }

    /// Verifies a session token, returning the authenticated session on success
    ///
    /// The argument is the token extracted from the `Authorization` header
    pub async fn authenticate(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        session_token: SessionToken,
    ) -> Result<Self> {
        let token = UntrustedToken::<Public, V4>::try_from(&session_token.0)?;
        let mut footer = Footer::new();
        footer.parse_bytes(token.untrusted_footer())?;

        let key_id = footer
            .get_claim("kid")
            .ok_or_eyre(Error::MissingTokenId)?
            .as_str()
            .ok_or_eyre(Error::MissingTokenId)?;

        let (key,): (String,) = sqlx::query_as(
            "select public_key from session_tokens where id = ? and expires_at > ?",
        )
        .bind(key_id)
        .bind(Utc::now())
        .fetch_optional(db)
        .await?
        .ok_or_eyre(Error::NonExistingToken)?;

        let key = AsymmetricPublicKey::<V4>::try_from(key.as_str())?;

        let rules = ClaimsValidationRules::new();
        let token = public::verify(&key, &token, &rules, None, Some(SESSION_APP_SECRET))?;

        let claims = token.payload_claims().ok_or_eyre(Error::MissingClaims)?;
        let session = SessionData::from_claims(claims)?;

        Ok(Self {
            user_id: session.user_id,
            token: session_token,
            expires_at: expires_at(claims)?,
        })
    }

    /// Cleans expired sessions from database, returning the number of purged sessions.
    pub async fn cleanup(db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>) -> Result<u64> {
        let now = Utc::now();
        let deleted = sqlx::query("delete from session_tokens where expires_at < ?")
            .bind(now)
            .execute(db)
            .await?;
        Ok(deleted.rows_affected())
    }

    /// Creates new session for an user.
    ///
    /// The session data are not stored in the database. The `(session, key_id, public_key)` tuple is returned instead
    /// for the purpose of storing the session.
    fn new(user_id: UserId) -> Result<(Self, String, String)> {
        let key_pair = AsymmetricKeyPair::<V4>::generate()?;
        let key_id = paserk::Id::from(&key_pair.public);

        let session = SessionData { user_id };

        let claims = Claims::new_expires_in(&SESSION_VALIDITY)?;
        let claims = session.append(claims)?;
        let expires_at = expires_at(&claims)?;

        // Key id collisions are ignored, a fresh key pair per session makes them practically impossible
        let mut kid = String::new();
        key_id.fmt(&mut kid)?;

        let mut pk = String::new();
        key_pair.public.fmt(&mut pk)?;

        let mut footer = Footer::new();
        footer.key_id(&key_id);

        let token = public::sign(
            &key_pair.secret,
            &claims,
            Some(&footer),
            Some(SESSION_APP_SECRET),
        )?;

        let session = Self {
            user_id,
            token: SessionToken(token),
            expires_at,
        };

        Ok((session, kid, pk))
    }
}

/// Retrieves `expires_at` from the session claims.
fn expires_at(claims: &Claims) -> Result<DateTime<Utc>> {
    let expires_at = claims
        .get_claim("exp")
        .and_then(|exp| exp.as_str())
        .ok_or(Error::InvalidSessionClaim("exp"))?;
    expires_at.parse().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::users::NewUser;
    use sqlx::SqlitePool;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("model/migrations").run(&pool).await.unwrap();
        pool
    }

    async fn user(pool: &SqlitePool, name: &str) -> UserId {
        NewUser::new(name, format!("{name}@example.com"), "secret")
            .create(pool)
            .await
            .unwrap()
            .id
    }

    mod password {
        use super::*;

        #[test]
        fn hashed_password_verifies() {
            let hash = hash_password("hunter2").unwrap();
            assert_ne!(hash, "hunter2");
            assert!(verify_password("hunter2", &hash));
            assert!(!verify_password("hunter3", &hash));
        }

        #[test]
        fn same_password_hashes_differently() {
            let hash1 = hash_password("hunter2").unwrap();
            let hash2 = hash_password("hunter2").unwrap();
            assert_ne!(hash1, hash2);
        }

        #[test]
        fn garbage_hash_never_verifies() {
            assert!(!verify_password("hunter2", "not a phc string"));
        }
    }

    mod authorization_header {
        use super::*;

        #[test]
        fn bearer_token_is_extracted() {
            let token = SessionToken::from_authorization("Bearer abc.def").unwrap();
            assert_eq!(token.to_string(), "abc.def");
        }

        #[test]
        fn other_schemes_are_rejected() {
            let err = SessionToken::from_authorization("Basic abc").unwrap_err();
            assert!(matches!(err, Error::InvalidAuthorizationScheme));

            let err = SessionToken::from_authorization("Bearer").unwrap_err();
            assert!(matches!(err, Error::InvalidAuthorization));

            let err = SessionToken::from_authorization("Bearer  ").unwrap_err();
            assert!(matches!(err, Error::InvalidAuthorization));
        }
    }

    mod session_token {
        use super::*;

        #[tokio::test]
        async fn verify_with_generated_token() {
            let pool = setup_pool().await;

            let user1 = user(&pool, "user1").await;
            let token1 = user1.create_session(&pool).await.unwrap().token;

            let session = token1.clone().authenticate(&pool).await.unwrap();
            assert_eq!(user1, session.user_id);

            let user2 = user(&pool, "user2").await;
            let token2 = user2.create_session(&pool).await.unwrap().token;

            // Also multiple tokens for single user;
            let token3 = user2.create_session(&pool).await.unwrap().token;

            let session = token1.authenticate(&pool).await.unwrap();
            assert_eq!(user1, session.user_id);

            let session = token2.authenticate(&pool).await.unwrap();
            assert_eq!(user2, session.user_id);

            let session = token3.authenticate(&pool).await.unwrap();
            assert_eq!(user2, session.user_id);
        }

        #[tokio::test]
        async fn verify_with_random_data_fails() {
            let pool = setup_pool().await;
            let _ = SessionToken("fake_token".into())
                .authenticate(&pool)
                .await
                .unwrap_err();
        }

        #[tokio::test]
        async fn expired_sessions_are_cleaned_up() {
            let pool = setup_pool().await;

            let user_id = user(&pool, "user1").await;
            let session = user_id.create_session(&pool).await.unwrap();

            assert_eq!(Session::cleanup(&pool).await.unwrap(), 0);

            sqlx::query("update session_tokens set expires_at = ?")
                .bind(Utc::now() - chrono::Duration::hours(1))
                .execute(&pool)
                .await
                .unwrap();

            // Expired token is rejected even before the cleanup runs
            let _ = session.token.clone().authenticate(&pool).await.unwrap_err();

            assert_eq!(Session::cleanup(&pool).await.unwrap(), 1);
            let _ = session.token.authenticate(&pool).await.unwrap_err();
        }
    }
}
