//! Service users storage

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use thiserror::Error;
use uuid::Uuid;

use crate::model::auth::{self, Session};

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid user id format")]
    InvalidUserId,
}

/// Newtype for user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|_| Error::InvalidUserId)?;
        Ok(Self(id))
    }
}

impl UserId {
    /// Fetches `User` with this id from database
    pub async fn fetch(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Option<User>> {
        User::fetch(db, self).await
    }

    /// Creates a session for this user
    pub async fn create_session(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Session> {
        Session::create(db, self).await
    }

    /// Checks if this user is the owner of the resource
    pub fn owns(self, resource: &impl Owned) -> bool {
        resource.owner() == self
    }
}

/// Resource owned by a single user
pub trait Owned {
    /// Id of the owning user
    fn owner(&self) -> UserId;
}

type UserRow = (UserId, String, String, bool, String, DateTime<Utc>);

/// Registered user
#[derive(Clone, PartialEq, Serialize, Derivative)]
#[derivative(Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    #[serde(skip)]
    #[derivative(Debug = "ignore")]
    password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from((id, name, email, is_admin, password_hash, created_at): UserRow) -> Self {
        Self {
            id,
            name,
            email,
            is_admin,
            password_hash,
            created_at,
        }
    }
}

impl User {
    /// Fetches user from the database
    pub async fn fetch(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user_id: UserId,
    ) -> Result<Option<Self>> {
        let row: Option<UserRow> = sqlx::query_as(
            "select id, name, email, is_admin, password_hash, created_at from users where id = ?",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Fetches user registered with given email
    pub async fn find_by_email(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        email: &str,
    ) -> Result<Option<Self>> {
        let row: Option<UserRow> = sqlx::query_as(
            "select id, name, email, is_admin, password_hash, created_at \
             from users where email = ?",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Checks if any administrator is registered
    pub async fn admin_exists(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("select count(*) from users where is_admin")
            .fetch_one(db)
            .await?;
        Ok(count > 0)
    }

    /// Verifies the password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        auth::verify_password(password, &self.password_hash)
    }
}

/// User to be registered
#[derive(Derivative)]
#[derivative(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[derivative(Debug = "ignore")]
    pub password: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Helper to create a regular user
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    /// Marks the user as an administrator
    pub fn admin(self) -> Self {
        Self {
            is_admin: true,
            ..self
        }
    }

    /// Creates user in the database
    pub async fn create(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<User> {
        let password_hash = auth::hash_password(&self.password)?;
        let user = User {
            id: UserId(Uuid::new_v4()),
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
            password_hash,
            created_at: Utc::now(),
        };

        sqlx::query(
            "insert into users(id, name, email, is_admin, password_hash, created_at) \
             values (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(db)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("model/migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn users_empty_initially() {
        let pool = setup_pool().await;

        let (count,): (i64,) = sqlx::query_as("select count(*) from users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(!User::admin_exists(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn creating_users() {
        let pool = setup_pool().await;

        let user1 = NewUser::new("user1", "user1@example.com", "pass1")
            .create(&pool)
            .await
            .unwrap();

        let fetched = user1.id.fetch(&pool).await.unwrap().unwrap();
        assert_eq!(fetched, user1);
        assert_eq!(fetched.name, "user1");
        assert!(!fetched.is_admin);
        assert!(fetched.verify_password("pass1"));
        assert!(!fetched.verify_password("pass2"));

        // Names *can* collide, emails can't
        let user2 = NewUser::new("user1", "other@example.com", "pass2")
            .create(&pool)
            .await
            .unwrap();
        assert_ne!(user1.id, user2.id);

        let err = NewUser::new("user3", "user1@example.com", "pass3")
            .create(&pool)
            .await
            .unwrap_err();
        let err = err.downcast_ref::<sqlx::Error>().unwrap();
        assert!(err.as_database_error().unwrap().is_unique_violation());

        let by_email = User::find_by_email(&pool, "other@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user2.id);

        let missing = User::find_by_email(&pool, "nobody@example.com")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn creating_admin() {
        let pool = setup_pool().await;

        let admin = NewUser::new("admin", "admin@example.com", "pass")
            .admin()
            .create(&pool)
            .await
            .unwrap();

        assert!(admin.is_admin);
        assert!(User::admin_exists(&pool).await.unwrap());
    }

    #[test]
    fn password_hash_is_never_exposed() {
        let user = User {
            id: UserId(Uuid::new_v4()),
            name: "user".to_owned(),
            email: "user@example.com".to_owned(),
            is_admin: false,
            password_hash: "$argon2id$secret".to_owned(),
            created_at: Utc::now(),
        };

        assert!(!format!("{user:?}").contains("argon2"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["name"], "user");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["_id"], user.id.to_string());
        assert!(json.get("passwordHash").is_none());
    }
}
