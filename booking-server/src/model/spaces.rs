//! Bookable spaces

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use uuid::Uuid;

/// Space ID newtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SpaceId(Uuid);

impl std::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Space which can be booked
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    #[serde(rename = "_id")]
    pub id: SpaceId,
    pub spacename: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Space {
    /// Fetches the space by it's id
    pub async fn fetch(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        id: SpaceId,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as(
            "select id, spacename, description, created_at from spaces where id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(row.map(|(id, spacename, description, created_at)| Self {
            id,
            spacename,
            description,
            created_at,
        }))
    }

    /// Checks if the space with given name already exists
    pub async fn exists(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        spacename: &str,
    ) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("select count(*) from spaces where spacename = ?")
            .bind(spacename)
            .fetch_one(db)
            .await?;
        Ok(count > 0)
    }

    /// Lists all the spaces in the order they were created
    pub async fn list(db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>) -> Result<Vec<Self>> {
        let rows: Vec<(SpaceId, String, String, DateTime<Utc>)> = sqlx::query_as(
            "select id, spacename, description, created_at from spaces order by rowid",
        )
        .fetch_all(db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, spacename, description, created_at)| Self {
                id,
                spacename,
                description,
                created_at,
            })
            .collect())
    }
}

/// Space to be created
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub spacename: String,
    pub description: String,
}

impl NewSpace {
    pub fn new(spacename: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            spacename: spacename.into(),
            description: description.into(),
        }
    }

    /// Creates the space in the database
    pub async fn create(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Space> {
        let space = Space {
            id: SpaceId(Uuid::new_v4()),
            spacename: self.spacename,
            description: self.description,
            created_at: Utc::now(),
        };

        sqlx::query(
            "insert into spaces(id, spacename, description, created_at) values (?, ?, ?, ?)",
        )
        .bind(space.id)
        .bind(&space.spacename)
        .bind(&space.description)
        .bind(space.created_at)
        .execute(db)
        .await?;

        Ok(space)
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
    async fn create_and_fetch_spaces() {
        let pool = setup_pool().await;

        let room_a = NewSpace::new("Room A", "Ground floor").create(&pool).await.unwrap();
        let room_b = NewSpace::new("Room B", "").create(&pool).await.unwrap();
        assert_ne!(room_a.id, room_b.id);

        let fetched = Space::fetch(&pool, room_a.id).await.unwrap().unwrap();
        assert_eq!(fetched.spacename, "Room A");
        assert_eq!(fetched.description, "Ground floor");

        assert!(Space::exists(&pool, "Room B").await.unwrap());
        assert!(!Space::exists(&pool, "Room C").await.unwrap());

        let names: Vec<_> = Space::list(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|space| space.spacename)
            .collect();
        assert_eq!(names, ["Room A", "Room B"]);
    }

    #[tokio::test]
    async fn space_names_are_unique() {
        let pool = setup_pool().await;

        NewSpace::new("Room A", "").create(&pool).await.unwrap();
        let err = NewSpace::new("Room A", "again")
            .create(&pool)
            .await
            .unwrap_err();
        let err = err.downcast_ref::<sqlx::Error>().unwrap();
        assert!(err.as_database_error().unwrap().is_unique_violation());
    }

    #[tokio::test]
    async fn arbitrary_space_is_not_fetched() {
        let pool = setup_pool().await;

        let space = Space::fetch(&pool, SpaceId(Uuid::new_v4())).await.unwrap();
        assert!(space.is_none());
    }
}
