//! Bookings model

use chrono::{DateTime, NaiveDateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use uuid::Uuid;

use crate::model::users::{Owned, UserId};

/// Booking ID newtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Naive formats accepted for booking times, all interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses booking time as sent by clients
///
/// Full RFC 3339 is accepted, as well as date times without seconds (`2024-01-01T10:00Z`) and
/// date times with no offset at all, as produced by `datetime-local` inputs. Times without an offset
/// are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|parsed| parsed.and_utc())
}

type BookingRow = (
    BookingId,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    UserId,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Reservation of a space for a time range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: BookingId,
    pub spacename: String,
    pub bookingstart: DateTime<Utc>,
    pub bookingend: DateTime<Utc>,
    /// Owning user
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(
        (id, spacename, bookingstart, bookingend, user, created_at, updated_at): BookingRow,
    ) -> Self {
        Self {
            id,
            spacename,
            bookingstart,
            bookingend,
            user,
            created_at,
            updated_at,
        }
    }
}

impl Owned for Booking {
    fn owner(&self) -> UserId {
        self.user
    }
}

impl Booking {
    /// Fetches the booking by it's id
    pub async fn fetch(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        id: BookingId,
    ) -> Result<Option<Self>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "select id, spacename, bookingstart, bookingend, user_id, created_at, updated_at \
             from bookings where id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Lists bookings owned by the user, in the order they were stored
    pub async fn list_for_user(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user: UserId,
    ) -> Result<Vec<Self>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "select id, spacename, bookingstart, bookingend, user_id, created_at, updated_at \
             from bookings where user_id = ? order by rowid",
        )
        .bind(user)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lists bookings of a space together with their owners
    pub async fn list_for_space(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        spacename: &str,
    ) -> Result<Vec<SpaceBooking>> {
        let rows: Vec<(
            BookingId,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
            UserId,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
        )> = sqlx::query_as(
            "select b.id, b.spacename, b.bookingstart, b.bookingend, u.id, u.name, b.created_at, b.updated_at \
             from bookings b join users u on u.id = b.user_id \
             where b.spacename = ? order by b.rowid",
        )
        .bind(spacename)
        .fetch_all(db)
        .await?;

        let bookings = rows
            .into_iter()
            .map(
                |(id, spacename, bookingstart, bookingend, user_id, name, created_at, updated_at)| {
                    SpaceBooking {
                        id,
                        spacename,
                        bookingstart,
                        bookingend,
                        user: BookingOwner { id: user_id, name },
                        created_at,
                        updated_at,
                    }
                },
            )
            .collect();

        Ok(bookings)
    }

    /// Applies partial update in a single statement, returning the updated booking
    ///
    /// Returns `None` if the booking doesn't exist (anymore).
    pub async fn update(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        id: BookingId,
        update: BookingUpdate,
    ) -> Result<Option<Self>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "update bookings set \
                spacename = coalesce(?, spacename), \
                bookingstart = coalesce(?, bookingstart), \
                bookingend = coalesce(?, bookingend), \
                user_id = coalesce(?, user_id), \
                updated_at = ? \
             where id = ? \
             returning id, spacename, bookingstart, bookingend, user_id, created_at, updated_at",
        )
        .bind(update.spacename)
        .bind(update.bookingstart)
        .bind(update.bookingend)
        .bind(update.user)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Deletes the booking by it's id. Returns if anything was deleted.
    pub async fn delete(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        id: BookingId,
    ) -> Result<bool> {
        let deleted = sqlx::query("delete from bookings where id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(deleted.rows_affected() == 1)
    }
}

/// Booking to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub spacename: String,
    pub bookingstart: DateTime<Utc>,
    pub bookingend: DateTime<Utc>,
    pub user: UserId,
}

impl NewBooking {
    /// Stores the booking
    pub async fn create(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Booking> {
        let now = Utc::now();
        let booking = Booking {
            id: BookingId(Uuid::new_v4()),
            spacename: self.spacename,
            bookingstart: self.bookingstart,
            bookingend: self.bookingend,
            user: self.user,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "insert into bookings(id, spacename, bookingstart, bookingend, user_id, created_at, updated_at) \
             values (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id)
        .bind(&booking.spacename)
        .bind(booking.bookingstart)
        .bind(booking.bookingend)
        .bind(booking.user)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(db)
        .await?;

        Ok(booking)
    }
}

/// Partial booking update, `None` fields are left untouched
///
/// The owner can be overwritten as well, the update is not restricted to descriptive fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingUpdate {
    pub spacename: Option<String>,
    pub bookingstart: Option<DateTime<Utc>>,
    pub bookingend: Option<DateTime<Utc>>,
    pub user: Option<UserId>,
}

/// Owner details shown along with space bookings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingOwner {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
}

/// Booking with its owner populated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceBooking {
    #[serde(rename = "_id")]
    pub id: BookingId,
    pub spacename: String,
    pub bookingstart: DateTime<Utc>,
    pub bookingend: DateTime<Utc>,
    pub user: BookingOwner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
