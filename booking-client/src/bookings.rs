//! Bookings and spaces API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::client::BookingClient;
use crate::error::Result;
use crate::session::SessionStore;

/// Booking owned by the authenticated user
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub spacename: String,
    pub bookingstart: DateTime<Utc>,
    pub bookingend: DateTime<Utc>,
    /// Owner id
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking owner as listed with the space bookings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookingOwner {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// Booking of a space, with the owner populated
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpaceBooking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub spacename: String,
    pub bookingstart: DateTime<Utc>,
    pub bookingend: DateTime<Utc>,
    pub user: BookingOwner,
}

/// Bookable space
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Space {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub spacename: String,
    #[serde(default)]
    pub description: String,
}

/// Booking to be created
///
/// Times are passed to the service as they are, it accepts RFC 3339 as well as `datetime-local`
/// formatted values.
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub spacename: String,
    pub bookingstart: String,
    pub bookingend: String,
}

/// Partial booking update, only the set fields are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookingstart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookingend: Option<String>,
}

/// Deleted booking id
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Deleted {
    pub id: Uuid,
}

impl<S: SessionStore> BookingClient<S> {
    /// Lists bookings of the authenticated user
    #[instrument(skip(self))]
    pub async fn bookings(&self) -> Result<Vec<Booking>> {
        self.send_json(self.get("/api/bookings")?).await
    }

    /// Books a space
    #[instrument(skip(self))]
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        self.send_json(self.post("/api/bookings")?.json(booking)).await
    }

    /// Updates own booking
    #[instrument(skip(self))]
    pub async fn update_booking(&self, id: Uuid, changes: &BookingChanges) -> Result<Booking> {
        self.send_json(self.put(&format!("/api/bookings/{id}"))?.json(changes)).await
    }

    /// Cancels own booking
    #[instrument(skip(self))]
    pub async fn delete_booking(&self, id: Uuid) -> Result<Deleted> {
        self.send_json(self.delete(&format!("/api/bookings/{id}"))?).await
    }

    /// Lists all the spaces
    #[instrument(skip(self))]
    pub async fn spaces(&self) -> Result<Vec<Space>> {
        self.send_json(self.get("/api/spaces")?).await
    }

    /// Fetches a single space
    #[instrument(skip(self))]
    pub async fn space(&self, id: Uuid) -> Result<Space> {
        self.send_json(self.get(&format!("/api/spacebookings/{id}"))?).await
    }

    /// Lists bookings of a space
    #[instrument(skip(self))]
    pub async fn space_bookings(&self, id: Uuid) -> Result<Vec<SpaceBooking>> {
        self.send_json(self.get(&format!("/api/bookings/{id}"))?).await
    }
}
