//! Bookings endpoints
//!
//! All the endpoints operate on bookings of the authenticated requester.

use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::model::Model;
use crate::model::bookings::{Booking, BookingId, BookingUpdate, NewBooking, parse_timestamp};
use crate::model::users::{Owned, UserId};
use crate::service::error::ApiError;
use crate::service::session::Requester;

/// Booking creation request body
#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    spacename: Option<String>,
    bookingstart: Option<String>,
    bookingend: Option<String>,
}

/// Takes a required field, empty strings are treated as missing
fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

fn timestamp(value: &str, message: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(value).ok_or_else(|| ApiError::bad_request(message))
}

impl CreateBooking {
    /// Validates the request building the booking owned by `user`
    ///
    /// Fields are checked in order, the first missing one is reported.
    fn validate(self, user: UserId) -> Result<NewBooking, ApiError> {
        let spacename = required(self.spacename, "Please add a space name")?;
        let bookingstart = required(self.bookingstart, "Please add a booking start time")?;
        let bookingend = required(self.bookingend, "Please add a booking end time")?;

        Ok(NewBooking {
            spacename,
            bookingstart: timestamp(&bookingstart, "Invalid booking start time")?,
            bookingend: timestamp(&bookingend, "Invalid booking end time")?,
            user,
        })
    }
}

/// Partial booking update request body
///
/// Fields are not restricted, the owner can be reassigned with the `user` field.
#[derive(Debug, Deserialize)]
pub struct UpdateBooking {
    spacename: Option<String>,
    bookingstart: Option<String>,
    bookingend: Option<String>,
    user: Option<UserId>,
}

impl TryFrom<UpdateBooking> for BookingUpdate {
    type Error = ApiError;

    fn try_from(body: UpdateBooking) -> Result<Self, Self::Error> {
        Ok(BookingUpdate {
            spacename: body.spacename,
            bookingstart: body
                .bookingstart
                .map(|value| timestamp(&value, "Invalid booking start time"))
                .transpose()?,
            bookingend: body
                .bookingend
                .map(|value| timestamp(&value, "Invalid booking end time"))
                .transpose()?,
            user: body.user,
        })
    }
}

/// Response to the booking deletion
#[derive(Debug, Serialize)]
pub struct Deleted {
    id: BookingId,
}

/// Loads the booking making sure it belongs to the requester
///
/// Fails with `400` if the booking doesn't exist, and with `401` if the requester no longer exists
/// or doesn't own the booking.
async fn owned_booking(
    model: &Model,
    id: BookingId,
    requester: &Requester,
) -> Result<Booking, ApiError> {
    let db = model.db();
    let booking = Booking::fetch(db, id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Booking not found"))?;

    let user = requester
        .user_id()
        .fetch(db)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    authorize(&booking, user.id)?;
    Ok(booking)
}

/// Asserts the user owns the resource
fn authorize(resource: &impl Owned, user: UserId) -> Result<(), ApiError> {
    if user.owns(resource) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("User not authorized"))
    }
}

/// Lists requester's bookings
#[get("/bookings")]
#[instrument(skip(model))]
async fn list(model: Data<Model>, requester: Requester) -> Result<Json<Vec<Booking>>, ApiError> {
    let bookings = Booking::list_for_user(model.db(), requester.user_id()).await?;
    Ok(Json(bookings))
}

/// Creates a booking owned by the requester
#[post("/bookings")]
#[instrument(skip(model))]
async fn create(
    model: Data<Model>,
    requester: Requester,
    body: Json<CreateBooking>,
) -> Result<Json<Booking>, ApiError> {
    let booking = body
        .into_inner()
        .validate(requester.user_id())?
        .create(model.db())
        .await?;

    info!(booking = %booking.id, "Booking created");
    Ok(Json(booking))
}

/// Updates requester's booking
#[put("/bookings/{id}")]
#[instrument(skip(model))]
async fn update(
    model: Data<Model>,
    requester: Requester,
    id: Path<BookingId>,
    body: Json<UpdateBooking>,
) -> Result<Json<Booking>, ApiError> {
    let booking = owned_booking(&model, id.into_inner(), &requester).await?;
    let changes = BookingUpdate::try_from(body.into_inner())?;

    // The new owner has to exist, otherwise the foreign key rejects the update
    if let Some(owner) = changes.user
        && owner.fetch(model.db()).await?.is_none()
    {
        return Err(ApiError::bad_request("User not found"));
    }

    let updated = Booking::update(model.db(), booking.id, changes)
        .await?
        .ok_or_else(|| ApiError::bad_request("Booking not found"))?;

    info!(booking = %updated.id, "Booking updated");
    Ok(Json(updated))
}

/// Deletes requester's booking
#[delete("/bookings/{id}")]
#[instrument(skip(model))]
async fn remove(
    model: Data<Model>,
    requester: Requester,
    id: Path<BookingId>,
) -> Result<Json<Deleted>, ApiError> {
    let booking = owned_booking(&model, id.into_inner(), &requester).await?;

    if !Booking::delete(model.db(), booking.id).await? {
        return Err(ApiError::bad_request("Booking not found"));
    }

    info!(booking = %booking.id, "Booking deleted");
    Ok(Json(Deleted { id: booking.id }))
}
