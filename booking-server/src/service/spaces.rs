//! Spaces endpoints

use actix_web::web::{Data, Json, Path};
use actix_web::{HttpResponse, get, post};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::model::Model;
use crate::model::bookings::{Booking, SpaceBooking};
use crate::model::spaces::{NewSpace, Space, SpaceId};
use crate::service::error::ApiError;
use crate::service::session::Requester;
use crate::service::users::require_admin;

/// Space creation request body
#[derive(Debug, Deserialize)]
pub struct CreateSpace {
    spacename: Option<String>,
    #[serde(default)]
    description: String,
}

async fn fetch_space(model: &Model, id: SpaceId) -> Result<Space, ApiError> {
    Space::fetch(model.db(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Space not found"))
}

/// Lists all spaces
#[get("/spaces")]
#[instrument(skip(model))]
async fn list(model: Data<Model>) -> Result<Json<Vec<Space>>, ApiError> {
    Ok(Json(Space::list(model.db()).await?))
}

/// Creates a space, only administrators are allowed to
#[post("/spaces")]
#[instrument(skip(model))]
async fn create(
    model: Data<Model>,
    requester: Requester,
    body: Json<CreateSpace>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&model, &requester).await?;

    let CreateSpace {
        spacename,
        description,
    } = body.into_inner();
    let spacename = spacename
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please add a space name"))?;

    let db = model.db();
    if Space::exists(db, &spacename).await? {
        return Err(ApiError::bad_request("Space already exists"));
    }

    let created = NewSpace::new(spacename, description).create(db).await?;
    info!(space = %created.id, "Space created");

    Ok(HttpResponse::Created().json(created))
}

/// Fetches a single space
#[get("/spacebookings/{id}")]
#[instrument(skip(model))]
async fn space(model: Data<Model>, id: Path<SpaceId>) -> Result<Json<Space>, ApiError> {
    Ok(Json(fetch_space(&model, id.into_inner()).await?))
}

/// Lists bookings of a space with their owners
#[get("/bookings/{id}")]
#[instrument(skip(model))]
async fn bookings(
    model: Data<Model>,
    id: Path<SpaceId>,
) -> Result<Json<Vec<SpaceBooking>>, ApiError> {
    let found = fetch_space(&model, id.into_inner()).await?;
    let listed = Booking::list_for_space(model.db(), &found.spacename).await?;
    Ok(Json(listed))
}
