//! User registration and login endpoints

use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, get, post};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::model::Model;
use crate::model::auth::SessionToken;
use crate::model::users::{NewUser, User};
use crate::service::error::ApiError;
use crate::service::session::Requester;

/// Registration request body
#[derive(Derivative, Deserialize)]
#[derivative(Debug)]
pub struct Registration {
    name: Option<String>,
    email: Option<String>,
    #[derivative(Debug = "ignore")]
    password: Option<String>,
}

impl Registration {
    /// Validates that all fields are present
    fn into_new_user(self) -> Result<NewUser, ApiError> {
        let field = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        match (field(self.name), field(self.email), field(self.password)) {
            (Some(name), Some(email), Some(password)) => {
                Ok(NewUser::new(name.trim(), email.trim().to_lowercase(), password))
            }
            _ => Err(ApiError::bad_request("Please add all fields")),
        }
    }
}

/// Login request body
#[derive(Derivative, Deserialize)]
#[derivative(Debug)]
pub struct Credentials {
    email: Option<String>,
    #[derivative(Debug = "ignore")]
    password: Option<String>,
}

/// User returned with freshly issued session token
#[derive(Debug, Serialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    user: User,
    token: SessionToken,
}

/// Loads the requester making sure they are an administrator
pub(super) async fn require_admin(model: &Model, requester: &Requester) -> Result<User, ApiError> {
    let user = requester
        .user_id()
        .fetch(model.db())
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !user.is_admin {
        return Err(ApiError::unauthorized("Not authorized as an admin"));
    }

    Ok(user)
}

/// Creates the user and opens a session for them
async fn register_user(model: &Model, new_user: NewUser) -> Result<AuthenticatedUser, ApiError> {
    let db = model.db();
    if User::find_by_email(db, &new_user.email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let user = new_user.create(db).await?;
    let session = user.id.create_session(db).await?;

    Ok(AuthenticatedUser {
        user,
        token: session.token,
    })
}

/// Registers a regular user
#[post("/users/")]
#[instrument(skip(model))]
async fn register(
    model: Data<Model>,
    body: Json<Registration>,
) -> Result<HttpResponse, ApiError> {
    let new_user = body.into_inner().into_new_user()?;
    let registered = register_user(&model, new_user).await?;
    info!(user = %registered.user.id, "User registered");

    Ok(HttpResponse::Created().json(registered))
}

/// Registers an administrator
///
/// The very first administrator can be registered by anyone, any further one has to be registered
/// by an authenticated administrator.
#[post("/users/admin")]
#[instrument(skip(model))]
async fn register_admin(
    model: Data<Model>,
    requester: Option<Requester>,
    body: Json<Registration>,
) -> Result<HttpResponse, ApiError> {
    if User::admin_exists(model.db()).await? {
        let requester =
            requester.ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;
        require_admin(&model, &requester).await?;
    }

    let new_user = body.into_inner().into_new_user()?.admin();
    let registered = register_user(&model, new_user).await?;
    info!(user = %registered.user.id, "Administrator registered");

    Ok(HttpResponse::Created().json(registered))
}

/// Authenticates the user with email and password
#[post("/users/login")]
#[instrument(skip(model))]
async fn login(
    model: Data<Model>,
    body: Json<Credentials>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    let Credentials { email, password } = body.into_inner();
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request("Please add all fields"));
    };

    let db = model.db();
    let user = User::find_by_email(db, &email.trim().to_lowercase())
        .await?
        .filter(|user| user.verify_password(&password))
        .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    let session = user.id.create_session(db).await?;
    info!(user = %user.id, "User logged in");

    Ok(Json(AuthenticatedUser {
        user,
        token: session.token,
    }))
}

/// Returns the authenticated user
#[get("/users/me")]
#[instrument(skip(model))]
async fn me(model: Data<Model>, requester: Requester) -> Result<Json<User>, ApiError> {
    let user = requester
        .user_id()
        .fetch(model.db())
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(user))
}
