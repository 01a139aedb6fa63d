//! Session management

use std::future::{Ready, ready};

use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use tracing::debug;

use crate::model::Model;
use crate::model::auth::{Session, SessionToken};
use crate::model::users::UserId;
use crate::service::error::ApiError;

/// Authenticates the request if it carries the `Authorization: Bearer [token]` header
///
/// Authenticated session is attached to the request extensions. Requests without the header pass
/// through anonymously, it is up to the endpoint to require the [`Requester`].
pub async fn middleware<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        let auth_header = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Not authorized"))?;

        let token = SessionToken::from_authorization(auth_header).map_err(|err| {
            debug!(%err, "Rejected authorization header");
            ApiError::unauthorized("Not authorized")
        })?;

        let model: Data<Model> = req
            .app_data()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authorized"))?;

        let session = token.authenticate(model.db()).await.map_err(|err| {
            debug!(%err, "Session authentication failed");
            ApiError::unauthorized("Not authorized")
        })?;

        debug!(user = %session.user_id, expires_at = %session.expires_at, "Request authenticated");
        req.extensions_mut().insert::<Session>(session);
    }

    next.call(req).await
}

/// Authenticated identity of the request sender
#[derive(Debug, Clone)]
pub struct Requester(pub Session);

impl Requester {
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }
}

impl FromRequest for Requester {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<Session>().cloned();
        ready(
            session
                .map(Requester)
                .ok_or_else(|| ApiError::unauthorized("Not authorized, no token")),
        )
    }
}
