//! HTTP client of the bookings service

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::session::{AuthenticatedUser, SESSION_KEY, SessionStore};

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client of the bookings service holding the session store
///
/// Requests are authorized with the token of the user found in the session store. When there is no
/// stored session, requests are sent anonymously and it is up to the service to reject them.
pub struct BookingClient<S> {
    /// Service URL, without the trailing slash
    base_url: String,
    /// HTTP client
    http: reqwest::Client,
    /// Authenticated user storage
    session: S,
}

impl<S: SessionStore> BookingClient<S> {
    /// Creates a client of the service hosted at `base_url`
    pub fn new(base_url: &str, session: S) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
            session,
        }
    }

    /// Accesses the session store
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Returns the currently authenticated user, if any
    pub fn current_user(&self) -> Result<Option<AuthenticatedUser>> {
        self.session
            .get(SESSION_KEY)?
            .map(|stored| serde_json::from_str(&stored))
            .transpose()
            .map_err(Into::into)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn get(&self, path: &str) -> Result<RequestBuilder> {
        self.authorize(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> Result<RequestBuilder> {
        self.authorize(self.http.post(self.url(path)))
    }

    /// POST request sent without the stored session token
    pub(crate) fn post_anonymous(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> Result<RequestBuilder> {
        self.authorize(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> Result<RequestBuilder> {
        self.authorize(self.http.delete(self.url(path)))
    }

    /// Attaches the stored session token
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.current_user()? {
            Some(user) => request.bearer_auth(user.token),
            None => request,
        })
    }

    /// Sends the request, returning the response if the service accepted it
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "Request completed");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|body| body.message)
            .unwrap_or(body);

        Err(ClientError::Api { status, message })
    }

    /// Sends the request returning the raw response body
    pub(crate) async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        Ok(self.send(request).await?.text().await?)
    }

    /// Sends the request returning the parsed response body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let body = self.send_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
