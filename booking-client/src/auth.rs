//! Registration, login and logout

use derivative::Derivative;
use reqwest::RequestBuilder;
use serde::Serialize;
use tracing::{info, instrument};

use crate::client::BookingClient;
use crate::error::Result;
use crate::session::{AuthenticatedUser, SESSION_KEY, SessionStore};

const USERS_PATH: &str = "/api/users/";

/// Data of the user to be registered
#[derive(Clone, Serialize, Derivative)]
#[derivative(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    #[derivative(Debug = "ignore")]
    pub password: String,
}

/// Login credentials
#[derive(Clone, Serialize, Derivative)]
#[derivative(Debug)]
pub struct Credentials {
    pub email: String,
    #[derivative(Debug = "ignore")]
    pub password: String,
}

impl<S: SessionStore> BookingClient<S> {
    /// Posts the body, returning both the raw and the parsed response
    async fn authenticate(
        &self,
        request: RequestBuilder,
        body: &impl Serialize,
    ) -> Result<(String, AuthenticatedUser)> {
        let raw = self.send_text(request.json(body)).await?;
        let user = serde_json::from_str(&raw)?;
        Ok((raw, user))
    }

    /// Registers a user and stores it as the current session
    ///
    /// Sent anonymously, a stale stored session never blocks the registration.
    #[instrument(skip(self))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthenticatedUser> {
        let request = self.post_anonymous(USERS_PATH);
        let (raw, user) = self.authenticate(request, registration).await?;
        self.session().set(SESSION_KEY, &raw)?;
        info!(user = %user.id, "Registered");
        Ok(user)
    }

    /// Registers an administrator
    ///
    /// The current session is left untouched, the registered administrator is not logged in.
    #[instrument(skip(self))]
    pub async fn register_admin(&self, registration: &Registration) -> Result<AuthenticatedUser> {
        let request = self.post(&format!("{USERS_PATH}admin"))?;
        let (_, user) = self.authenticate(request, registration).await?;
        info!(user = %user.id, "Administrator registered");
        Ok(user)
    }

    /// Logs the user in and stores it as the current session, replacing the previous one
    #[instrument(skip(self))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthenticatedUser> {
        let request = self.post_anonymous(&format!("{USERS_PATH}login"));
        let (raw, user) = self.authenticate(request, credentials).await?;
        self.session().set(SESSION_KEY, &raw)?;
        info!(user = %user.id, "Logged in");
        Ok(user)
    }

    /// Forgets the current session, the service is not contacted
    pub fn logout(&self) -> Result<()> {
        self.session().remove(SESSION_KEY)
    }
}
