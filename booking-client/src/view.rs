//! Space bookings page

use std::fmt;

use chrono::SecondsFormat;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::bookings::{Space, SpaceBooking};
use crate::client::BookingClient;
use crate::session::SessionStore;

/// Space with its upcoming bookings
///
/// Parts which failed to load are left empty, failures are only logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceBookingsView {
    pub space: Option<Space>,
    pub bookings: Vec<SpaceBooking>,
}

impl SpaceBookingsView {
    /// Fetches the space and its bookings concurrently
    #[instrument(skip(client))]
    pub async fn load<S: SessionStore>(client: &BookingClient<S>, space_id: Uuid) -> Self {
        let (space, bookings) =
            tokio::join!(client.space(space_id), client.space_bookings(space_id));

        let mut view = Self::default();

        match space {
            Ok(space) => {
                debug!(?space, "Space fetched");
                view.space = Some(space);
            }
            Err(err) => error!(%err, "Fetching space failed"),
        }

        match bookings {
            Ok(bookings) => {
                debug!(count = bookings.len(), "Space bookings fetched");
                view.bookings = bookings;
            }
            Err(err) => error!(%err, "Fetching space bookings failed"),
        }

        view
    }
}

impl fmt::Display for SpaceBookingsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spacename = self
            .space
            .as_ref()
            .map(|space| space.spacename.as_str())
            .unwrap_or_default();
        writeln!(f, "Upcoming Bookings at {spacename}:")?;

        for booking in &self.bookings {
            writeln!(f)?;
            writeln!(f, "  User: {}", booking.user.name)?;
            writeln!(
                f,
                "  booking start: {}",
                booking.bookingstart.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            )?;
            writeln!(
                f,
                "  booking end: {}",
                booking.bookingend.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            )?;
        }

        writeln!(f)?;
        write!(f, "Create a Booking")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use warp::Filter;

    use crate::session::MemoryStore;
    use crate::testing::serve;

    const SPACE_ID: &str = "9a1b2c3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d";

    fn space_route() -> BoxedSpace {
        warp::path!("api" / "spacebookings" / String)
            .map(|id: String| {
                warp::reply::with_status(
                    warp::reply::json(&json!({ "_id": id, "spacename": "Room A" })),
                    warp::http::StatusCode::OK,
                )
            })
            .boxed()
    }

    type BoxedSpace =
        warp::filters::BoxedFilter<(warp::reply::WithStatus<warp::reply::Json>,)>;

    fn bookings_route(status: warp::http::StatusCode) -> BoxedSpace {
        warp::path!("api" / "bookings" / String)
            .map(move |_id: String| {
                let body = if status.is_success() {
                    json!([
                        {
                            "_id": "0c7e2f5a-8d5b-4e7a-b2a4-1f3c9e6d7a8b",
                            "spacename": "Room A",
                            "bookingstart": "2024-01-01T10:00:00Z",
                            "bookingend": "2024-01-01T11:00:00Z",
                            "user": {
                                "_id": "5f0c8d4e-3a3b-4a4c-9a7e-0d2a6f7b8c9d",
                                "name": "Alice",
                            },
                            "createdAt": "2024-01-01T09:00:00Z",
                            "updatedAt": "2024-01-01T09:00:00Z",
                        },
                        {
                            "_id": "1d8f3a6b-9e6c-4f8b-83b5-2a4dae7f8b9c",
                            "spacename": "Room A",
                            "bookingstart": "2024-01-02T08:30:00Z",
                            "bookingend": "2024-01-02T09:00:00Z",
                            "user": {
                                "_id": "6a1d9e5f-4b4c-4b5d-8b8f-1e3b7a8c9d0e",
                                "name": "Bob",
                            },
                            "createdAt": "2024-01-01T09:00:00Z",
                            "updatedAt": "2024-01-01T09:00:00Z",
                        },
                    ])
                } else {
                    json!({ "message": "Internal server error" })
                };
                warp::reply::with_status(warp::reply::json(&body), status)
            })
            .boxed()
    }

    #[tokio::test]
    async fn renders_space_with_bookings() {
        let url = serve(
            space_route()
                .or(bookings_route(warp::http::StatusCode::OK))
                .unify()
                .boxed(),
        )
        .await;
        let client = BookingClient::new(&url, MemoryStore::new());

        let view = SpaceBookingsView::load(&client, SPACE_ID.parse().unwrap()).await;
        assert_eq!(view.space.as_ref().unwrap().spacename, "Room A");
        assert_eq!(view.bookings.len(), 2);

        let expected = "\
Upcoming Bookings at Room A:

  User: Alice
  booking start: 2024-01-01T10:00:00Z
  booking end: 2024-01-01T11:00:00Z

  User: Bob
  booking start: 2024-01-02T08:30:00Z
  booking end: 2024-01-02T09:00:00Z

Create a Booking";
        assert_eq!(view.to_string(), expected);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_part_empty() {
        let url = serve(
            space_route()
                .or(bookings_route(
                    warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                ))
                .unify()
                .boxed(),
        )
        .await;
        let client = BookingClient::new(&url, MemoryStore::new());

        let view = SpaceBookingsView::load(&client, SPACE_ID.parse().unwrap()).await;
        assert_eq!(view.space.as_ref().unwrap().spacename, "Room A");
        assert!(view.bookings.is_empty());
        assert_eq!(
            view.to_string(),
            "Upcoming Bookings at Room A:\n\nCreate a Booking"
        );
    }

    #[tokio::test]
    async fn unreachable_service_renders_empty_page() {
        // Nothing listens on the discard port
        let client = BookingClient::new("http://127.0.0.1:9", MemoryStore::new());

        let view = SpaceBookingsView::load(&client, SPACE_ID.parse().unwrap()).await;
        assert_eq!(view, SpaceBookingsView::default());
        assert_eq!(view.to_string(), "Upcoming Bookings at :\n\nCreate a Booking");
    }
}
