//! Client of the space bookings service

pub mod auth;
pub mod bookings;
pub mod client;
pub mod error;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use client::BookingClient;
pub use error::{ClientError, Result};
