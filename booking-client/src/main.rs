//! Command line client of the space bookings service

use booking_client::BookingClient;
use booking_client::auth::{Credentials, Registration};
use booking_client::bookings::{BookingChanges, NewBooking};
use booking_client::session::FileStore;
use booking_client::view::SpaceBookingsView;
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use serde::Serialize;
use tracing::debug;

use crate::opt::{Command, Opt};

mod opt;

/// Initializes tracing collection, logs go to stderr so they never mix with the output
fn setup_tracing() -> Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing()?;
    color_eyre::install()?;

    let opt = Opt::parse();
    debug!(server = %opt.server, session = ?opt.session_file, "Client configured");

    let client = BookingClient::new(&opt.server, FileStore::new(opt.session_file));

    match opt.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let user = client
                .register(&Registration {
                    name,
                    email,
                    password,
                })
                .await?;
            print_json(&user)?;
        }
        Command::RegisterAdmin {
            name,
            email,
            password,
        } => {
            let user = client
                .register_admin(&Registration {
                    name,
                    email,
                    password,
                })
                .await?;
            print_json(&user)?;
        }
        Command::Login { email, password } => {
            let user = client.login(&Credentials { email, password }).await?;
            print_json(&user)?;
        }
        Command::Logout => client.logout()?,
        Command::Whoami => {
            let user = client
                .current_user()?
                .ok_or_else(|| eyre!("Not logged in"))?;
            print_json(&user)?;
        }
        Command::Bookings => print_json(&client.bookings().await?)?,
        Command::Book {
            spacename,
            start,
            end,
        } => {
            let booking = client
                .create_booking(&NewBooking {
                    spacename,
                    bookingstart: start,
                    bookingend: end,
                })
                .await?;
            print_json(&booking)?;
        }
        Command::Update {
            id,
            spacename,
            start,
            end,
        } => {
            let changes = BookingChanges {
                spacename,
                bookingstart: start,
                bookingend: end,
            };
            print_json(&client.update_booking(id, &changes).await?)?;
        }
        Command::Cancel { id } => print_json(&client.delete_booking(id).await?)?,
        Command::Spaces => print_json(&client.spaces().await?)?,
        Command::Space { id } => {
            let view = SpaceBookingsView::load(&client, id).await;
            println!("{view}");
        }
    }

    Ok(())
}
