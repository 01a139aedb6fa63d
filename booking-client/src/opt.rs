use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Opt {
    /// Bookings service URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// File keeping the authenticated user between runs
    #[arg(long, default_value = ".booking-session.json")]
    pub session_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Registers a new user and logs in
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Registers an administrator, keeping the current session
    RegisterAdmin {
        name: String,
        email: String,
        password: String,
    },
    /// Logs in
    Login { email: String, password: String },
    /// Forgets the stored session
    Logout,
    /// Shows the authenticated user
    Whoami,
    /// Lists own bookings
    Bookings,
    /// Books a space
    Book {
        spacename: String,
        /// Booking start, RFC 3339 or `YYYY-MM-DDTHH:MM`
        start: String,
        /// Booking end, RFC 3339 or `YYYY-MM-DDTHH:MM`
        end: String,
    },
    /// Updates own booking
    Update {
        id: Uuid,
        #[arg(long)]
        spacename: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Cancels own booking
    Cancel { id: Uuid },
    /// Lists all the spaces
    Spaces,
    /// Shows the space with its upcoming bookings
    Space { id: Uuid },
}
