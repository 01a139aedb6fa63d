use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "booking-server", about = "Space bookings REST service")]
pub struct Opt {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: clio::Input,
}
