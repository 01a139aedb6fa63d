//! Space bookings REST service

use actix_web::{App, HttpServer};
use clap::Parser;
use color_eyre::Result;
use std::io::read_to_string;
use tracing::{debug, info, warn};
use tracing_actix_web::TracingLogger;

use crate::config::{Config, LogFormat};
use crate::model::Model;
use crate::opt::Opt;

mod config;
pub mod model;
mod opt;
mod service;

/// Initializes tracing collection
fn setup_tracing(config: config::Logging) -> Result<()> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let filter_layer = config
        .filters
        .into_iter()
        .fold(filter_layer, |layer, filter| layer.add_directive(filter));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

/// Periodically purges expired sessions
fn spawn_session_cleanup(model: Model, config: config::Sessions) {
    let period = config.cleanup_interval();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match model.cleanup().await {
                Ok(purged) => debug!(purged, "Expired sessions purged"),
                Err(err) => warn!(?err, "Sessions cleanup failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let Opt {
        config: mut config_file,
    } = Opt::parse();

    let config = read_to_string(&mut config_file)?;
    let config: Config = toml::from_str(&config)?;

    setup_tracing(config.logging)?;
    color_eyre::install()?;

    info!(
        config = ?config_file.path().path(),
        "Tracing initialized, setting up a service"
    );

    let model = Model::with_config(config.db).await?;
    spawn_session_cleanup(model.clone(), config.sessions);

    let service_config = service::configure(model).await?;
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .configure(service_config.clone())
    })
    .bind(config.host)?
    .run()
    .await?;

    info!("Service stopped, tearing down");
    Ok(())
}
