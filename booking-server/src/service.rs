//! REST services building

use actix_web::web::{self, Data, ServiceConfig};
use actix_web::middleware;

pub mod error;

mod bookings;
mod session;
mod spaces;
mod users;


use crate::model::Model;
use crate::service::error::ApiError;

/// Returns configuration function for the ActixWeb services
pub async fn configure(model: Model) -> color_eyre::Result<impl Fn(&mut ServiceConfig) + Clone> {
    let cfg = move |cfg: &mut ServiceConfig| {
        let api = web::scope("/api")
            .wrap(middleware::from_fn(session::middleware))
            .service(users::register)
            .service(users::register_admin)
            .service(users::login)
            .service(users::me)
            .service(bookings::list)
            .service(bookings::create)
            .service(bookings::update)
            .service(bookings::remove)
            .service(spaces::list)
            .service(spaces::create)
            .service(spaces::space)
            .service(spaces::bookings);

        // Extraction failures are rendered like any other API error
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into());
        let path_config = web::PathConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into());

        cfg.app_data(Data::new(model.clone()))
            .app_data(json_config)
            .app_data(path_config)
            .service(api);
    };

    Ok(cfg)
}
