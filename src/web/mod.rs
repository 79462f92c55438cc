pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::error::ApiError;
use actix_web::web;
use std::fmt::Display;

/// Largest accepted request body, base64 images included.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    conf.app_data(json_config())
        .app_data(web::PayloadConfig::new(BODY_LIMIT));

    tags::configure(conf);
    ingredients::configure(conf);
    users::configure(conf);
    recipes::configure(conf);
}

/// Unparseable JSON bodies are reported like any other client error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(BODY_LIMIT)
        .error_handler(|err, _req| json_error(&err).into())
}

fn json_error(err: &dyn Display) -> ApiError {
    log::debug!("Rejected JSON body: {}", err);
    ApiError::BadRequest(format!("JSON parse error - {}", err))
}
