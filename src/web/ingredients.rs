//! Ingredient endpoints

use crate::error::ApiError;
use crate::ingredients::{get_ingredient, search_ingredients};
use crate::middleware::ClientCtx;
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_ingredients).service(view_ingredient);
}

#[derive(Deserialize)]
struct SearchQuery {
    name: Option<String>,
}

/// Ingredients filtered by `?name=` prefix, unpaginated.
#[get("/ingredients/")]
async fn view_ingredients(
    _client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let found = search_ingredients(db.get_ref(), query.name.as_deref()).await?;
    Ok(HttpResponse::Ok().json(found))
}

#[get("/ingredients/{id}/")]
async fn view_ingredient(
    _client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = get_ingredient(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(ingredient))
}
