//! Tag endpoints

use crate::error::ApiError;
use crate::middleware::ClientCtx;
use crate::tags::{get_tag, list_tags};
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_tags).service(view_tag);
}

/// Every tag, unpaginated.
#[get("/tags/")]
async fn view_tags(
    _client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let tags = list_tags(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

#[get("/tags/{id}/")]
async fn view_tag(
    _client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let tag = get_tag(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(tag))
}
