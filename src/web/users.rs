//! User, profile and subscription endpoints

use crate::error::ApiError;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::pagination::{fetch_page, Page, PageParams};
use crate::relations::{self, Subscription};
use crate::user::{get_user, register_user, subscriptions_of, CreatedUser, FollowView, NewUser, UserView};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Fixed paths before `/users/{id}/`.
    conf.service(view_me)
        .service(view_subscriptions)
        .service(view_users)
        .service(create_user)
        .service(view_user)
        .service(subscribe)
        .service(unsubscribe);
}

#[derive(Deserialize)]
struct RecipesLimitQuery {
    recipes_limit: Option<String>,
}

impl RecipesLimitQuery {
    fn limit(&self) -> Result<Option<usize>, ApiError> {
        match self.recipes_limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ApiError::field("recipes_limit", "A valid integer is required.")),
        }
    }
}

#[get("/users/")]
async fn view_users(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_request(&req)?;
    let select = users::Entity::find().order_by_asc(users::Column::Id);
    let (users, count) = fetch_page(db.get_ref(), select, &params).await?;

    let results = UserView::render_many(db.get_ref(), client.get_id(), users).await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, &params, count, results)))
}

/// Registration is open to anonymous clients.
#[post("/users/")]
async fn create_user(
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let user = register_user(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(CreatedUser::from(user)))
}

#[get("/users/me/")]
async fn view_me(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = client.get_user().cloned().ok_or(ApiError::NotAuthenticated)?;
    let view = UserView::render(db.get_ref(), Some(user.id), user).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Authors the requester follows, each with a recipe preview.
#[get("/users/subscriptions/")]
async fn view_subscriptions(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    query: web::Query<RecipesLimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let recipes_limit = query.limit()?;
    let params = PageParams::from_request(&req)?;

    let (authors, count) = fetch_page(db.get_ref(), subscriptions_of(user_id), &params).await?;
    let results = FollowView::render_many(db.get_ref(), authors, recipes_limit).await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, &params, count, results)))
}

#[get("/users/{id}/")]
async fn view_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = get_user(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    let view = UserView::render(db.get_ref(), client.get_id(), user).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/users/{id}/subscribe/")]
async fn subscribe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    query: web::Query<RecipesLimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let author = get_user(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    let recipes_limit = query.limit()?;

    relations::subscribe(db.get_ref(), user_id, author.id).await?;
    log::debug!("User {} subscribed to {}", user_id, author.id);

    let view = FollowView::render(db.get_ref(), author, recipes_limit).await?;
    Ok(HttpResponse::Created().json(view))
}

#[delete("/users/{id}/subscribe/")]
async fn unsubscribe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let author = get_user(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;

    relations::remove::<Subscription>(db.get_ref(), user_id, author.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
