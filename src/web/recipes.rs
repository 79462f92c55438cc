//! Recipe, favourite and shopping cart endpoints

use crate::error::ApiError;
use crate::middleware::ClientCtx;
use crate::pagination::{fetch_page, Page, PageParams};
use crate::recipes::{
    create_recipe, delete_recipe, get_recipe, update_recipe, RecipeFilter, RecipeShortView,
    RecipeView, RecipeWrite,
};
use crate::relations::{self, Favourite, ShoppingCart, Toggle};
use crate::shopping_list::{render, shopping_list, FILENAME};
use crate::storage::StorageBackend;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Fixed paths before `/recipes/{id}/`.
    conf.service(download_shopping_cart)
        .service(view_recipes)
        .service(post_recipe)
        .service(view_recipe)
        .service(patch_recipe)
        .service(destroy_recipe)
        .service(add_favorite)
        .service(remove_favorite)
        .service(add_to_shopping_cart)
        .service(remove_from_shopping_cart);
}

/// Recipe bodies are parsed after the permission checks.
fn parse_payload(body: &[u8]) -> Result<RecipeWrite, ApiError> {
    serde_json::from_slice(body).map_err(|err| super::json_error(&err))
}

#[get("/recipes/")]
async fn view_recipes(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let filter = RecipeFilter::from_query(req.query_string())?;
    let params = PageParams::from_request(&req)?;

    let select = filter.select(db.get_ref(), client.get_id()).await?;
    let (recipes, count) = fetch_page(db.get_ref(), select, &params).await?;

    let results = RecipeView::render_many(db.get_ref(), client.get_id(), recipes).await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, &params, count, results)))
}

#[post("/recipes/")]
async fn post_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let payload = parse_payload(&body)?;
    let recipe = create_recipe(db.get_ref(), storage.get_ref(), user_id, payload).await?;

    let view = RecipeView::render(db.get_ref(), Some(user_id), recipe).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Plain-text ingredient totals for everything in the requester's cart.
#[get("/recipes/download_shopping_cart/")]
async fn download_shopping_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let lines = shopping_list(db.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(FILENAME.to_owned())],
        })
        .body(render(&lines)))
}

#[get("/recipes/{id}/")]
async fn view_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let recipe = get_recipe(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = RecipeView::render(db.get_ref(), client.get_id(), recipe).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/recipes/{id}/")]
async fn patch_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let recipe = get_recipe(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    client.require_ownership(recipe.author_id)?;

    let payload = parse_payload(&body)?;
    let recipe = update_recipe(db.get_ref(), storage.get_ref(), recipe, payload).await?;
    let view = RecipeView::render(db.get_ref(), Some(user_id), recipe).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/recipes/{id}/")]
async fn destroy_recipe(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    let recipe = get_recipe(db.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;
    client.require_ownership(recipe.author_id)?;

    delete_recipe(db.get_ref(), recipe.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Adds the recipe to one of the requester's lists and returns its summary.
async fn add_recipe_to<T>(
    client: &ClientCtx,
    db: &DatabaseConnection,
    recipe_id: i32,
) -> Result<HttpResponse, ApiError>
where
    T: Toggle,
    <T::Entity as EntityTrait>::Model: IntoActiveModel<T::ActiveModel>,
{
    let user_id = client.require_login()?;
    let recipe = get_recipe(db, recipe_id).await?.ok_or(ApiError::NotFound)?;

    relations::add::<T>(db, user_id, recipe.id).await?;
    Ok(HttpResponse::Created().json(RecipeShortView::from(&recipe)))
}

async fn remove_recipe_from<T>(
    client: &ClientCtx,
    db: &DatabaseConnection,
    recipe_id: i32,
) -> Result<HttpResponse, ApiError>
where
    T: Toggle,
{
    let user_id = client.require_login()?;
    let recipe = get_recipe(db, recipe_id).await?.ok_or(ApiError::NotFound)?;

    relations::remove::<T>(db, user_id, recipe.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/recipes/{id}/favorite/")]
async fn add_favorite(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    add_recipe_to::<Favourite>(&client, db.get_ref(), path.into_inner()).await
}

#[delete("/recipes/{id}/favorite/")]
async fn remove_favorite(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    remove_recipe_from::<Favourite>(&client, db.get_ref(), path.into_inner()).await
}

#[post("/recipes/{id}/shopping_cart/")]
async fn add_to_shopping_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    add_recipe_to::<ShoppingCart>(&client, db.get_ref(), path.into_inner()).await
}

#[delete("/recipes/{id}/shopping_cart/")]
async fn remove_from_shopping_cart(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    remove_recipe_from::<ShoppingCart>(&client, db.get_ref(), path.into_inner()).await
}
