//! Integration tests for favourites, the shopping cart and its download

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{call_service, read_body, read_body_json, TestRequest};
use common::{database::*, fixtures::*};
use serde_json::Value;

#[actix_rt::test]
async fn test_favorite_toggle_cycle() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (_media, storage) = setup_test_storage();

    let chef = create_test_user(&db, "chef").await.unwrap();
    let fan = create_test_user(&db, "fan").await.unwrap();
    let soup = create_test_recipe(&db, chef.id, "Soup", &[], &[]).await.unwrap();
    let uri = format!("/recipes/{}/favorite/", soup.id);

    let app = test_app!(db, storage);

    let req = TestRequest::post().uri(&uri).insert_header(fan.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["id"], soup.id);
    assert_eq!(body["name"], "Soup");
    assert_eq!(body["cooking_time"], 15);
    assert!(body.get("author").is_none());

    let req = TestRequest::post().uri(&uri).insert_header(fan.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["errors"], "the recipe has already been added to favorites");

    let req = TestRequest::get()
        .uri(&format!("/recipes/{}/", soup.id))
        .insert_header(fan.auth())
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["is_favorited"], true);

    let req = TestRequest::delete().uri(&uri).insert_header(fan.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::delete().uri(&uri).insert_header(fan.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["errors"], "the recipe is not in favorites");

    // Removing and adding again works.
    let req = TestRequest::post().uri(&uri).insert_header(fan.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn test_favorite_requires_login_and_existing_recipe() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (_media, storage) = setup_test_storage();
    let fan = create_test_user(&db, "fan").await.unwrap();

    let app = test_app!(db, storage);

    let req = TestRequest::post().uri("/recipes/1/favorite/").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/recipes/1/favorite/")
        .insert_header(fan.auth())
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_shopping_cart_toggle() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (_media, storage) = setup_test_storage();

    let chef = create_test_user(&db, "chef").await.unwrap();
    let soup = create_test_recipe(&db, chef.id, "Soup", &[], &[]).await.unwrap();
    let uri = format!("/recipes/{}/shopping_cart/", soup.id);

    let app = test_app!(db, storage);

    let req = TestRequest::post().uri(&uri).insert_header(chef.auth()).to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = TestRequest::post().uri(&uri).insert_header(chef.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["errors"], "the recipe has already been added to shopping cart");

    let req = TestRequest::get()
        .uri("/recipes/?is_in_shopping_cart=1")
        .insert_header(chef.auth())
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_in_shopping_cart"], true);

    let req = TestRequest::delete().uri(&uri).insert_header(chef.auth()).to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::delete().uri(&uri).insert_header(chef.auth()).to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["errors"], "the recipe is not in shopping cart");
}

#[actix_rt::test]
async fn test_download_shopping_cart_sums_amounts() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (_media, storage) = setup_test_storage();

    let chef = create_test_user(&db, "chef").await.unwrap();
    let salt = create_test_ingredient(&db, "Salt", "g").await.unwrap();
    let egg = create_test_ingredient(&db, "Egg", "pcs").await.unwrap();
    let soup = create_test_recipe(&db, chef.id, "Soup", &[(salt.id, 10)], &[])
        .await
        .unwrap();
    let omelette = create_test_recipe(&db, chef.id, "Omelette", &[(egg.id, 3), (salt.id, 5)], &[])
        .await
        .unwrap();
    add_test_cart_item(&db, chef.id, soup.id).await.unwrap();
    add_test_cart_item(&db, chef.id, omelette.id).await.unwrap();

    let app = test_app!(db, storage);

    let req = TestRequest::get()
        .uri("/recipes/download_shopping_cart/")
        .insert_header(chef.auth())
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .expect("attachment header")
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("shopping_cart.txt"));

    let body = read_body(resp).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Egg (pcs) - 3\nSalt (g) - 15\n"
    );
}

#[actix_rt::test]
async fn test_download_empty_shopping_cart() {
    let db = setup_test_database().await.expect("Failed to set up database");
    let (_media, storage) = setup_test_storage();
    let chef = create_test_user(&db, "chef").await.unwrap();

    let app = test_app!(db, storage);

    let req = TestRequest::get()
        .uri("/recipes/download_shopping_cart/")
        .insert_header(chef.auth())
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["errors"], "the shopping cart is empty");

    let req = TestRequest::get()
        .uri("/recipes/download_shopping_cart/")
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
