//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use foodgram::orm::{
    auth_tokens, favourites, follows, ingredients, recipe_ingredients, recipe_tags, recipes,
    shopping_carts, tags, users,
};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// 1x1 transparent PNG as a data URI.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    /// Value of the auth token issued to this user.
    pub token: String,
}

impl TestUser {
    /// `Authorization` header for requests made as this user.
    pub fn auth(&self) -> (&'static str, String) {
        ("Authorization", format!("Token {}", self.token))
    }
}

/// Create a user with an auth token.
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> Result<TestUser, DbErr> {
    let password = foodgram::user::hash_password("password123")
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let user = users::ActiveModel {
        email: Set(format!("{}@test.com", username)),
        username: Set(username.to_owned()),
        first_name: Set(format!("{} first", username)),
        last_name: Set(format!("{} last", username)),
        password: Set(password),
        role: Set(users::Role::User),
        date_joined: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let token = format!("token-{}", username);
    auth_tokens::ActiveModel {
        key: Set(token.to_owned()),
        user_id: Set(user.id),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;

    Ok(TestUser {
        id: user.id,
        username: user.username,
        token,
    })
}

pub async fn create_test_tag(
    db: &DatabaseConnection,
    name: &str,
    color: &str,
    slug: &str,
) -> Result<tags::Model, DbErr> {
    tags::ActiveModel {
        name: Set(name.to_owned()),
        color: Set(color.to_owned()),
        slug: Set(slug.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    unit: &str,
) -> Result<ingredients::Model, DbErr> {
    ingredients::ActiveModel {
        name: Set(name.to_owned()),
        measurement_unit: Set(unit.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a recipe with (ingredient id, amount) lines and tag ids.
pub async fn create_test_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    lines: &[(i32, i32)],
    tag_ids: &[i32],
) -> Result<recipes::Model, DbErr> {
    let recipe = recipes::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_owned()),
        image: Set(format!("recipes/images/{}.png", name.to_lowercase().replace(' ', "_"))),
        text: Set(format!("How to make {}", name)),
        cooking_time: Set(15),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (ingredient_id, amount) in lines {
        recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for tag_id in tag_ids {
        recipe_tags::ActiveModel {
            recipe_id: Set(recipe.id),
            tag_id: Set(*tag_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(recipe)
}

pub async fn add_test_favourite(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), DbErr> {
    favourites::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn add_test_cart_item(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), DbErr> {
    shopping_carts::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn add_test_follow(
    db: &DatabaseConnection,
    user_id: i32,
    following_id: i32,
) -> Result<(), DbErr> {
    follows::ActiveModel {
        user_id: Set(user_id),
        following_id: Set(following_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}
