//! SeaORM entities.

pub mod auth_tokens;
pub mod favourites;
pub mod follows;
pub mod ingredients;
pub mod recipe_ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod shopping_carts;
pub mod tags;
pub mod users;
