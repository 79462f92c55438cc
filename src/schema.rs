//! Database schema bootstrap.
//!
//! Tables are derived from the SeaORM entities so the same definitions work on
//! PostgreSQL and SQLite. Composite uniqueness is expressed with unique indexes,
//! which both backends accept with identical syntax.

use crate::orm::{
    auth_tokens, favourites, follows, ingredients, recipe_ingredients, recipe_tags, recipes,
    shopping_carts, tags, users,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema, Statement};

/// Composite unique constraints as (index name, table, columns).
const UNIQUE_INDEXES: &[(&str, &str, &str)] = &[
    ("unique_tag", "tags", "name, color, slug"),
    ("unique_ingredient", "ingredients", "name, measurement_unit"),
    (
        "unique_ingredient_in_recipe",
        "recipe_ingredients",
        "recipe_id, ingredient_id",
    ),
    ("unique_tag_in_recipe", "recipe_tags", "recipe_id, tag_id"),
    ("unique_follow", "follows", "user_id, following_id"),
    ("unique_favourite", "favourites", "user_id, recipe_id"),
    ("unique_shopping_cart", "shopping_carts", "user_id, recipe_id"),
];

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates every table and index that does not exist yet.
///
/// Parents are created before the tables that reference them.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, auth_tokens::Entity).await?;
    create_table(db, &schema, tags::Entity).await?;
    create_table(db, &schema, ingredients::Entity).await?;
    create_table(db, &schema, recipes::Entity).await?;
    create_table(db, &schema, recipe_ingredients::Entity).await?;
    create_table(db, &schema, recipe_tags::Entity).await?;
    create_table(db, &schema, follows::Entity).await?;
    create_table(db, &schema, favourites::Entity).await?;
    create_table(db, &schema, shopping_carts::Entity).await?;

    for (name, table, columns) in UNIQUE_INDEXES {
        db.execute(Statement::from_string(
            backend,
            format!("CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table} ({columns})"),
        ))
        .await?;
    }

    log::info!("Database schema is up to date");
    Ok(())
}
