//! Ingredients: reference data with a name prefix search.

use crate::orm::ingredients;
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr};
use serde::Deserialize;
use validator::Validate;

/// An ingredient row as loaded by the import tool.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewIngredient {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub measurement_unit: String,
}

/// Ingredients whose name starts with `prefix`, ignoring case, ordered by name.
///
/// Without a prefix every ingredient is returned.
pub async fn search_ingredients<C>(
    db: &C,
    prefix: Option<&str>,
) -> Result<Vec<ingredients::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let mut select = ingredients::Entity::find()
        .order_by_asc(ingredients::Column::Name)
        .order_by_asc(ingredients::Column::Id);

    let needle = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p.to_lowercase(),
        None => return select.all(db).await,
    };

    // SQLite only folds ASCII case and LIKE has no escaping here, so anything
    // else is narrowed in memory below.
    if needle.is_ascii() && !needle.contains(['%', '_', '\\']) {
        select = select.filter(Expr::cust_with_values(
            "LOWER(name) LIKE ?",
            vec![format!("{}%", needle)],
        ));
    }

    let rows = select.all(db).await?;
    Ok(rows
        .into_iter()
        .filter(|i| name_has_prefix(&i.name, &needle))
        .collect())
}

/// `needle` must already be lowercase.
fn name_has_prefix(name: &str, needle: &str) -> bool {
    name.to_lowercase().starts_with(needle)
}

pub async fn get_ingredient<C>(db: &C, id: i32) -> Result<Option<ingredients::Model>, DbErr>
where
    C: ConnectionTrait,
{
    ingredients::Entity::find_by_id(id).one(db).await
}

/// Inserts ingredients, skipping (name, unit) pairs already present in the
/// table or earlier in `rows`. Returns how many were inserted.
pub async fn insert_ingredients<C>(db: &C, rows: &[NewIngredient]) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    let mut known: std::collections::HashSet<(String, String)> = ingredients::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.name, i.measurement_unit))
        .collect();

    let fresh: Vec<ingredients::ActiveModel> = rows
        .iter()
        .filter(|row| known.insert((row.name.to_owned(), row.measurement_unit.to_owned())))
        .map(|row| ingredients::ActiveModel {
            name: Set(row.name.to_owned()),
            measurement_unit: Set(row.measurement_unit.to_owned()),
            ..Default::default()
        })
        .collect();

    let inserted = fresh.len();
    // SQLite caps bound parameters per statement.
    for chunk in fresh.chunks(500) {
        ingredients::Entity::insert_many(chunk.to_vec())
            .exec(db)
            .await?;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_case_insensitive() {
        assert!(name_has_prefix("Salt", "sa"));
        assert!(name_has_prefix("Sausage", "sa"));
        assert!(!name_has_prefix("Pasta", "sa"));
        assert!(name_has_prefix("Соль", "со"));
    }

    #[test]
    fn test_new_ingredient_requires_unit() {
        let row = NewIngredient {
            name: "Salt".to_owned(),
            measurement_unit: String::new(),
        };
        assert!(row.validate().is_err());
    }
}
