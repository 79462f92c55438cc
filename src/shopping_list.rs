//! Shopping list: ingredient totals across every recipe in a user's cart.

use crate::error::ApiError;
use crate::orm::{ingredients, recipe_ingredients, shopping_carts};
use sea_orm::{entity::*, query::*, sea_query::Query, ConnectionTrait, PaginatorTrait};
use std::collections::BTreeMap;

pub const EMPTY_CART: &str = "the shopping cart is empty";
pub const FILENAME: &str = "shopping_cart.txt";

/// One summed ingredient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Groups (name, unit, amount) rows by name and unit and sums the amounts.
/// Output is ordered by name, then unit.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingLine>
where
    I: IntoIterator<Item = (String, String, i64)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_insert(0) += amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingLine {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// `"{name} ({unit}) - {amount}\n"` per line.
pub fn render(lines: &[ShoppingLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} ({}) - {}\n", l.name, l.measurement_unit, l.amount))
        .collect()
}

/// Builds the shopping list for `user_id`, failing with Missing when the cart
/// is empty.
pub async fn shopping_list<C>(db: &C, user_id: i32) -> Result<Vec<ShoppingLine>, ApiError>
where
    C: ConnectionTrait,
{
    let carted = shopping_carts::Entity::find()
        .filter(shopping_carts::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if carted == 0 {
        return Err(ApiError::Missing(EMPTY_CART.to_owned()));
    }

    let rows = recipe_ingredients::Entity::find()
        .filter(
            recipe_ingredients::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_carts::Column::RecipeId)
                    .from(shopping_carts::Entity)
                    .and_where(shopping_carts::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .find_also_related(ingredients::Entity)
        .all(db)
        .await?;

    Ok(aggregate(rows.into_iter().filter_map(|(line, ingredient)| {
        ingredient.map(|i| (i.name, i.measurement_unit, i64::from(line.amount)))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> (String, String, i64) {
        (name.to_owned(), unit.to_owned(), amount)
    }

    #[test]
    fn test_sums_matching_ingredients() {
        let lines = aggregate(vec![row("Salt", "g", 10), row("Salt", "g", 5)]);
        assert_eq!(render(&lines), "Salt (g) - 15\n");
    }

    #[test]
    fn test_units_are_kept_apart() {
        let lines = aggregate(vec![
            row("Sugar", "g", 100),
            row("Sugar", "tbsp", 2),
            row("Flour", "g", 250),
            row("Sugar", "g", 50),
        ]);

        assert_eq!(
            render(&lines),
            "Flour (g) - 250\nSugar (g) - 150\nSugar (tbsp) - 2\n"
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
        assert_eq!(render(&[]), "");
    }
}
