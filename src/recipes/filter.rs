//! Query-string filters for the recipe list.

use crate::error::{ApiError, FieldErrors};
use crate::orm::{favourites, recipe_tags, recipes, shopping_carts};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select};
use url::form_urlencoded;

const ENTER_NUMBER: &str = "Enter a number.";
const INVALID_AUTHOR: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Parsed `?is_favorited=&is_in_shopping_cart=&tags=&author=` parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeFilter {
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    /// Slugs, any of which must be present.
    pub tags: Vec<String>,
    pub author: Option<i32>,
}

/// Numeric flag: exactly 1 turns the restriction on, other numbers do nothing.
fn parse_flag(value: &str) -> Result<bool, ()> {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n == 1.0)
        .map_err(|_| ())
}

impl RecipeFilter {
    /// Empty values are ignored; malformed ones are reported per field.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "is_favorited" => match parse_flag(&value) {
                    Ok(on) => filter.is_favorited = on,
                    Err(()) => push(&mut errors, "is_favorited", ENTER_NUMBER),
                },
                "is_in_shopping_cart" => match parse_flag(&value) {
                    Ok(on) => filter.is_in_shopping_cart = on,
                    Err(()) => push(&mut errors, "is_in_shopping_cart", ENTER_NUMBER),
                },
                "tags" => {
                    if !filter.tags.iter().any(|t| *t == value) {
                        filter.tags.push(value.into_owned());
                    }
                }
                "author" => match value.trim().parse::<i32>() {
                    Ok(id) => filter.author = Some(id),
                    Err(_) => push(&mut errors, "author", INVALID_AUTHOR),
                },
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(ApiError::Validation(errors))
        }
    }

    /// Builds the filtered, ordered recipe select for `requester`.
    ///
    /// Unknown tag slugs are a validation error. Anonymous requesters asking
    /// for their favourites or cart get nothing.
    pub async fn select<C>(
        &self,
        db: &C,
        requester: Option<i32>,
    ) -> Result<Select<recipes::Entity>, ApiError>
    where
        C: ConnectionTrait,
    {
        let mut select = recipes::Entity::find()
            .order_by_asc(recipes::Column::Name)
            .order_by_asc(recipes::Column::Id);

        if let Some(author) = self.author {
            select = select.filter(recipes::Column::AuthorId.eq(author));
        }

        if !self.tags.is_empty() {
            let (tag_ids, unknown) = crate::tags::resolve_slugs(db, &self.tags).await?;
            if let Some(slug) = unknown.first() {
                return Err(ApiError::field(
                    "tags",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        slug
                    ),
                ));
            }
            select = select.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tags::Column::RecipeId)
                        .from(recipe_tags::Entity)
                        .and_where(recipe_tags::Column::TagId.is_in(tag_ids))
                        .to_owned(),
                ),
            );
        }

        if self.is_favorited || self.is_in_shopping_cart {
            let user_id = match requester {
                Some(id) => id,
                None => return Ok(select.filter(Expr::cust("1 = 0"))),
            };

            if self.is_favorited {
                select = select.filter(
                    recipes::Column::Id.in_subquery(
                        Query::select()
                            .column(favourites::Column::RecipeId)
                            .from(favourites::Entity)
                            .and_where(favourites::Column::UserId.eq(user_id))
                            .to_owned(),
                    ),
                );
            }
            if self.is_in_shopping_cart {
                select = select.filter(
                    recipes::Column::Id.in_subquery(
                        Query::select()
                            .column(shopping_carts::Column::RecipeId)
                            .from(shopping_carts::Entity)
                            .and_where(shopping_carts::Column::UserId.eq(user_id))
                            .to_owned(),
                    ),
                );
            }
        }

        Ok(select)
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_owned())
        .or_default()
        .push(message.to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(RecipeFilter::from_query("").unwrap(), RecipeFilter::default());
    }

    #[test]
    fn test_flags_only_trigger_on_one() {
        let f = RecipeFilter::from_query("is_favorited=1&is_in_shopping_cart=0").unwrap();
        assert!(f.is_favorited);
        assert!(!f.is_in_shopping_cart);

        let f = RecipeFilter::from_query("is_favorited=1.0&is_in_shopping_cart=2").unwrap();
        assert!(f.is_favorited);
        assert!(!f.is_in_shopping_cart);
    }

    #[test]
    fn test_repeated_tags_and_author() {
        let f = RecipeFilter::from_query("tags=breakfast&tags=lunch&tags=breakfast&author=3")
            .unwrap();
        assert_eq!(f.tags, vec!["breakfast".to_owned(), "lunch".to_owned()]);
        assert_eq!(f.author, Some(3));
    }

    #[test]
    fn test_malformed_values() {
        match RecipeFilter::from_query("is_favorited=yes&author=me") {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors["is_favorited"], vec![ENTER_NUMBER.to_owned()]);
                assert_eq!(errors["author"], vec![INVALID_AUTHOR.to_owned()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_values_ignored() {
        let f = RecipeFilter::from_query("is_favorited=&author=&tags=").unwrap();
        assert_eq!(f, RecipeFilter::default());
    }
}
