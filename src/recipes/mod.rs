//! Recipes: the nested read views and the lookups behind them.
//!
//! Payloads are validated and applied in [`write`]; every response goes back
//! through [`RecipeView`], rendered for an explicit requester.

pub mod filter;
pub mod image;
pub mod write;

use crate::orm::{
    favourites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_carts, tags, users,
};
use crate::user::UserView;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub use filter::RecipeFilter;
pub use write::{create_recipe, delete_recipe, update_recipe, IngredientAmount, RecipeWrite};

/// Public URL of a stored media file.
pub fn media_url(path: &str) -> String {
    let media = crate::app_config::media();
    format!("{}/{}", media.url.trim_end_matches('/'), path)
}

/// Compact recipe used by favourites, carts and subscriptions.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeShortView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&recipes::Model> for RecipeShortView {
    fn from(recipe: &recipes::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// An ingredient line of a recipe.
#[derive(Clone, Debug, Serialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<tags::Model>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    /// Renders a batch of recipes with one query per relation kind.
    pub async fn render_many<C>(
        db: &C,
        requester: Option<i32>,
        recipes: Vec<recipes::Model>,
    ) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

        let mut tags_by_recipe = load_tags(db, &ids).await?;
        let mut ingredients_by_recipe = load_ingredients(db, &ids).await?;
        let authors = load_authors(db, requester, &recipes).await?;
        let favourited = requester_marks::<favourites::Entity, _>(
            db,
            requester,
            &ids,
            favourites::Column::UserId,
            favourites::Column::RecipeId,
        )
        .await?;
        let carted = requester_marks::<shopping_carts::Entity, _>(
            db,
            requester,
            &ids,
            shopping_carts::Column::UserId,
            shopping_carts::Column::RecipeId,
        )
        .await?;

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    DbErr::RecordNotFound(format!("author of recipe {}", recipe.id))
                })?;

                Ok(Self {
                    id: recipe.id,
                    tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    author,
                    ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favourited.contains(&recipe.id),
                    is_in_shopping_cart: carted.contains(&recipe.id),
                    image: media_url(&recipe.image),
                    name: recipe.name,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    pub async fn render<C>(
        db: &C,
        requester: Option<i32>,
        recipe: recipes::Model,
    ) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let id = recipe.id;
        Self::render_many(db, requester, vec![recipe])
            .await?
            .pop()
            .ok_or_else(|| DbErr::RecordNotFound(format!("recipe {}", id)))
    }
}

pub async fn get_recipe<C>(db: &C, id: i32) -> Result<Option<recipes::Model>, DbErr>
where
    C: ConnectionTrait,
{
    recipes::Entity::find_by_id(id).one(db).await
}

/// Tags per recipe, each list ordered by tag name.
async fn load_tags<C>(db: &C, ids: &[i32]) -> Result<HashMap<i32, Vec<tags::Model>>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = recipe_tags::Entity::find()
        .filter(recipe_tags::Column::RecipeId.is_in(ids.to_vec()))
        .find_also_related(tags::Entity)
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<tags::Model>> = HashMap::new();
    for (link, tag) in rows {
        if let Some(tag) = tag {
            map.entry(link.recipe_id).or_default().push(tag);
        }
    }
    for list in map.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    Ok(map)
}

/// Ingredient lines per recipe, in the order they were submitted.
async fn load_ingredients<C>(
    db: &C,
    ids: &[i32],
) -> Result<HashMap<i32, Vec<RecipeIngredientView>>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = recipe_ingredients::Entity::find()
        .filter(recipe_ingredients::Column::RecipeId.is_in(ids.to_vec()))
        .order_by_asc(recipe_ingredients::Column::Id)
        .find_also_related(ingredients::Entity)
        .all(db)
        .await?;

    let mut map: HashMap<i32, Vec<RecipeIngredientView>> = HashMap::new();
    for (line, ingredient) in rows {
        if let Some(ingredient) = ingredient {
            map.entry(line.recipe_id)
                .or_default()
                .push(RecipeIngredientView {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: line.amount,
                });
        }
    }

    Ok(map)
}

async fn load_authors<C>(
    db: &C,
    requester: Option<i32>,
    recipes: &[recipes::Model],
) -> Result<HashMap<i32, UserView>, DbErr>
where
    C: ConnectionTrait,
{
    let author_ids: HashSet<i32> = recipes.iter().map(|r| r.author_id).collect();
    let authors = users::Entity::find()
        .filter(users::Column::Id.is_in(author_ids.into_iter().collect::<Vec<_>>()))
        .all(db)
        .await?;

    Ok(UserView::render_many(db, requester, authors)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

/// Recipe ids out of `ids` the requester has a (user, recipe) row for.
/// Anonymous requesters never trigger a query.
async fn requester_marks<E, C>(
    db: &C,
    requester: Option<i32>,
    ids: &[i32],
    user_col: E::Column,
    recipe_col: E::Column,
) -> Result<HashSet<i32>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let user_id = match requester {
        Some(id) => id,
        None => return Ok(HashSet::new()),
    };

    let marked = E::find()
        .select_only()
        .column_as(recipe_col, "recipe_id")
        .filter(user_col.eq(user_id))
        .filter(recipe_col.is_in(ids.to_vec()))
        .into_model::<MarkedRecipe>()
        .all(db)
        .await?;

    Ok(marked.into_iter().map(|m| m.recipe_id).collect())
}

#[derive(Debug, FromQueryResult)]
struct MarkedRecipe {
    recipe_id: i32,
}
