//! Recipe create/update payloads and the transactions that apply them.

use super::image::{decode_image, store_image, DecodedImage};
use crate::error::{ApiError, FieldErrors};
use crate::orm::{
    favourites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_carts, tags,
};
use crate::storage::StorageBackend;
use crate::validators::{validate_amount, MAX_SMALL_INT, MIN_COOKING_TIME_MESSAGE};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NAME_MAX_CHARS: usize = 200;

#[derive(Clone, Debug, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i64,
}

/// Flat recipe payload. Every field is required on create and optional on
/// update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecipeWrite {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// A payload that passed validation.
#[derive(Debug, Default)]
struct RecipeChanges {
    ingredients: Option<Vec<(i32, i32)>>,
    tags: Option<Vec<i32>>,
    image: Option<DecodedImage>,
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_owned())
        .or_default()
        .push(message.into());
}

impl RecipeWrite {
    /// Checks every field and collects all problems before failing.
    async fn validate<C>(self, db: &C, partial: bool) -> Result<RecipeChanges, ApiError>
    where
        C: ConnectionTrait,
    {
        let mut errors = FieldErrors::new();
        let mut changes = RecipeChanges::default();

        if !partial {
            let missing = [
                ("ingredients", self.ingredients.is_none()),
                ("tags", self.tags.is_none()),
                ("image", self.image.is_none()),
                ("name", self.name.is_none()),
                ("text", self.text.is_none()),
                ("cooking_time", self.cooking_time.is_none()),
            ];
            for (field, absent) in missing {
                if absent {
                    push(&mut errors, field, REQUIRED);
                }
            }
        }

        if let Some(lines) = self.ingredients {
            match check_ingredients(db, &lines).await? {
                Ok(valid) => changes.ingredients = Some(valid),
                Err(messages) => {
                    for message in messages {
                        push(&mut errors, "ingredients", message);
                    }
                }
            }
        }

        if let Some(ids) = self.tags {
            match check_tags(db, ids).await? {
                Ok(valid) => changes.tags = Some(valid),
                Err(message) => push(&mut errors, "tags", message),
            }
        }

        if let Some(payload) = self.image {
            match decode_image(&payload) {
                Ok(image) => changes.image = Some(image),
                Err(message) => push(&mut errors, "image", message),
            }
        }

        if let Some(name) = self.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                push(&mut errors, "name", BLANK);
            } else if name.chars().count() > NAME_MAX_CHARS {
                push(
                    &mut errors,
                    "name",
                    "Ensure this field has no more than 200 characters.",
                );
            } else {
                changes.name = Some(name);
            }
        }

        if let Some(text) = self.text {
            if text.trim().is_empty() {
                push(&mut errors, "text", BLANK);
            } else {
                changes.text = Some(text);
            }
        }

        if let Some(minutes) = self.cooking_time {
            if minutes < 1 {
                push(&mut errors, "cooking_time", MIN_COOKING_TIME_MESSAGE);
            } else if minutes > i64::from(MAX_SMALL_INT) {
                push(
                    &mut errors,
                    "cooking_time",
                    "Ensure this value is less than or equal to 32767.",
                );
            } else {
                changes.cooking_time = Some(minutes as i32);
            }
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Validates every line: amount range, existence, no repeats.
async fn check_ingredients<C>(
    db: &C,
    lines: &[IngredientAmount],
) -> Result<Result<Vec<(i32, i32)>, Vec<String>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut messages: Vec<String> = Vec::new();

    for line in lines {
        let amount = line.amount.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        if let Err(message) = validate_amount(amount) {
            if !messages.iter().any(|m| m == message) {
                messages.push(message.to_owned());
            }
        }
    }

    let seen: HashSet<i32> = lines.iter().map(|line| line.id).collect();
    if seen.len() != lines.len() {
        messages.push("Ingredients must be unique.".to_owned());
    }

    if !seen.is_empty() {
        let known: HashSet<i32> = ingredients::Entity::find()
            .filter(ingredients::Column::Id.is_in(seen.iter().copied().collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();

        for line in lines {
            if !known.contains(&line.id) {
                messages.push(format!(
                    "Invalid pk \"{}\" - object does not exist.",
                    line.id
                ));
            }
        }
    }

    if messages.is_empty() {
        Ok(Ok(lines.iter().map(|l| (l.id, l.amount as i32)).collect()))
    } else {
        Ok(Err(messages))
    }
}

/// Collapses repeats and checks every tag exists.
async fn check_tags<C>(db: &C, ids: Vec<i32>) -> Result<Result<Vec<i32>, String>, DbErr>
where
    C: ConnectionTrait,
{
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    if unique.is_empty() {
        return Ok(Ok(unique));
    }

    let known: HashSet<i32> = tags::Entity::find()
        .filter(tags::Column::Id.is_in(unique.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    match unique.iter().find(|id| !known.contains(id)) {
        Some(id) => Ok(Err(format!("Invalid pk \"{}\" - object does not exist.", id))),
        None => Ok(Ok(unique)),
    }
}

/// Deletes the recipe's ingredient lines and inserts `lines` in their place.
async fn replace_ingredients(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    lines: &[(i32, i32)],
) -> Result<(), DbErr> {
    recipe_ingredients::Entity::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }
    recipe_ingredients::Entity::insert_many(lines.iter().map(|(ingredient_id, amount)| {
        recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        }
    }))
    .exec(txn)
    .await?;

    Ok(())
}

/// Deletes the recipe's tag links and inserts `tag_ids` in their place.
async fn replace_tags(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    recipe_tags::Entity::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }
    recipe_tags::Entity::insert_many(tag_ids.iter().map(|tag_id| recipe_tags::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
        ..Default::default()
    }))
    .exec(txn)
    .await?;

    Ok(())
}

/// Removes an image stored for a write that did not go through.
async fn discard_image(storage: &dyn StorageBackend, key: &str) {
    if let Err(err) = storage.delete_object(key).await {
        log::warn!("Unable to remove orphaned image {}: {}", key, err);
    }
}

/// Creates a recipe owned by `author_id` together with its join rows.
pub async fn create_recipe(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    author_id: i32,
    payload: RecipeWrite,
) -> Result<recipes::Model, ApiError> {
    let mut changes = payload.validate(db, false).await?;
    let image = match changes.image.take() {
        Some(image) => store_image(storage, image).await?,
        None => return Err(ApiError::field("image", REQUIRED)),
    };

    match insert_recipe(db, author_id, &image, changes).await {
        Ok(recipe) => {
            log::info!("Recipe {} created by user {}", recipe.id, author_id);
            Ok(recipe)
        }
        Err(err) => {
            discard_image(storage, &image).await;
            Err(err.into())
        }
    }
}

async fn insert_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    image: &str,
    changes: RecipeChanges,
) -> Result<recipes::Model, DbErr> {
    let txn = db.begin().await?;
    let recipe = recipes::ActiveModel {
        author_id: Set(author_id),
        name: Set(changes.name.unwrap_or_default()),
        image: Set(image.to_owned()),
        text: Set(changes.text.unwrap_or_default()),
        cooking_time: Set(changes.cooking_time.unwrap_or(1)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_ingredients(&txn, recipe.id, &changes.ingredients.unwrap_or_default()).await?;
    replace_tags(&txn, recipe.id, &changes.tags.unwrap_or_default()).await?;
    txn.commit().await?;

    Ok(recipe)
}

/// Applies the fields present in `payload`. Join rows are replaced wholesale
/// when their field is present and left alone otherwise.
pub async fn update_recipe(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    recipe: recipes::Model,
    payload: RecipeWrite,
) -> Result<recipes::Model, ApiError> {
    let mut changes = payload.validate(db, true).await?;
    let image = match changes.image.take() {
        Some(image) => Some(store_image(storage, image).await?),
        None => None,
    };

    let recipe_id = recipe.id;
    match apply_changes(db, recipe, image.clone(), changes).await {
        Ok(recipe) => {
            log::info!("Recipe {} updated", recipe_id);
            Ok(recipe)
        }
        Err(err) => {
            if let Some(key) = image {
                discard_image(storage, &key).await;
            }
            Err(err.into())
        }
    }
}

async fn apply_changes(
    db: &DatabaseConnection,
    recipe: recipes::Model,
    image: Option<String>,
    changes: RecipeChanges,
) -> Result<recipes::Model, DbErr> {
    let txn = db.begin().await?;
    let recipe_id = recipe.id;
    let scalars_changed = changes.name.is_some()
        || changes.text.is_some()
        || changes.cooking_time.is_some()
        || image.is_some();

    let recipe = if scalars_changed {
        let mut active: recipes::ActiveModel = recipe.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(minutes) = changes.cooking_time {
            active.cooking_time = Set(minutes);
        }
        if let Some(image) = image {
            active.image = Set(image);
        }
        active.update(&txn).await?
    } else {
        recipe
    };

    if let Some(lines) = changes.ingredients {
        replace_ingredients(&txn, recipe_id, &lines).await?;
    }
    if let Some(tag_ids) = changes.tags {
        replace_tags(&txn, recipe_id, &tag_ids).await?;
    }
    txn.commit().await?;

    Ok(recipe)
}

/// Removes a recipe and every row that hangs off it.
pub async fn delete_recipe(db: &DatabaseConnection, recipe_id: i32) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    recipe_ingredients::Entity::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe_tags::Entity::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    favourites::Entity::delete_many()
        .filter(favourites::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    shopping_carts::Entity::delete_many()
        .filter(shopping_carts::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipes::Entity::delete_many()
        .filter(recipes::Column::Id.eq(recipe_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    log::info!("Recipe {} deleted", recipe_id);
    Ok(())
}
