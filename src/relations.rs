//! Toggle relations: favourites, shopping carts and subscriptions.
//!
//! Each is a unique (subject, object) row with no other state. Adding an
//! existing pair and removing an absent one are client errors.

use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::orm::{favourites, follows, shopping_carts};
use sea_orm::{
    entity::*, query::*, ActiveModelBehavior, DatabaseConnection, IntoActiveModel,
    TransactionTrait,
};

pub trait Toggle {
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;

    /// Conflict message for adding a pair twice.
    const ALREADY_ADDED: &'static str;
    /// Not-found message for removing a missing pair.
    const NOT_PRESENT: &'static str;

    fn subject() -> <Self::Entity as EntityTrait>::Column;
    fn object() -> <Self::Entity as EntityTrait>::Column;
    fn row(subject: i32, object: i32) -> Self::ActiveModel;
}

/// A user's favourite recipes.
pub struct Favourite;

impl Toggle for Favourite {
    type Entity = favourites::Entity;
    type ActiveModel = favourites::ActiveModel;

    const ALREADY_ADDED: &'static str = "the recipe has already been added to favorites";
    const NOT_PRESENT: &'static str = "the recipe is not in favorites";

    fn subject() -> favourites::Column {
        favourites::Column::UserId
    }

    fn object() -> favourites::Column {
        favourites::Column::RecipeId
    }

    fn row(user_id: i32, recipe_id: i32) -> favourites::ActiveModel {
        favourites::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
    }
}

/// Recipes a user plans to shop for.
pub struct ShoppingCart;

impl Toggle for ShoppingCart {
    type Entity = shopping_carts::Entity;
    type ActiveModel = shopping_carts::ActiveModel;

    const ALREADY_ADDED: &'static str = "the recipe has already been added to shopping cart";
    const NOT_PRESENT: &'static str = "the recipe is not in shopping cart";

    fn subject() -> shopping_carts::Column {
        shopping_carts::Column::UserId
    }

    fn object() -> shopping_carts::Column {
        shopping_carts::Column::RecipeId
    }

    fn row(user_id: i32, recipe_id: i32) -> shopping_carts::ActiveModel {
        shopping_carts::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
    }
}

/// Authors a user follows.
pub struct Subscription;

pub const SELF_SUBSCRIBE: &str = "subscribing to yourself is not possible";

impl Toggle for Subscription {
    type Entity = follows::Entity;
    type ActiveModel = follows::ActiveModel;

    const ALREADY_ADDED: &'static str = "the user is already in the subscriptions";
    const NOT_PRESENT: &'static str = "the user is not in subscriptions";

    fn subject() -> follows::Column {
        follows::Column::UserId
    }

    fn object() -> follows::Column {
        follows::Column::FollowingId
    }

    fn row(user_id: i32, following_id: i32) -> follows::ActiveModel {
        follows::ActiveModel {
            user_id: Set(user_id),
            following_id: Set(following_id),
            ..Default::default()
        }
    }
}

/// Inserts the pair, or fails with Conflict if it already exists.
///
/// The unique index backs up the existence check against concurrent adds.
pub async fn add<T>(db: &DatabaseConnection, subject: i32, object: i32) -> Result<(), ApiError>
where
    T: Toggle,
    <T::Entity as EntityTrait>::Model: IntoActiveModel<T::ActiveModel>,
{
    let txn = db.begin().await?;

    let exists = T::Entity::find()
        .filter(T::subject().eq(subject))
        .filter(T::object().eq(object))
        .one(&txn)
        .await?
        .is_some();
    if exists {
        return Err(ApiError::Conflict(T::ALREADY_ADDED.to_owned()));
    }

    T::row(subject, object).insert(&txn).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict(T::ALREADY_ADDED.to_owned())
        } else {
            e.into()
        }
    })?;

    txn.commit().await?;
    Ok(())
}

/// Deletes the pair, or fails with Missing if there was none.
pub async fn remove<T>(db: &DatabaseConnection, subject: i32, object: i32) -> Result<(), ApiError>
where
    T: Toggle,
{
    let txn = db.begin().await?;

    let res = T::Entity::delete_many()
        .filter(T::subject().eq(subject))
        .filter(T::object().eq(object))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ApiError::Missing(T::NOT_PRESENT.to_owned()));
    }

    txn.commit().await?;
    Ok(())
}

/// Follows `author_id`. Following yourself is rejected before anything else.
pub async fn subscribe(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(ApiError::Conflict(SELF_SUBSCRIBE.to_owned()));
    }
    add::<Subscription>(db, user_id, author_id).await
}
