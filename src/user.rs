use crate::error::{ApiError, FieldErrors};
use crate::orm::{follows, recipes, users};
use crate::recipes::RecipeShortView;
use crate::validators::USERNAME_RE;
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Query, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

/// Public representation of a user, relative to the requester.
#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    fn new(user: users::Model, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }

    /// Renders users with one follow lookup for the whole batch.
    pub async fn render_many<C>(
        db: &C,
        requester: Option<i32>,
        users: Vec<users::Model>,
    ) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let followed = followed_among(db, requester, &ids).await?;

        Ok(users
            .into_iter()
            .map(|u| {
                let is_subscribed = followed.contains(&u.id);
                Self::new(u, is_subscribed)
            })
            .collect())
    }

    pub async fn render<C>(db: &C, requester: Option<i32>, user: users::Model) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let followed = followed_among(db, requester, &[user.id]).await?;
        let is_subscribed = followed.contains(&user.id);
        Ok(Self::new(user, is_subscribed))
    }
}

/// Ids out of `ids` that `requester` follows. Anonymous requesters follow no one.
pub async fn followed_among<C>(
    db: &C,
    requester: Option<i32>,
    ids: &[i32],
) -> Result<HashSet<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let requester = match requester {
        Some(id) if !ids.is_empty() => id,
        _ => return Ok(HashSet::new()),
    };

    Ok(follows::Entity::find()
        .filter(follows::Column::UserId.eq(requester))
        .filter(follows::Column::FollowingId.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.following_id)
        .collect())
}

/// A followed author together with a preview of their recipes.
#[derive(Clone, Debug, Serialize)]
pub struct FollowView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: usize,
}

impl FollowView {
    /// Loads every author's recipes in one query; `recipes_limit` truncates
    /// the preview but not the count.
    pub async fn render_many<C>(
        db: &C,
        authors: Vec<users::Model>,
        recipes_limit: Option<usize>,
    ) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        let ids: Vec<i32> = authors.iter().map(|u| u.id).collect();
        let mut by_author: HashMap<i32, Vec<recipes::Model>> = HashMap::new();
        if !ids.is_empty() {
            let rows = recipes::Entity::find()
                .filter(recipes::Column::AuthorId.is_in(ids))
                .order_by_asc(recipes::Column::Name)
                .order_by_asc(recipes::Column::Id)
                .all(db)
                .await?;
            for recipe in rows {
                by_author.entry(recipe.author_id).or_default().push(recipe);
            }
        }

        Ok(authors
            .into_iter()
            .map(|author| {
                let recipes = by_author.remove(&author.id).unwrap_or_default();
                let recipes_count = recipes.len();
                let shown = recipes_limit.unwrap_or(recipes_count);

                Self {
                    email: author.email,
                    id: author.id,
                    username: author.username,
                    first_name: author.first_name,
                    last_name: author.last_name,
                    recipes: recipes.iter().take(shown).map(RecipeShortView::from).collect(),
                    recipes_count,
                }
            })
            .collect())
    }

    pub async fn render<C>(
        db: &C,
        author: users::Model,
        recipes_limit: Option<usize>,
    ) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut views = Self::render_many(db, vec![author], recipes_limit).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("author vanished while rendering".to_owned()))
    }
}

/// Select of the users `user_id` follows, ordered by id.
pub fn subscriptions_of(user_id: i32) -> Select<users::Entity> {
    users::Entity::find()
        .filter(
            users::Column::Id.in_subquery(
                Query::select()
                    .column(follows::Column::FollowingId)
                    .from(follows::Entity)
                    .and_where(follows::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(users::Column::Id)
}

pub async fn get_user<C>(db: &C, id: i32) -> Result<Option<users::Model>, DbErr>
where
    C: ConnectionTrait,
{
    users::Entity::find_by_id(id).one(db).await
}

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = "USERNAME_RE",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(length(min = 8, max = 150))]
    pub password: String,
}

/// Registration response; the password never leaves the server.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<users::Model> for CreatedUser {
    fn from(user: users::Model) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            ApiError::Internal("Failed to hash password".to_owned())
        })
}

async fn taken_fields<C>(db: &C, email: &str, username: &str) -> Result<FieldErrors, DbErr>
where
    C: ConnectionTrait,
{
    let mut errors = FieldErrors::new();
    let clashes = users::Entity::find()
        .filter(
            Condition::any()
                .add(users::Column::Email.eq(email))
                .add(users::Column::Username.eq(username)),
        )
        .all(db)
        .await?;

    for user in clashes {
        if user.email == email {
            errors
                .entry("email".to_owned())
                .or_default()
                .push("A user with that email already exists.".to_owned());
        }
        if user.username == username {
            errors
                .entry("username".to_owned())
                .or_default()
                .push("A user with that username already exists.".to_owned());
        }
    }

    Ok(errors)
}

/// Validates and stores a new account with the `user` role.
pub async fn register_user<C>(db: &C, form: NewUser) -> Result<users::Model, ApiError>
where
    C: ConnectionTrait,
{
    form.validate()?;

    let username = form.username.trim();
    let email = form.email.trim().to_lowercase();

    let taken = taken_fields(db, &email, username).await?;
    if !taken.is_empty() {
        return Err(ApiError::Validation(taken));
    }

    let password = hash_password(&form.password)?;
    let user = users::ActiveModel {
        email: Set(email),
        username: Set(username.to_owned()),
        first_name: Set(form.first_name.trim().to_owned()),
        last_name: Set(form.last_name.trim().to_owned()),
        password: Set(password),
        role: Set(users::Role::User),
        date_joined: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        if crate::db::is_unique_violation(&e) {
            ApiError::field("username", "A user with that username or email already exists.")
        } else {
            e.into()
        }
    })?;

    log::info!("New user registered: {} (user_id: {})", user.username, user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    fn form() -> NewUser {
        NewUser {
            email: "cook@example.com".to_owned(),
            username: "cook".to_owned(),
            first_name: "Julia".to_owned(),
            last_name: "Child".to_owned(),
            password: "boeuf-bourguignon".to_owned(),
        }
    }

    #[test]
    fn test_valid_registration_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_registration_form_rejections() {
        let mut bad = form();
        bad.email = "not-an-email".to_owned();
        bad.username = "has space".to_owned();
        bad.password = "short".to_owned();

        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("boeuf-bourguignon").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"boeuf-bourguignon", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }
}
