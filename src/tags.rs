//! Recipe tags: reference data, read-only over HTTP.

use crate::orm::tags;
use crate::validators::{validate_hex_color, SLUG_RE};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Deserialize;
use validator::Validate;

/// A tag row as loaded by the import tool.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewTag {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 7), custom = "validate_hex_color")]
    pub color: String,
    #[validate(
        length(min = 1, max = 200),
        regex(path = "SLUG_RE", message = "Enter a valid slug.")
    )]
    pub slug: String,
}

/// All tags, ordered by name.
pub async fn list_tags<C>(db: &C) -> Result<Vec<tags::Model>, DbErr>
where
    C: ConnectionTrait,
{
    tags::Entity::find()
        .order_by_asc(tags::Column::Name)
        .order_by_asc(tags::Column::Id)
        .all(db)
        .await
}

pub async fn get_tag<C>(db: &C, id: i32) -> Result<Option<tags::Model>, DbErr>
where
    C: ConnectionTrait,
{
    tags::Entity::find_by_id(id).one(db).await
}

/// Ids of the tags carrying any of the given slugs, plus the slugs that matched nothing.
pub async fn resolve_slugs<C>(db: &C, slugs: &[String]) -> Result<(Vec<i32>, Vec<String>), DbErr>
where
    C: ConnectionTrait,
{
    if slugs.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let found = tags::Entity::find()
        .filter(tags::Column::Slug.is_in(slugs.iter().cloned()))
        .all(db)
        .await?;

    let unknown = slugs
        .iter()
        .filter(|slug| !found.iter().any(|t| &t.slug == *slug))
        .cloned()
        .collect();
    Ok((found.into_iter().map(|t| t.id).collect(), unknown))
}

/// Inserts tags that do not exist yet. Returns how many were inserted.
///
/// Callers validate rows beforehand.
pub async fn insert_tags<C>(db: &C, rows: &[NewTag]) -> Result<usize, DbErr>
where
    C: ConnectionTrait,
{
    let mut inserted = 0;
    for row in rows {
        let exists = tags::Entity::find()
            .filter(tags::Column::Name.eq(row.name.as_str()))
            .filter(tags::Column::Color.eq(row.color.as_str()))
            .filter(tags::Column::Slug.eq(row.slug.as_str()))
            .one(db)
            .await?
            .is_some();
        if exists {
            log::debug!("Skipping existing tag {}", row.slug);
            continue;
        }

        tags::ActiveModel {
            name: Set(row.name.to_owned()),
            color: Set(row.color.to_owned()),
            slug: Set(row.slug.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted += 1;
    }

    Ok(inserted)
}
