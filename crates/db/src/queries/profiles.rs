//! Profile hierarchy loading (§3, §4.3 step 2, §4.5 Profile handlers).
//!
//! A profile's category/subcategory/URL tree is not stored pre-joined — it
//! is assembled here from the catalog tables (`url_categories`,
//! `url_subcategories`, `urls`) plus the per-profile selection and exclusion
//! tables (`profiles_categories`, `profile_inactive_subcategories`,
//! `profile_inactive_urls`). Active-mask composition lives entirely in SQL
//! so the domain type only ever carries the already-resolved flag.

use sqlx::PgPool;
use warden_core::{Category, CategoryUrl, Profile, Subcategory};

use crate::error::DbResult;
use crate::rows::{CategoryRow, ProfileRow, SubcategoryRow, UrlRow};

async fn fetch_categories(pool: &PgPool, profile_id: i64) -> DbResult<Vec<CategoryRow>> {
    let rows: Vec<CategoryRow> = sqlx::query_as(
        "SELECT url_categories.id, url_categories.name, profiles_categories.is_active \
         FROM profiles_categories \
         JOIN url_categories ON url_categories.id = profiles_categories.category_id \
         WHERE profiles_categories.profile_id = $1",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn fetch_subcategories(
    pool: &PgPool,
    profile_id: i64,
    category_id: i64,
) -> DbResult<Vec<SubcategoryRow>> {
    let rows: Vec<SubcategoryRow> = sqlx::query_as(
        "SELECT url_subcategories.id, url_subcategories.category_id, url_subcategories.name, \
         NOT EXISTS ( \
           SELECT 1 FROM profile_inactive_subcategories pis \
           WHERE pis.profile_id = $1 AND pis.subcategory_id = url_subcategories.id \
         ) AS is_active \
         FROM url_subcategories \
         WHERE url_subcategories.category_id = $2",
    )
    .bind(profile_id)
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn fetch_urls(pool: &PgPool, profile_id: i64, subcategory_id: i64) -> DbResult<Vec<UrlRow>> {
    let rows: Vec<UrlRow> = sqlx::query_as(
        "SELECT urls.id, urls.subcategory_id, urls.url, \
         NOT EXISTS ( \
           SELECT 1 FROM profile_inactive_urls piu \
           WHERE piu.profile_id = $1 AND piu.url_id = urls.id \
         ) AS is_active \
         FROM urls \
         WHERE urls.subcategory_id = $2",
    )
    .bind(profile_id)
    .bind(subcategory_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn fetch_programs(pool: &PgPool, profile_id: i64) -> DbResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT program FROM profiles_programs WHERE profile_id = $1 ORDER BY id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(p,)| p).collect())
}

async fn assemble_categories(pool: &PgPool, profile_id: i64) -> DbResult<Vec<Category>> {
    let mut categories = Vec::new();
    for cat in fetch_categories(pool, profile_id).await? {
        let mut subcategories = Vec::new();
        for sub in fetch_subcategories(pool, profile_id, cat.id).await? {
            let urls = fetch_urls(pool, profile_id, sub.id)
                .await?
                .into_iter()
                .map(|u| CategoryUrl { id: u.id, url: u.url, is_active: u.is_active })
                .collect();
            subcategories.push(Subcategory {
                id: sub.id,
                name: sub.name,
                is_active: sub.is_active,
                urls,
            });
        }
        categories.push(Category {
            id: cat.id,
            name: cat.name,
            is_active: cat.is_active,
            subcategories,
        });
    }
    Ok(categories)
}

fn row_to_profile(row: ProfileRow, programs: Vec<String>, categories: Vec<Category>) -> Profile {
    Profile {
        id: row.id,
        name: row.name,
        domains: row.domains,
        programs,
        categories,
        teacher_id: row.teacher_id,
        school_id: row.school_id,
        is_whitelist_url: row.is_whitelist_url,
        tracking_enabled: row.tracking_enabled,
    }
}

/// Assemble one profile's full hierarchy, including its active mask (§4.3
/// step 2, §4.5 Profile INSERT/UPDATE/RELOAD: "re-fetch profile (full
/// hierarchy + active mask)").
pub async fn fetch_one(pool: &PgPool, id: i64) -> DbResult<Option<Profile>> {
    let row: Option<ProfileRow> = sqlx::query_as(
        "SELECT id, name, domains, teacher_id, school_id, is_whitelist_url, tracking_enabled \
         FROM profiles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else { return Ok(None) };
    let programs = fetch_programs(pool, row.id).await?;
    let categories = assemble_categories(pool, row.id).await?;
    Ok(Some(row_to_profile(row, programs, categories)))
}

/// Load every profile for the initial bulk load (§4.3 step 2) and for
/// `RELOAD_ALL` (§4.5: "re-fetch every profile").
pub async fn fetch_all(pool: &PgPool) -> DbResult<Vec<Profile>> {
    let rows: Vec<ProfileRow> = sqlx::query_as(
        "SELECT id, name, domains, teacher_id, school_id, is_whitelist_url, tracking_enabled \
         FROM profiles",
    )
    .fetch_all(pool)
    .await?;

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        let programs = fetch_programs(pool, row.id).await?;
        let categories = assemble_categories(pool, row.id).await?;
        profiles.push(row_to_profile(row, programs, categories));
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ProfileRow {
        ProfileRow {
            id: 9001,
            name: "default".to_string(),
            domains: vec!["school.example".to_string()],
            teacher_id: Some(42),
            school_id: 1,
            is_whitelist_url: false,
            tracking_enabled: Some(true),
        }
    }

    #[test]
    fn row_to_profile_carries_the_resolved_hierarchy_through() {
        let category = Category { id: 1, name: "social".into(), is_active: true, subcategories: vec![] };
        let profile = row_to_profile(row(), vec!["core".to_string()], vec![category]);
        assert_eq!(profile.id, 9001);
        assert_eq!(profile.programs, vec!["core".to_string()]);
        assert_eq!(profile.categories.len(), 1);
        assert!(profile.tracking_enabled());
    }

    #[test]
    fn tracking_enabled_defaults_false_when_unset() {
        let mut unset = row();
        unset.tracking_enabled = None;
        let profile = row_to_profile(unset, vec![], vec![]);
        assert!(!profile.tracking_enabled());
    }
}
