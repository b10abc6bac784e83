//! Raw row shapes returned by `sqlx::query_as!`-style queries, before
//! conversion into `warden-core` domain types. Kept separate from the domain
//! types themselves (§3) so a column rename only touches this file.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub feide_email: Option<String>,
    pub school_id: i64,
    pub grade: Option<String>,
    pub class_id: Option<i64>,
}

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub name: String,
    pub domains: Vec<String>,
    pub teacher_id: Option<i64>,
    pub school_id: i64,
    pub is_whitelist_url: bool,
    pub tracking_enabled: Option<bool>,
}

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    /// `profiles_categories.is_active`, prior to the subcategory/URL mask.
    pub is_active: bool,
}

#[derive(Debug, FromRow)]
pub struct SubcategoryRow {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    /// True unless present in `profile_inactive_subcategories` for this profile.
    pub is_active: bool,
}

#[derive(Debug, FromRow)]
pub struct UrlRow {
    pub id: i64,
    pub subcategory_id: i64,
    pub url: String,
    /// True unless present in `profile_inactive_urls` for this profile.
    pub is_active: bool,
}

#[derive(Debug, FromRow)]
pub struct RuleRow {
    pub id: i64,
    pub scope: String,
    pub scope_value: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub profile_id: i64,
}

#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub student_id: i64,
    pub student_email: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub school_id: i64,
    pub teacher_session_id: Option<i64>,
    pub grade: Option<String>,
    pub profile_id: Option<i64>,
    pub is_active: Option<bool>,
    pub percentage: Option<f64>,
}
