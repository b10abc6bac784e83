use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A URL inside a subcategory. `is_active` is the already-resolved
/// composition from §3: `profiles_categories.is_active` AND absent from
/// `profile_inactive_subcategories` AND absent from `profile_inactive_urls`.
/// The database layer computes that composition at query time; this type
/// only ever carries the resolved flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryUrl {
    pub id: i64,
    pub url: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub urls: Vec<CategoryUrl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub subcategories: Vec<Subcategory>,
}

/// A restriction profile, with its full category/subcategory/URL hierarchy
/// owned in-line (§9: "best modeled as owned value trees ... do not share
/// sub-nodes across profiles; duplicating bytes is cheaper than tracking
/// back-references").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub domains: Vec<String>,
    pub programs: Vec<String>,
    pub categories: Vec<Category>,
    pub teacher_id: Option<i64>,
    pub school_id: i64,
    pub is_whitelist_url: bool,
    pub tracking_enabled: Option<bool>,
}

impl Profile {
    /// Whether heartbeats should be recorded when this profile resolves for
    /// a student (§4.6): "If the profile's `trackingEnabled` flag is set".
    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled.unwrap_or(false)
    }
}
