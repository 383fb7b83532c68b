//! Relation projection for public and admin views.
//!
//! Projection is pure: it only reshapes the relation rows it is given.

use serde::{Deserialize, Serialize};

use super::entity::{AgeGroupSummary, CategorySummary};

/// Number of categories shown on a public content item
pub const DEFAULT_PUBLIC_CATEGORY_CAP: usize = 3;

/// Which audience a response is shaped for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum Projection {
    /// Unauthenticated consumers; categories are capped
    Public { category_cap: usize },

    /// Administrators; everything they control is shown
    Admin,
}

impl Projection {
    pub fn public() -> Self {
        Projection::Public {
            category_cap: DEFAULT_PUBLIC_CATEGORY_CAP,
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Projection::Public { .. })
    }

    /// Project related categories: ascending by id, capped for public views
    pub fn categories(self, rows: &[CategorySummary]) -> Vec<CategorySummary> {
        let mut projected = rows.to_vec();
        projected.sort_by_key(|c| c.id);
        projected.dedup_by_key(|c| c.id);

        if let Projection::Public { category_cap } = self {
            projected.truncate(category_cap);
        }
        projected
    }

    /// Project related age groups: youngest first, never capped
    pub fn age_groups(self, rows: &[AgeGroupSummary]) -> Vec<AgeGroupSummary> {
        let mut projected = rows.to_vec();
        projected.sort_by_key(|g| (g.age_min, g.age_max, g.id));
        projected.dedup_by_key(|g| g.id);
        projected
    }
}
