//! Entity kinds, content types and ordering scopes.
//!
//! Every entity kind declares an ordering capability. Manually ordered kinds
//! carry a dense `order_index` per scope; naturally ordered kinds sort on
//! their own fields and reject reorder requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult};

/// Kind of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Content,
    Category,
    AgeGroup,
    Setting,
}

/// How a kind's list is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingCapability {
    /// Admin-controlled dense `order_index`, optionally partitioned by a column
    Manual { partition_column: Option<&'static str> },

    /// Sorted by the given SQL key, no `order_index`
    Natural { order_by: &'static str },
}

impl EntityKind {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Content => "contents",
            EntityKind::Category => "categories",
            EntityKind::AgeGroup => "age_groups",
            EntityKind::Setting => "settings",
        }
    }

    pub fn ordering(self) -> OrderingCapability {
        match self {
            EntityKind::Content => OrderingCapability::Manual {
                partition_column: Some("content_type"),
            },
            EntityKind::Category => OrderingCapability::Manual {
                partition_column: None,
            },
            EntityKind::AgeGroup => OrderingCapability::Natural {
                order_by: "age_min ASC, age_max ASC",
            },
            EntityKind::Setting => OrderingCapability::Natural {
                order_by: "key ASC",
            },
        }
    }

    pub fn is_manually_ordered(self) -> bool {
        matches!(self.ordering(), OrderingCapability::Manual { .. })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Content => write!(f, "content"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::AgeGroup => write!(f, "age group"),
            EntityKind::Setting => write!(f, "setting"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> CatalogResult<Self> {
        match s.to_lowercase().as_str() {
            "content" | "contents" => Ok(EntityKind::Content),
            "category" | "categories" => Ok(EntityKind::Category),
            "age-group" | "age-groups" | "age_group" | "agegroup" => Ok(EntityKind::AgeGroup),
            "setting" | "settings" => Ok(EntityKind::Setting),
            _ => Err(CatalogError::validation(format!("unknown entity kind: {}", s))),
        }
    }
}

/// Type of content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Story,
    Video,
    Game,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Story => "story",
            ContentType::Video => "video",
            ContentType::Game => "game",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CatalogError;

    fn from_str(s: &str) -> CatalogResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "story" => Ok(ContentType::Story),
            "video" => Ok(ContentType::Video),
            "game" => Ok(ContentType::Game),
            _ => Err(CatalogError::validation(format!("unknown content type: {}", s))),
        }
    }
}

/// Partition within which a dense ordering is maintained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// All content of one type
    Content(ContentType),
    Categories,
    AgeGroups,
    Settings,
}

impl Scope {
    /// Build the scope for a kind. Content needs its type to pick a partition.
    pub fn for_kind(kind: EntityKind, content_type: Option<ContentType>) -> CatalogResult<Self> {
        match kind {
            EntityKind::Content => content_type
                .map(Scope::Content)
                .ok_or_else(|| CatalogError::validation("content scope requires a type")),
            EntityKind::Category => Ok(Scope::Categories),
            EntityKind::AgeGroup => Ok(Scope::AgeGroups),
            EntityKind::Setting => Ok(Scope::Settings),
        }
    }

    pub fn kind(self) -> EntityKind {
        match self {
            Scope::Content(_) => EntityKind::Content,
            Scope::Categories => EntityKind::Category,
            Scope::AgeGroups => EntityKind::AgeGroup,
            Scope::Settings => EntityKind::Setting,
        }
    }

    /// Partition predicate column and value, if the scope is partitioned
    pub(crate) fn partition(self) -> Option<(&'static str, &'static str)> {
        match (self.kind().ordering(), self) {
            (
                OrderingCapability::Manual {
                    partition_column: Some(column),
                },
                Scope::Content(content_type),
            ) => Some((column, content_type.as_str())),
            _ => None,
        }
    }

    /// Fail unless this scope carries a manual `order_index`
    pub fn require_manual(self) -> CatalogResult<()> {
        if self.kind().is_manually_ordered() {
            Ok(())
        } else {
            Err(CatalogError::validation(format!(
                "{} scope does not support manual ordering",
                self
            )))
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Content(content_type) => write!(f, "content:{}", content_type),
            Scope::Categories => write!(f, "categories"),
            Scope::AgeGroups => write!(f, "age-groups"),
            Scope::Settings => write!(f, "settings"),
        }
    }
}
