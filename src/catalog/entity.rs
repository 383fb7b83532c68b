//! Catalog entities and the inputs used to create or patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult};
use super::scope::ContentType;

/// Oldest age the catalog targets
pub const MAX_AGE: i64 = 18;

/// Category as embedded in a content item's relation array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

/// Age group as embedded in a content item's relation array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroupSummary {
    pub id: i64,
    pub label: String,
    pub age_min: i64,
    pub age_max: i64,
}

/// A story, video or game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub age_min: i64,
    pub age_max: i64,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,

    /// Position within the content type's scope
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Projected categories (capped for public views)
    pub categories: Vec<CategorySummary>,

    /// Projected age groups
    pub age_groups: Vec<AgeGroupSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeGroup {
    pub id: i64,
    pub label: String,
    pub description: String,
    pub age_min: i64,
    pub age_max: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform key/value setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Attributes for a new content item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewContent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub age_min: i64,
    pub age_max: i64,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub age_group_ids: Option<Vec<i64>>,
}

impl NewContent {
    /// Create a new content item with the required fields
    pub fn new(
        title: impl Into<String>,
        content_type: ContentType,
        age_min: i64,
        age_max: i64,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            content_type,
            age_min,
            age_max,
            media_url: None,
            thumbnail_url: None,
            is_active: true,
            category_ids: None,
            age_group_ids: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.category_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn with_age_groups(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.age_group_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validate_label("title", &self.title)?;
        validate_age_range(self.age_min, self.age_max)
    }
}

/// Partial update of a content item.
///
/// An empty `mediaUrl` or `thumbnailUrl` clears the stored value. Relation
/// id lists, when present, fully replace the existing links.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    pub age_group_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validate_label("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAgeGroup {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub age_min: i64,
    pub age_max: i64,
}

impl NewAgeGroup {
    pub fn new(label: impl Into<String>, age_min: i64, age_max: i64) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
            age_min,
            age_max,
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validate_label("label", &self.label)?;
        validate_age_range(self.age_min, self.age_max)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AgeGroupPatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSetting {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

impl NewSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validate_label("key", &self.key)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingPatch {
    pub key: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
}

/// Reject blank titles, names, labels and keys
pub(crate) fn validate_label(field: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn validate_age_range(age_min: i64, age_max: i64) -> CatalogResult<()> {
    if !(0..=MAX_AGE).contains(&age_min) || !(0..=MAX_AGE).contains(&age_max) {
        return Err(CatalogError::validation(format!(
            "ages must be between 0 and {}",
            MAX_AGE
        )));
    }
    if age_min > age_max {
        return Err(CatalogError::validation(format!(
            "ageMin ({}) must not exceed ageMax ({})",
            age_min, age_max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_content_validation() {
        assert!(NewContent::new("Bedtime", ContentType::Story, 3, 6).validate().is_ok());
        assert!(NewContent::new("   ", ContentType::Story, 3, 6).validate().is_err());
        assert!(NewContent::new("Bedtime", ContentType::Story, 7, 6).validate().is_err());
        assert!(NewContent::new("Bedtime", ContentType::Story, 3, 30).validate().is_err());
    }

    #[test]
    fn test_new_content_deserialize_defaults() {
        let json = r#"{"title":"Space Quiz","type":"game","ageMin":6,"ageMax":9}"#;
        let content: NewContent = serde_json::from_str(json).unwrap();

        assert_eq!(content.content_type, ContentType::Game);
        assert!(content.is_active);
        assert!(content.description.is_empty());
        assert!(content.category_ids.is_none());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"name":"Animals","orderIndex":4}"#;
        assert!(serde_json::from_str::<NewCategory>(json).is_err());

        let json = r#"{"title":"x","orderIndex":0}"#;
        assert!(serde_json::from_str::<ContentPatch>(json).is_err());
    }

    #[test]
    fn test_content_serializes_camel_case() {
        let now = Utc::now();
        let content = Content {
            id: 1,
            title: "Lion".to_string(),
            description: String::new(),
            content_type: ContentType::Video,
            age_min: 2,
            age_max: 5,
            media_url: None,
            thumbnail_url: None,
            is_active: true,
            order_index: 0,
            created_at: now,
            updated_at: now,
            categories: Vec::new(),
            age_groups: Vec::new(),
        };

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["orderIndex"], 0);
        assert_eq!(value["isActive"], true);
        assert!(value["categories"].is_array());
    }
}
