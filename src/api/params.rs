//! Query-string and body shapes accepted at the HTTP boundary.
//!
//! Query values arrive as strings and are validated here into a
//! `ListFilter`. Unknown parameters are rejected rather than ignored.

use serde::{Deserialize, Serialize};

use crate::catalog::{
    AgeRange, CatalogError, CatalogResult, ContentType, EntityKind, ListFilter, Pagination, Scope,
};
use crate::store::OrderSlot;

/// Who a list request is answered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Always restricted to active content
    Public,
    /// May opt out of the active-only restriction
    Admin,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub age: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
    pub search: Option<String>,
    pub active_only: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Treat `?name=` the same as an absent parameter
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_int(name: &str, value: &Option<String>) -> CatalogResult<Option<i64>> {
    present(value)
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| CatalogError::validation(format!("{} must be an integer, got '{}'", name, v)))
        })
        .transpose()
}

fn parse_bool(name: &str, value: &Option<String>) -> CatalogResult<Option<bool>> {
    present(value)
        .map(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(CatalogError::validation(format!(
                "{} must be true or false, got '{}'",
                name, v
            ))),
        })
        .transpose()
}

impl ListParams {
    /// Validate into a filter and raw pagination for `audience`
    pub fn into_query(self, audience: Audience) -> CatalogResult<(ListFilter, Pagination)> {
        let content_type = present(&self.content_type)
            .map(str::parse::<ContentType>)
            .transpose()?;
        let age = present(&self.age).map(str::parse::<AgeRange>).transpose()?;

        let active_only = match audience {
            Audience::Public => true,
            Audience::Admin => parse_bool("activeOnly", &self.active_only)?.unwrap_or(false),
        };

        let filter = ListFilter {
            content_type,
            age,
            category: parse_int("category", &self.category)?,
            age_group: parse_int("ageGroup", &self.age_group)?,
            search: self.search,
            active_only,
        };

        let pagination = Pagination {
            limit: parse_int("limit", &self.limit)?,
            offset: parse_int("offset", &self.offset)?,
        };

        Ok((filter, pagination))
    }
}

/// Body of a reorder request: the complete target order of one scope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderRequest {
    /// Required for content, which is ordered per type
    #[serde(rename = "type", default)]
    pub content_type: Option<ContentType>,
    pub ordered_ids: Vec<i64>,
}

impl ReorderRequest {
    /// Scope this request reorders for `kind`. Only content takes a `type`.
    pub fn scope(&self, kind: EntityKind) -> CatalogResult<Scope> {
        if kind != EntityKind::Content && self.content_type.is_some() {
            return Err(CatalogError::validation(format!(
                "type is not accepted when reordering {}",
                kind
            )));
        }
        Scope::for_kind(kind, self.content_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub scope: String,
    pub data: Vec<OrderSlot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        axum::extract::Query::<ListParams>::try_from_uri(
            &format!("/contents?{}", query).parse().unwrap(),
        )
        .unwrap()
        .0
    }

    #[test]
    fn test_public_always_active_only() {
        let (filter, _) = params(&[("activeOnly", "false")])
            .into_query(Audience::Public)
            .unwrap();
        assert!(filter.active_only);

        let (filter, _) = params(&[]).into_query(Audience::Admin).unwrap();
        assert!(!filter.active_only);

        let (filter, _) = params(&[("activeOnly", "true")])
            .into_query(Audience::Admin)
            .unwrap();
        assert!(filter.active_only);
    }

    #[test]
    fn test_parses_filters() {
        let (filter, pagination) = params(&[
            ("type", "video"),
            ("age", "3-6"),
            ("category", "7"),
            ("ageGroup", "2"),
            ("limit", "10"),
            ("offset", "20"),
        ])
        .into_query(Audience::Admin)
        .unwrap();

        assert_eq!(filter.content_type, Some(ContentType::Video));
        assert_eq!(filter.age, Some(AgeRange { min: 3, max: 6 }));
        assert_eq!(filter.category, Some(7));
        assert_eq!(filter.age_group, Some(2));
        assert_eq!(pagination, Pagination::new(10, 20));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let (filter, pagination) = params(&[("type", ""), ("limit", "")])
            .into_query(Audience::Admin)
            .unwrap();
        assert_eq!(filter.content_type, None);
        assert_eq!(pagination.limit, None);
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(params(&[("limit", "ten")]).into_query(Audience::Admin).is_err());
        assert!(params(&[("type", "podcast")]).into_query(Audience::Admin).is_err());
        assert!(params(&[("age", "9-3")]).into_query(Audience::Admin).is_err());
        assert!(params(&[("activeOnly", "maybe")]).into_query(Audience::Admin).is_err());
    }

    fn reorder_body(json: &str) -> ReorderRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_reorder_scope_by_kind() {
        let typed = reorder_body(r#"{"type":"video","orderedIds":[2,1]}"#);
        assert_eq!(
            typed.scope(EntityKind::Content).unwrap(),
            Scope::Content(ContentType::Video)
        );
        assert!(typed.scope(EntityKind::Category).is_err());
        assert!(typed.scope(EntityKind::AgeGroup).is_err());

        let untyped = reorder_body(r#"{"orderedIds":[2,1]}"#);
        assert_eq!(untyped.scope(EntityKind::Category).unwrap(), Scope::Categories);
        assert!(untyped.scope(EntityKind::Content).is_err());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let uri = "/contents?sort=title".parse().unwrap();
        assert!(axum::extract::Query::<ListParams>::try_from_uri(&uri).is_err());
    }
}
