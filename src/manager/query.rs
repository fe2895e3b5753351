//! Client-side filtering and sorting of a cached entity list. Pure so it
//! can be tested without a store.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::config::{EntityConfig, SortDirection};
use crate::value;

use super::store::Entity;

/// One active structured filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Scalar field equals this value.
    Select(String),
    /// List field contains this value.
    Multi(String),
    Bool(bool),
    /// Numeric field within the closed interval; open ends are unbounded.
    Range { min: Option<f64>, max: Option<f64> },
}

/// Free-text search plus structured filters plus a sort, AND-composed.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub search: Option<String>,
    pub filters: HashMap<String, FilterValue>,
    pub sort_key: Option<String>,
    pub direction: SortDirection,
}

impl Default for EntityQuery {
    fn default() -> Self {
        Self {
            search: None,
            filters: HashMap::new(),
            sort_key: None,
            direction: SortDirection::Asc,
        }
    }
}

impl EntityQuery {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, filter: FilterValue) -> Self {
        self.filters.insert(key.into(), filter);
        self
    }

    pub fn sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = Some(key.into());
        self.direction = direction;
        self
    }
}

/// Apply the query to a list: search and every filter must match, then sort.
pub fn filter_and_sort(
    config: &EntityConfig,
    entities: &[Entity],
    query: &EntityQuery,
) -> Vec<Entity> {
    let mut matched: Vec<Entity> = entities
        .iter()
        .filter(|entity| matches_search(config, entity, query.search.as_deref()))
        .filter(|entity| {
            query
                .filters
                .iter()
                .all(|(key, filter)| matches_filter(entity, key, filter))
        })
        .cloned()
        .collect();

    if let Some(key) = &query.sort_key {
        sort_entities(&mut matched, key, query.direction);
    }
    matched
}

/// Case-insensitive substring search over the configured search fields.
/// List fields match when any element matches; a blank query matches all.
fn matches_search(config: &EntityConfig, entity: &Entity, search: Option<&str>) -> bool {
    let needle = match search {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => return true,
    };

    config.display.search_fields.iter().any(|key| {
        match entity.field(key) {
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| value::stringify(item).to_lowercase().contains(&needle)),
            Some(other) => value::stringify(other).to_lowercase().contains(&needle),
            None => false,
        }
    })
}

fn matches_filter(entity: &Entity, key: &str, filter: &FilterValue) -> bool {
    let field = match entity.field(key) {
        Some(value) => value,
        None => return false,
    };

    match filter {
        FilterValue::Select(expected) => value::stringify(field) == *expected,
        FilterValue::Multi(expected) => match field {
            Value::Array(items) => items.iter().any(|item| value::stringify(item) == *expected),
            other => value::stringify(other) == *expected,
        },
        FilterValue::Bool(expected) => value::truthy(field) == *expected,
        FilterValue::Range { min, max } => match value::try_number(field) {
            Some(n) => min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max),
            None => false,
        },
    }
}

fn sort_entities(entities: &mut [Entity], key: &str, direction: SortDirection) {
    entities.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Timestamps sort chronologically, numbers numerically, lists by length,
/// everything else as case-insensitive text.
fn compare(a: &Entity, b: &Entity, key: &str) -> Ordering {
    match key {
        "createdAt" => return a.created_at.cmp(&b.created_at),
        "updatedAt" => return a.updated_at.cmp(&b.updated_at),
        _ => {}
    }

    let left = a.field(key);
    let right = b.field(key);
    match (left, right) {
        (Some(Value::Number(_)), Some(Value::Number(_))) => {
            let left = left.and_then(value::try_number).unwrap_or(0.0);
            let right = right.and_then(value::try_number).unwrap_or(0.0);
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Array(left)), Some(Value::Array(right))) => left.len().cmp(&right.len()),
        _ => {
            let left = left.map(value::stringify).unwrap_or_default().to_lowercase();
            let right = right.map(value::stringify).unwrap_or_default().to_lowercase();
            left.cmp(&right)
        }
    }
}
