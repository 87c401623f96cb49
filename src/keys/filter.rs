//! Filter normalization for query keys
//!
//! Filters are explicit structs with a known field set. Normalization lists the
//! set fields sorted by wire name, so two filters holding the same values
//! produce the same key regardless of how they were built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed filter that can be folded into a query key and a query string
pub trait QueryFilter {
    /// Every known field as `(wire name, value)`; `None` for unset fields
    fn fields(&self) -> Vec<(&'static str, Option<String>)>;

    /// Sorted, unset-free representation
    fn normalized(&self) -> NormalizedFilter {
        NormalizedFilter::from_fields(self.fields())
    }
}

/// Canonical form of a filter: set fields only, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedFilter(BTreeMap<String, String>);

impl NormalizedFilter {
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Option<String>)>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in fields {
            if let Some(value) = value {
                let previous = map.insert(name.to_string(), value);
                assert!(previous.is_none(), "filter field `{}` listed twice", name);
            }
        }
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Pairs in canonical order, ready for a URL query string
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl fmt::Display for NormalizedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&parts.join("&"))
    }
}

/// Render a set of strings order-independently (sorted, comma separated)
pub fn join_set<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut values: Vec<&String> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    values.sort();
    values.dedup();
    Some(
        values
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(","),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        status: Option<&'static str>,
        page: Option<u32>,
    }

    impl QueryFilter for Probe {
        fn fields(&self) -> Vec<(&'static str, Option<String>)> {
            vec![
                ("status", self.status.map(str::to_string)),
                ("page", self.page.map(|p| p.to_string())),
            ]
        }
    }

    #[test]
    fn test_fields_are_sorted() {
        let filter = Probe {
            status: Some("x"),
            page: Some(1),
        };
        let normalized = filter.normalized();
        assert_eq!(normalized.to_string(), "page=1&status=x");
        assert_eq!(
            normalized.to_query_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("status".to_string(), "x".to_string())
            ]
        );
    }

    #[test]
    fn test_unset_fields_dropped() {
        let filter = Probe {
            status: None,
            page: Some(4),
        };
        let normalized = filter.normalized();
        assert_eq!(normalized.get("page"), Some("4"));
        assert_eq!(normalized.get("status"), None);
        assert!(!normalized.is_empty());
    }

    #[test]
    fn test_join_set_is_order_independent() {
        let a = vec!["remote".to_string(), "math".to_string()];
        let b = vec!["math".to_string(), "remote".to_string(), "math".to_string()];
        assert_eq!(join_set(&a), join_set(&b));
        assert_eq!(join_set(&a).as_deref(), Some("math,remote"));
        assert_eq!(join_set(&Vec::<String>::new()), None);
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn test_duplicate_field_panics() {
        let _ = NormalizedFilter::from_fields(vec![
            ("page", Some("1".to_string())),
            ("page", Some("2".to_string())),
        ]);
    }
}
