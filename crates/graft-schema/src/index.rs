//! Registry index definition and JSON parsing.
//!
//! On the wire the index is an ordered JSON array of [`RegistryItem`]
//! records. In memory it is kept twice: in publication order, and as a
//! name-keyed map built once at parse time so every lookup is a typed
//! `Option` rather than a stringly-typed probe.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{ItemError, ItemName, RegistryItem};

/// Errors produced while building a [`RegistryIndex`].
#[derive(Error, Debug)]
pub enum IndexError {
    /// The document is not valid JSON or a record is missing a required field.
    #[error("Malformed index: {0}")]
    Json(#[from] serde_json::Error),

    /// Two records share the same name.
    #[error("Duplicate item name in index: {0}")]
    DuplicateName(ItemName),

    /// A record violates an item invariant.
    #[error("Invalid item: {0}")]
    Item(#[from] ItemError),
}

/// The parsed registry index.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    items: Vec<RegistryItem>,
    by_name: BTreeMap<ItemName, usize>,
}

impl RegistryIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an index document.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Json`] if the document is malformed or a record
    /// lacks `name` or `files`, and the other variants when a record breaks
    /// an index invariant.
    pub fn from_json(data: &str) -> Result<Self, IndexError> {
        let items: Vec<RegistryItem> = serde_json::from_str(data)?;
        Self::from_items(items)
    }

    /// Build an index from already-deserialized items.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateName`] when two items share a name and
    /// [`IndexError::Item`] when an item fails validation.
    pub fn from_items(items: Vec<RegistryItem>) -> Result<Self, IndexError> {
        let mut by_name = BTreeMap::new();
        for (pos, item) in items.iter().enumerate() {
            item.validate()?;
            if by_name.insert(item.name.clone(), pos).is_some() {
                return Err(IndexError::DuplicateName(item.name.clone()));
            }
        }
        Ok(Self { items, by_name })
    }

    /// Find an item by name - O(log n)
    pub fn find(&self, name: &str) -> Option<&RegistryItem> {
        let name = ItemName::new(name);
        self.by_name.get(&name).map(|&pos| &self.items[pos])
    }

    /// Returns true if an item with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Items in publication order.
    pub fn items(&self) -> &[RegistryItem] {
        &self.items
    }

    /// Items sorted by name, for deterministic display.
    pub fn sorted(&self) -> Vec<&RegistryItem> {
        self.by_name.values().map(|&pos| &self.items[pos]).collect()
    }

    /// All item names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &ItemName> {
        self.by_name.keys()
    }

    /// Number of items in the index.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the index has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Search items by query (matches name, title or description) - O(n) scan
    pub fn search(&self, query: &str) -> Vec<&RegistryItem> {
        let query_lower = query.to_lowercase();
        self.sorted()
            .into_iter()
            .filter(|item| {
                item.name.contains(&query_lower)
                    || item.title.to_lowercase().contains(&query_lower)
                    || item.description.to_lowercase().contains(&query_lower)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "name": "button",
            "type": "primitive",
            "title": "Button",
            "description": "Clickable action",
            "files": ["components/ui/button.tsx"],
            "dependencies": ["icon-frame"]
        },
        {
            "name": "icon-frame",
            "title": "Icon Frame",
            "description": "Square icon wrapper",
            "files": ["components/ui/icon-frame.tsx"]
        }
    ]"#;

    #[test]
    fn parses_and_finds() {
        let index = RegistryIndex::from_json(SAMPLE).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("button"));
        assert!(index.contains("ICON-FRAME"));
        assert!(index.find("card").is_none());

        let button = index.find("button").unwrap();
        assert_eq!(button.dependencies, vec![ItemName::new("icon-frame")]);
    }

    #[test]
    fn keeps_publication_order_and_sorts_on_request() {
        let json = r#"[
            { "name": "zeta", "files": ["z.tsx"] },
            { "name": "alpha", "files": ["a.tsx"] }
        ]"#;
        let index = RegistryIndex::from_json(json).unwrap();

        let published: Vec<&str> = index.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(published, vec!["zeta", "alpha"]);

        let sorted: Vec<&str> = index.sorted().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(sorted, vec!["alpha", "zeta"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let json = r#"[
            { "name": "button", "files": ["a.tsx"] },
            { "name": "Button", "files": ["b.tsx"] }
        ]"#;
        let err = RegistryIndex::from_json(json).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateName(name) if name == "button"));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let json = r#"[{ "name": "loop", "files": ["l.tsx"], "dependencies": ["loop"] }]"#;
        let err = RegistryIndex::from_json(json).unwrap_err();
        assert!(matches!(err, IndexError::Item(ItemError::SelfDependency(_))));
    }

    #[test]
    fn missing_required_fields_fail_parsing() {
        assert!(matches!(
            RegistryIndex::from_json(r#"[{ "files": ["a.tsx"] }]"#),
            Err(IndexError::Json(_))
        ));
        assert!(matches!(
            RegistryIndex::from_json(r#"[{ "name": "a" }]"#),
            Err(IndexError::Json(_))
        ));
        assert!(matches!(
            RegistryIndex::from_json("{ not json"),
            Err(IndexError::Json(_))
        ));
    }

    #[test]
    fn search_matches_title_and_description() {
        let index = RegistryIndex::from_json(SAMPLE).unwrap();
        let hits = index.search("wrapper");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "icon-frame");
        assert_eq!(index.search("BUTTON").len(), 1);
    }
}
