//! Keyed resource collections.
//!
//! One [`ResourceStore`] per resource type. Stores preserve insertion order
//! so list results come back in the order resources were created, and know
//! nothing about other resource types; cross-resource invariants live in
//! [`crate::state`].

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Exact-match list filters: serialized field name to expected JSON value.
pub type Filters = Map<String, Value>;

/// A resource that can be kept in a [`ResourceStore`].
pub trait Resource: Clone + Serialize + DeserializeOwned {
    /// Lower-case type name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn name(&self) -> &str;
}

/// Insertion-ordered store of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceStore<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Resource> ResourceStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    /// Insert a new resource or replace an existing one in place.
    pub fn insert(&mut self, item: T) {
        self.items.insert(item.id().to_string(), item);
    }

    /// Remove a resource, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.items.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// First resource (in insertion order) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.items.values().find(|item| item.name() == name)
    }

    /// Every resource matching all `filters`, in insertion order.
    pub fn list(&self, filters: &Filters) -> Vec<T> {
        self.items
            .values()
            .filter(|item| matches_filters(*item, filters))
            .cloned()
            .collect()
    }
}

fn matches_filters<T: Serialize>(item: &T, filters: &Filters) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Ok(Value::Object(fields)) = serde_json::to_value(item) else {
        return false;
    };
    filters
        .iter()
        .all(|(key, expected)| fields.get(key) == Some(expected))
}
