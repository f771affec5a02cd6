//! Ordered string properties attached to users and chats.
//!
//! A [`Properties`] bag is never edited in place: every change produces a new
//! bag. Staged edits go through [`MutableProperties`] and are frozen once done.

use serde::{Deserialize, Serialize};

/// A single `name = value` pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered, immutable sequence of properties.
///
/// Lookups scan in order and the first match wins, so a bag fetched from a
/// remote payload with duplicate names behaves predictably.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Copy of this bag with `name` set to `value`: the first existing
    /// occurrence is replaced, otherwise the property is appended.
    pub fn with_property(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut staged = self.to_mutable();
        staged.set_property(name, value);
        staged.freeze()
    }

    /// Copy of this bag with every occurrence of `name` dropped
    pub fn without_property(&self, name: &str) -> Self {
        let mut staged = self.to_mutable();
        staged.remove_property(name);
        staged.freeze()
    }

    pub fn to_mutable(&self) -> MutableProperties {
        MutableProperties(self.0.clone())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Property>> for Properties {
    fn from(properties: Vec<Property>) -> Self {
        Self(properties)
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Staging area for property edits before they are committed to an entity
#[derive(Debug, Clone, Default)]
pub struct MutableProperties(Vec<Property>);

impl MutableProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Property { name, value }),
        }
    }

    pub fn remove_property(&mut self, name: &str) {
        self.0.retain(|p| p.name != name);
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|p| p.name == name).map(|p| p.value.as_str())
    }

    pub fn freeze(self) -> Properties {
        Properties(self.0)
    }
}
