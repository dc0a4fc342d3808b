//! # Attribute Storage
//!
//! A model's state is a single record of type `T`. The [`Data`] trait is the
//! state-container capability a [`Model`](crate::model::Model) is composed
//! with; [`Attributes`] is the plain in-memory implementation.
//!
//! ## Merge Semantics
//!
//! `set` is a shallow merge, driven by [`Record::merge`]: keys present in the
//! update overwrite, keys absent from it are preserved. For serde records
//! "absent" means a field that serializes to `null`, which is what `None`
//! fields do, so a field cannot be cleared through `set`. No validation of
//! the update happens beyond its type.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A record type models can hold and sync.
pub trait Record: Serialize + DeserializeOwned + Clone + 'static {
    /// The server-assigned identifier, if the record has one.
    fn id(&self) -> Option<u64>;

    /// Shallow-merges `update` into `self`. On error `self` is unchanged.
    ///
    /// The default goes through JSON: every top-level key of `update` whose
    /// value is not `null` replaces the same key of `self`. Records that are
    /// not JSON objects are replaced wholesale. Override for a cheaper or
    /// different policy.
    fn merge(&mut self, update: Self) -> Result<()> {
        *self = merge_json(self, &update)?;
        Ok(())
    }
}

fn merge_json<T: Record>(current: &T, update: &T) -> serde_json::Result<T> {
    let base = serde_json::to_value(current)?;
    let patch = serde_json::to_value(update)?;

    let merged = match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                if !value.is_null() {
                    base.insert(key, value);
                }
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    };
    serde_json::from_value(merged)
}

/// Untyped records: the identifier is an unsigned integer `"id"` key.
impl Record for Map<String, Value> {
    fn id(&self) -> Option<u64> {
        self.get("id").and_then(Value::as_u64)
    }

    fn merge(&mut self, update: Self) -> Result<()> {
        for (key, value) in update {
            if !value.is_null() {
                self.insert(key, value);
            }
        }
        Ok(())
    }
}

/// Abstract interface for a model's state container.
pub trait Data<T> {
    /// The live record. Not a copy: mutate only through [`Data::set`].
    fn get_all(&self) -> &T;

    /// Merges `update` into the record, leaving it unchanged on error.
    fn set(&mut self, update: T) -> Result<()>;
}

/// The default [`Data`] implementation: the record, held in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes<T> {
    data: T,
}

impl<T: Record> Attributes<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Reads one attribute, selected by a field accessor.
    ///
    /// ```rust
    /// # use tether::attributes::Attributes;
    /// # use serde_json::json;
    /// let attrs = Attributes::new(json!({ "name": "Ada" }).as_object().cloned().unwrap());
    /// assert_eq!(attrs.get(|r| &r["name"]), &json!("Ada"));
    /// ```
    pub fn get<V>(&self, field: impl FnOnce(&T) -> &V) -> &V {
        field(&self.data)
    }
}

impl<T: Record> Data<T> for Attributes<T> {
    fn get_all(&self) -> &T {
        &self.data
    }

    fn set(&mut self, update: T) -> Result<()> {
        self.data.merge(update)
    }
}
