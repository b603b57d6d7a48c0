//! Defines the [Entity] trait implemented by every record type the stores manage.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;

use crate::error::ValidationError;

/// The ID of an entity.
///
/// Upstream APIs use both integer and string IDs, so both are accepted and
/// serialized back in the same form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// An integer ID, e.g. a row ID or a millisecond timestamp.
    Int(i64),
    /// A string ID, e.g. a UUID.
    Text(String),
}

impl EntityId {
    /// The integer value of the ID, if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EntityId::Int(id) => Some(*id),
            EntityId::Text(_) => None,
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_owned())
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    /// Parses integers as [EntityId::Int] and anything else as [EntityId::Text].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim()
            .parse::<i64>()
            .map(EntityId::Int)
            .unwrap_or_else(|_| EntityId::Text(s.trim().to_owned())))
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{id}"),
            EntityId::Text(id) => write!(f, "{id}"),
        }
    }
}

/// The value of a sortable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text, compared case-insensitively.
    Text(String),
    /// An integer, compared numerically.
    Int(i64),
}

impl FieldValue {
    /// Compare two field values for sorting.
    ///
    /// Integers compare numerically and text compares case-insensitively,
    /// falling back to a case-sensitive comparison so the order is total.
    /// Mixed integer and text values compare as text.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Int(left), FieldValue::Int(right)) => left.cmp(right),
            (left, right) => {
                let left = left.as_text();
                let right = right.as_text();

                left.to_lowercase()
                    .cmp(&right.to_lowercase())
                    .then_with(|| left.cmp(&right))
            }
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Int(number) => number.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<&EntityId> for FieldValue {
    fn from(value: &EntityId) -> Self {
        match value {
            EntityId::Int(id) => FieldValue::Int(*id),
            EntityId::Text(id) => FieldValue::Text(id.clone()),
        }
    }
}

/// A record of a managed resource type, e.g. a user or a pincode.
pub trait Entity:
    Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The record shape returned by the remote API.
    type Upstream: DeserializeOwned + Send;

    /// The key the collection snapshot is stored under, e.g. "pincodes".
    const STORAGE_KEY: &'static str;

    /// The collection name used in user-facing messages, e.g. "pincodes".
    const PLURAL_NAME: &'static str;

    /// Map a record from the remote API into the local shape.
    fn from_upstream(upstream: Self::Upstream) -> Self;

    /// The ID of the entity, if one has been assigned.
    fn id(&self) -> Option<&EntityId>;

    /// Assign an ID to the entity.
    fn set_id(&mut self, id: EntityId);

    /// The text fields that a search query is matched against.
    fn text_fields(&self) -> Vec<&str>;

    /// The value of the field named `field`, using the wire (camelCase) name.
    ///
    /// Returns `None` for unknown fields and for empty optional fields.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] describing the first field that failed.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// When the entity was created, for entity types that track it.
    fn created_at(&self) -> Option<OffsetDateTime> {
        None
    }

    /// Record the creation time. Called when the entity is added.
    fn stamp_created(&mut self, _now: OffsetDateTime) {}

    /// Record the modification time. Called when the entity is added or updated.
    fn stamp_modified(&mut self, _now: OffsetDateTime) {}

    /// Whether any text field contains `needle`.
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self
                .text_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Return [ValidationError::EmptyField] if `value` is empty or only whitespace.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{EntityId, FieldValue, require};
    use crate::error::ValidationError;

    #[test]
    fn ids_keep_their_json_form() {
        let int_id: EntityId = serde_json::from_str("42").unwrap();
        let text_id: EntityId = serde_json::from_str("\"abc\"").unwrap();

        assert_eq!(int_id, EntityId::Int(42));
        assert_eq!(text_id, EntityId::Text("abc".to_owned()));
        assert_eq!(serde_json::to_string(&int_id).unwrap(), "42");
        assert_eq!(serde_json::to_string(&text_id).unwrap(), "\"abc\"");
    }

    #[test]
    fn ids_parse_from_strings() {
        assert_eq!("7".parse::<EntityId>().unwrap(), EntityId::Int(7));
        assert_eq!(
            "sp-1".parse::<EntityId>().unwrap(),
            EntityId::Text("sp-1".to_owned())
        );
    }

    #[test]
    fn text_compares_case_insensitively() {
        let apple = FieldValue::from("apple");
        let banana = FieldValue::from("Banana");

        assert_eq!(apple.compare(&banana), Ordering::Less);
    }

    #[test]
    fn integers_compare_numerically() {
        assert_eq!(
            FieldValue::Int(9).compare(&FieldValue::Int(10)),
            Ordering::Less
        );
    }

    #[test]
    fn require_rejects_whitespace() {
        assert_eq!(
            require("name", "   "),
            Err(ValidationError::EmptyField("name"))
        );
        assert_eq!(require("name", "Office"), Ok(()));
    }
}
