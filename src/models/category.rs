//! This file defines the `Category` and `Subcategory` entities.
//! A subcategory belongs to exactly one category and carries a copy of the
//! category's name for display.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    entity::{Entity, EntityId, FieldValue, require},
    error::ValidationError,
};

/// A category of services, e.g. 'Plumbing' or 'Electrical'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The display name of the category.
    pub name: String,

    /// The name of the icon shown next to the category.
    #[serde(default)]
    pub icon: String,

    /// A URL for the category's banner image.
    #[serde(default)]
    pub image_url: String,

    /// Free-form notes.
    #[serde(default)]
    pub comments: String,

    /// When the category was created.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,

    /// When the category was last changed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub modified_at: Option<OffsetDateTime>,
}

impl Entity for Category {
    type Upstream = Category;

    const STORAGE_KEY: &'static str = "categories";
    const PLURAL_NAME: &'static str = "categories";

    fn from_upstream(upstream: Category) -> Self {
        upstream
    }

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn text_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.icon, &self.image_url, &self.comments]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.as_ref().map(FieldValue::from),
            "name" => Some((&self.name).into()),
            "icon" => Some((&self.icon).into()),
            "imageUrl" => Some((&self.image_url).into()),
            "comments" => Some((&self.comments).into()),
            "createdAt" => self.created_at.map(timestamp_value),
            "modifiedAt" => self.modified_at.map(timestamp_value),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("category name", &self.name)
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn stamp_created(&mut self, now: OffsetDateTime) {
        self.created_at.get_or_insert(now);
    }

    fn stamp_modified(&mut self, now: OffsetDateTime) {
        self.modified_at = Some(now);
    }
}

/// A subcategory of a [Category], e.g. 'Tap Repair' under 'Plumbing'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    /// The ID of the subcategory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The display name of the subcategory.
    pub name: String,

    /// The name of the icon shown next to the subcategory.
    #[serde(default)]
    pub icon: String,

    /// A URL for the subcategory's banner image.
    #[serde(default)]
    pub image_url: String,

    /// Free-form notes.
    #[serde(default)]
    pub comments: String,

    /// When the subcategory was created.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,

    /// When the subcategory was last changed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub modified_at: Option<OffsetDateTime>,

    /// The ID of the parent category.
    #[serde(default)]
    pub category_id: Option<EntityId>,

    /// A copy of the parent category's name.
    #[serde(default, rename = "CategoryName")]
    pub category_name: String,
}

impl Subcategory {
    /// Copy the parent category's name from `categories` into
    /// [Subcategory::category_name].
    ///
    /// Returns `false` and leaves the name unchanged if the parent category
    /// is not in `categories`.
    pub fn fill_category_name(&mut self, categories: &[Category]) -> bool {
        let Some(category_id) = &self.category_id else {
            return false;
        };

        match categories
            .iter()
            .find(|category| category.id.as_ref() == Some(category_id))
        {
            Some(category) => {
                self.category_name = category.name.clone();
                true
            }
            None => false,
        }
    }
}

impl Entity for Subcategory {
    type Upstream = Subcategory;

    const STORAGE_KEY: &'static str = "subcategories";
    const PLURAL_NAME: &'static str = "subcategories";

    fn from_upstream(upstream: Subcategory) -> Self {
        upstream
    }

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn text_fields(&self) -> Vec<&str> {
        vec![
            &self.name,
            &self.icon,
            &self.image_url,
            &self.comments,
            &self.category_name,
        ]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.as_ref().map(FieldValue::from),
            "name" => Some((&self.name).into()),
            "icon" => Some((&self.icon).into()),
            "imageUrl" => Some((&self.image_url).into()),
            "comments" => Some((&self.comments).into()),
            "createdAt" => self.created_at.map(timestamp_value),
            "modifiedAt" => self.modified_at.map(timestamp_value),
            "categoryId" => self.category_id.as_ref().map(FieldValue::from),
            "CategoryName" | "categoryName" => Some((&self.category_name).into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("subcategory name", &self.name)?;

        if self.category_id.is_none() {
            return Err(ValidationError::MissingCategory);
        }

        Ok(())
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    fn stamp_created(&mut self, now: OffsetDateTime) {
        self.created_at.get_or_insert(now);
    }

    fn stamp_modified(&mut self, now: OffsetDateTime) {
        self.modified_at = Some(now);
    }
}

fn timestamp_value(timestamp: OffsetDateTime) -> FieldValue {
    FieldValue::Int(timestamp.unix_timestamp())
}
