//! Defines the `Pincode` entity: a post office and the postal code it serves.

use serde::{Deserialize, Serialize};

use crate::{
    entity::{Entity, EntityId, FieldValue, require},
    error::ValidationError,
};

/// A post office and its six digit postal index number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pincode {
    /// The ID of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The name of the post office.
    pub office_name: String,

    /// The six digit postal code.
    pub pincode: String,

    /// The district the post office is in.
    #[serde(default)]
    pub district_name: String,

    /// The administrative subdivision of the district.
    #[serde(default)]
    pub taluk: String,

    /// The state the post office is in.
    #[serde(default)]
    pub state_name: String,

    /// The city the post office serves.
    #[serde(default)]
    pub city: String,
}

impl Entity for Pincode {
    type Upstream = Pincode;

    const STORAGE_KEY: &'static str = "pincodes";
    const PLURAL_NAME: &'static str = "pincodes";

    fn from_upstream(upstream: Pincode) -> Self {
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
            &self.office_name,
            &self.pincode,
            &self.district_name,
            &self.taluk,
            &self.state_name,
            &self.city,
        ]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.as_ref().map(FieldValue::from),
            "officeName" => Some((&self.office_name).into()),
            "pincode" => Some((&self.pincode).into()),
            "districtName" => Some((&self.district_name).into()),
            "taluk" => Some((&self.taluk).into()),
            "stateName" => Some((&self.state_name).into()),
            "city" => Some((&self.city).into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("office name", &self.office_name)?;

        let pincode = self.pincode.trim();
        if pincode.len() != 6 || !pincode.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPincode(self.pincode.clone()));
        }

        require("district name", &self.district_name)?;
        require("state name", &self.state_name)
    }
}
