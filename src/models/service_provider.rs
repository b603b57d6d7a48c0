//! Defines the `ServiceProvider` entity.

use serde::{Deserialize, Serialize};

use crate::{
    entity::{Entity, EntityId, FieldValue, require},
    error::ValidationError,
};

/// A business that offers services through the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvider {
    /// The ID of the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The country the business is registered in.
    pub country: String,

    /// The business name. Older records call this `businessName`.
    #[serde(rename = "spName", alias = "businessName")]
    pub sp_name: String,

    /// The first line of the street address.
    #[serde(default)]
    pub address_line1: String,

    /// The second line of the street address.
    #[serde(default)]
    pub address_line2: String,

    /// The third line of the street address.
    #[serde(default)]
    pub address_line3: String,

    /// The city the business is located in.
    #[serde(default)]
    pub city: String,

    /// The state or province.
    #[serde(default)]
    pub state: String,

    /// The postal code.
    #[serde(default)]
    pub postal_code: String,
}

impl Entity for ServiceProvider {
    type Upstream = ServiceProvider;

    const STORAGE_KEY: &'static str = "serviceProviders";
    const PLURAL_NAME: &'static str = "service providers";

    fn from_upstream(upstream: ServiceProvider) -> Self {
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
            &self.country,
            &self.sp_name,
            &self.address_line1,
            &self.address_line2,
            &self.address_line3,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.as_ref().map(FieldValue::from),
            "country" => Some((&self.country).into()),
            "spName" | "businessName" => Some((&self.sp_name).into()),
            "addressLine1" => Some((&self.address_line1).into()),
            "addressLine2" => Some((&self.address_line2).into()),
            "addressLine3" => Some((&self.address_line3).into()),
            "city" => Some((&self.city).into()),
            "state" => Some((&self.state).into()),
            "postalCode" => Some((&self.postal_code).into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("business name", &self.sp_name)?;
        require("country", &self.country)?;
        require("city", &self.city)?;
        require("postal code", &self.postal_code)
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceProvider;
    use crate::{entity::Entity, error::ValidationError};

    #[test]
    fn accepts_legacy_business_name() {
        let provider: ServiceProvider = serde_json::from_str(
            r#"{
                "id": 3,
                "country": "India",
                "businessName": "Sharma Electricals",
                "addressLine1": "12 MG Road",
                "city": "Pune",
                "state": "Maharashtra",
                "postalCode": "411001"
            }"#,
        )
        .unwrap();

        assert_eq!(provider.sp_name, "Sharma Electricals");
        assert_eq!(provider.address_line2, "");

        let json = serde_json::to_value(&provider).unwrap();
        assert_eq!(json["spName"], "Sharma Electricals");
        assert!(json.get("businessName").is_none());
    }

    #[test]
    fn requires_business_name() {
        let provider = ServiceProvider {
            id: None,
            country: "India".to_owned(),
            sp_name: " ".to_owned(),
            address_line1: String::new(),
            address_line2: String::new(),
            address_line3: String::new(),
            city: "Pune".to_owned(),
            state: String::new(),
            postal_code: "411001".to_owned(),
        };

        assert_eq!(
            provider.validate(),
            Err(ValidationError::EmptyField("business name"))
        );
    }
}
