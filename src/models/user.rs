//! Defines the `User` entity and the upstream user record it is mapped from.

use serde::{Deserialize, Serialize};

use crate::{
    entity::{Entity, EntityId, FieldValue, require},
    error::ValidationError,
};

/// A user listed in the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The ID of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// The user's full name.
    pub name: String,

    /// The name of the company the user works for.
    #[serde(default)]
    pub company: String,

    /// The company tagline.
    #[serde(default)]
    pub bs: String,

    /// The user's website.
    #[serde(default)]
    pub website: String,
}

/// A user record as returned by the users API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamUser {
    /// The ID of the user.
    pub id: EntityId,
    /// The user's full name.
    pub name: String,
    /// The user's login handle.
    #[serde(default)]
    pub username: String,
    /// The user's email address.
    #[serde(default)]
    pub email: String,
    /// The user's website.
    #[serde(default)]
    pub website: String,
    /// The company the user works for.
    #[serde(default)]
    pub company: UpstreamCompany,
}

/// The company nested in an [UpstreamUser].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamCompany {
    /// The company name.
    #[serde(default)]
    pub name: String,
    /// The company slogan.
    #[serde(default, rename = "catchPhrase")]
    pub catch_phrase: String,
    /// The company tagline.
    #[serde(default)]
    pub bs: String,
}

impl Entity for User {
    type Upstream = UpstreamUser;

    const STORAGE_KEY: &'static str = "users";
    const PLURAL_NAME: &'static str = "users";

    fn from_upstream(upstream: UpstreamUser) -> Self {
        Self {
            id: Some(upstream.id),
            name: upstream.name,
            company: upstream.company.name,
            bs: upstream.company.bs,
            website: upstream.website,
        }
    }

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn text_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.company, &self.bs, &self.website]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.as_ref().map(FieldValue::from),
            "name" => Some((&self.name).into()),
            "company" => Some((&self.company).into()),
            "bs" => Some((&self.bs).into()),
            "website" => Some((&self.website).into()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{UpstreamUser, User};
    use crate::entity::{Entity, EntityId};

    #[test]
    fn maps_upstream_user_to_local_shape() {
        let upstream: UpstreamUser = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Leanne Graham",
                "username": "Bret",
                "email": "Sincere@april.biz",
                "address": { "city": "Gwenborough" },
                "website": "hildegard.org",
                "company": {
                    "name": "Romaguera-Crona",
                    "catchPhrase": "Multi-layered client-server neural-net",
                    "bs": "harness real-time e-markets"
                }
            }"#,
        )
        .unwrap();

        let user = User::from_upstream(upstream);

        assert_eq!(
            user,
            User {
                id: Some(EntityId::Int(1)),
                name: "Leanne Graham".to_owned(),
                company: "Romaguera-Crona".to_owned(),
                bs: "harness real-time e-markets".to_owned(),
                website: "hildegard.org".to_owned(),
            }
        );
    }

    #[test]
    fn searches_company_and_tagline() {
        let user = User {
            id: None,
            name: "Ervin Howell".to_owned(),
            company: "Deckow-Crist".to_owned(),
            bs: "synergize scalable supply-chains".to_owned(),
            website: "anastasia.net".to_owned(),
        };

        assert!(user.matches("deckow"));
        assert!(user.matches("supply"));
        assert!(!user.matches("romaguera"));
    }
}
