//! Typed views of the rows owned by an app.
//!
//! Each struct mirrors the camelCase JSON stored for its [`EntityKind`]. The
//! `id` is `None` until the row is created, unless the caller pre-assigns it.

use appdeck_core::EntityKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::manifest::{LocalizedString, Module};

/// A typed row of one entity kind.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);
}

macro_rules! entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: Option<String>) {
                self.id = id;
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub version: String,
    pub label: LocalizedString,
    /// Base64 encoded icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub path: String,
    pub access_token: String,
    pub acl_role_id: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl AppEntity {
    /// The id of a persisted app. Empty for an unsaved row.
    pub fn app_id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButtonEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub app_id: String,
    pub entity: String,
    pub view: String,
    pub action: String,
    pub label: LocalizedString,
    pub url: String,
    #[serde(default)]
    pub open_new_tab: bool,
}

impl ActionButtonEntity {
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.entity, &self.view, &self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub app_id: String,
    pub name: String,
    pub event_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldSetEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub app_id: String,
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldSetRelationEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub custom_field_set_id: String,
    pub entity_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclRoleEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub app_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclResourceEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub acl_role_id: String,
    pub resource: String,
    pub privilege: String,
}

impl AclResourceEntity {
    pub fn key(&self) -> (&str, &str) {
        (&self.resource, &self.privilege)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub app_id: String,
    pub label: String,
    pub access_key: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub write_access: bool,
}

entity!(AppEntity, EntityKind::App);
entity!(ActionButtonEntity, EntityKind::ActionButton);
entity!(WebhookEntity, EntityKind::Webhook);
entity!(CustomFieldSetEntity, EntityKind::CustomFieldSet);
entity!(CustomFieldSetRelationEntity, EntityKind::CustomFieldSetRelation);
entity!(AclRoleEntity, EntityKind::AclRole);
entity!(AclResourceEntity, EntityKind::AclResource);
entity!(IntegrationEntity, EntityKind::Integration);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_json_shape() {
        let webhook = WebhookEntity {
            id: None,
            app_id: "a1".into(),
            name: "hook".into(),
            event_name: "checkout.order.placed".into(),
            url: "https://test.com/hook".into(),
        };

        let json = serde_json::to_value(&webhook).unwrap();
        assert_eq!(
            json,
            json!({
                "appId": "a1",
                "name": "hook",
                "eventName": "checkout.order.placed",
                "url": "https://test.com/hook"
            })
        );
        assert_eq!(WebhookEntity::KIND, EntityKind::Webhook);
    }

    #[test]
    fn test_owner_field_matches_schema() {
        // The owner fields written here drive cascading deletes in storage
        let relation = serde_json::to_value(CustomFieldSetRelationEntity {
            id: None,
            custom_field_set_id: "s1".into(),
            entity_name: "product".into(),
        })
        .unwrap();
        let reference = EntityKind::CustomFieldSetRelation.owner_references()[0];
        assert_eq!(relation[reference.field], "s1");

        let role = serde_json::to_value(AclRoleEntity {
            id: Some("r1".into()),
            app_id: "a1".into(),
            name: "SwagApp".into(),
        })
        .unwrap();
        assert_eq!(role[EntityKind::AclRole.owner_references()[0].field], "a1");
    }
}
