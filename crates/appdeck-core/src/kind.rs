//! Entity kinds managed by the app platform and their storage schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Every entity kind the storage layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    App,
    #[serde(rename = "app_action_button")]
    ActionButton,
    Webhook,
    CustomFieldSet,
    CustomFieldSetRelation,
    AclRole,
    AclResource,
    Integration,
}

/// A foreign-key style reference from one kind to its owner.
///
/// Rows whose `field` equals the id of a deleted owner are deleted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerReference {
    pub field: &'static str,
    pub owner: EntityKind,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::App,
        EntityKind::ActionButton,
        EntityKind::Webhook,
        EntityKind::CustomFieldSet,
        EntityKind::CustomFieldSetRelation,
        EntityKind::AclRole,
        EntityKind::AclResource,
        EntityKind::Integration,
    ];

    /// Returns the storage name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::App => "app",
            EntityKind::ActionButton => "app_action_button",
            EntityKind::Webhook => "webhook",
            EntityKind::CustomFieldSet => "custom_field_set",
            EntityKind::CustomFieldSetRelation => "custom_field_set_relation",
            EntityKind::AclRole => "acl_role",
            EntityKind::AclResource => "acl_resource",
            EntityKind::Integration => "integration",
        }
    }

    /// References that make rows of this kind owned by another row.
    pub fn owner_references(&self) -> &'static [OwnerReference] {
        const APP_OWNED: &[OwnerReference] = &[OwnerReference {
            field: "appId",
            owner: EntityKind::App,
        }];
        match self {
            EntityKind::ActionButton
            | EntityKind::Webhook
            | EntityKind::CustomFieldSet
            | EntityKind::AclRole
            | EntityKind::Integration => APP_OWNED,
            EntityKind::CustomFieldSetRelation => &[OwnerReference {
                field: "customFieldSetId",
                owner: EntityKind::CustomFieldSet,
            }],
            EntityKind::AclResource => &[OwnerReference {
                field: "aclRoleId",
                owner: EntityKind::AclRole,
            }],
            EntityKind::App => &[],
        }
    }

    /// Kinds whose rows reference this kind, paired with the referencing field.
    pub fn dependents(&self) -> impl Iterator<Item = (EntityKind, &'static str)> + '_ {
        EntityKind::ALL.into_iter().flat_map(move |kind| {
            kind.owner_references()
                .iter()
                .filter(move |r| r.owner == *self)
                .map(move |r| (kind, r.field))
        })
    }

    /// Fields whose values must be unique across all rows of this kind.
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::App => &["name"],
            _ => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::invalid_entity_kind(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("gadget".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_serde_name_matches_storage_name() {
        let json = serde_json::to_value(EntityKind::ActionButton).unwrap();
        assert_eq!(json, "app_action_button");
        let json = serde_json::to_value(EntityKind::CustomFieldSetRelation).unwrap();
        assert_eq!(json, "custom_field_set_relation");
    }

    #[test]
    fn test_app_dependents() {
        let dependents: Vec<_> = EntityKind::App.dependents().collect();
        assert_eq!(
            dependents,
            vec![
                (EntityKind::ActionButton, "appId"),
                (EntityKind::Webhook, "appId"),
                (EntityKind::CustomFieldSet, "appId"),
                (EntityKind::AclRole, "appId"),
                (EntityKind::Integration, "appId"),
            ]
        );
    }

    #[test]
    fn test_nested_dependents() {
        let set: Vec<_> = EntityKind::CustomFieldSet.dependents().collect();
        assert_eq!(set, vec![(EntityKind::CustomFieldSetRelation, "customFieldSetId")]);

        let role: Vec<_> = EntityKind::AclRole.dependents().collect();
        assert_eq!(role, vec![(EntityKind::AclResource, "aclRoleId")]);

        assert_eq!(EntityKind::Webhook.dependents().count(), 0);
    }

    #[test]
    fn test_unique_fields() {
        assert_eq!(EntityKind::App.unique_fields(), &["name"]);
        assert!(EntityKind::Webhook.unique_fields().is_empty());
    }
}
