//! Privilege derivation for an app's ACL role.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::entities::AclResourceEntity;
use crate::manifest::{Manifest, Permission};

/// How existing privileges on an app's role are treated on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegePolicy {
    /// The role holds exactly the derived privileges afterwards.
    #[default]
    Exact,
    /// Rows on resources the derived set never mentions are kept.
    PreserveUnrelated,
}

impl std::str::FromStr for PrivilegePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "preserve_unrelated" => Ok(Self::PreserveUnrelated),
            other => Err(format!(
                "unknown privilege policy '{other}', expected exact or preserve_unrelated"
            )),
        }
    }
}

/// Declared permissions plus those implied by action buttons.
///
/// Every action button grants `implied` privileges on its entity. The result
/// is deduplicated and keeps first-seen order.
pub fn derive_privileges(manifest: &Manifest, implied: &[String]) -> IndexSet<Permission> {
    let mut privileges: IndexSet<Permission> = manifest.permissions.iter().cloned().collect();
    for button in &manifest.action_buttons {
        for privilege in implied {
            privileges.insert(Permission::new(&button.entity, privilege));
        }
    }
    privileges
}

/// Drops stale rows the policy says must survive.
pub fn retain_deletable(
    stale: Vec<AclResourceEntity>,
    derived: &IndexSet<Permission>,
    policy: PrivilegePolicy,
) -> Vec<AclResourceEntity> {
    match policy {
        PrivilegePolicy::Exact => stale,
        PrivilegePolicy::PreserveUnrelated => {
            let related: HashSet<&str> = derived.iter().map(|p| p.resource.as_str()).collect();
            stale
                .into_iter()
                .filter(|row| related.contains(row.resource.as_str()))
                .collect()
        }
    }
}
