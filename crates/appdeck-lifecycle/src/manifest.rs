//! Manifest model: the parsed desired state of one app.
//!
//! Parsing the manifest source format happens elsewhere; this module only
//! defines the model, its JSON shape (camelCase) and structural validation.

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Locale used when a label is given as a plain string.
pub const DEFAULT_LOCALE: &str = "en-GB";

/// A label translated per locale, in declaration order.
///
/// Deserializes from either a locale map or a plain string, the latter
/// being stored under [`DEFAULT_LOCALE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocalizedRepr")]
pub struct LocalizedString(IndexMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr {
    Plain(String),
    Map(IndexMap<String, String>),
}

impl From<LocalizedRepr> for LocalizedString {
    fn from(repr: LocalizedRepr) -> Self {
        match repr {
            LocalizedRepr::Plain(value) => Self::plain(value),
            LocalizedRepr::Map(map) => Self(map),
        }
    }
}

impl LocalizedString {
    /// A label with only the default locale.
    pub fn plain(value: impl Into<String>) -> Self {
        Self(IndexMap::from([(DEFAULT_LOCALE.to_string(), value.into())]))
    }

    /// Adds or replaces a translation.
    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(locale.into(), value.into());
        self
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// The default-locale value, falling back to the first translation.
    pub fn display(&self) -> &str {
        self.get(DEFAULT_LOCALE)
            .or_else(|| self.0.values().next().map(String::as_str))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

/// Base64 transport for binary icons.
mod icon_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(icon: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match icon {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub label: LocalizedString,
    #[serde(default, with = "icon_base64", skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub action_buttons: Vec<ActionButtonDecl>,
    #[serde(default)]
    pub webhooks: Vec<WebhookDecl>,
    #[serde(default)]
    pub custom_field_sets: Vec<CustomFieldSetDecl>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationDecl>,
}

/// Admin module embedded in the app row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    pub source: String,
    pub label: LocalizedString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButtonDecl {
    pub entity: String,
    pub view: String,
    pub action: String,
    pub label: LocalizedString,
    pub url: String,
    #[serde(default)]
    pub open_new_tab: bool,
}

impl ActionButtonDecl {
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.entity, &self.view, &self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDecl {
    pub name: String,
    pub url: String,
    pub event_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldSetDecl {
    pub name: String,
    /// Label map plus flags such as `translated`.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Entity names the set is attached to, e.g. `product`.
    #[serde(default)]
    pub relations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub resource: String,
    pub privilege: String,
}

impl Permission {
    pub fn new(resource: impl Into<String>, privilege: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            privilege: privilege.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDecl {
    pub label: String,
    #[serde(default)]
    pub write_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl Manifest {
    /// Minimal manifest with identity fields only.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: LocalizedString::plain(name.clone()),
            name,
            version: version.into(),
            icon: None,
            path: String::new(),
            modules: Vec::new(),
            action_buttons: Vec::new(),
            webhooks: Vec::new(),
            custom_field_sets: Vec::new(),
            permissions: Vec::new(),
            integration: None,
        }
    }

    /// Parses a manifest from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, LifecycleError> {
        serde_json::from_str(raw).map_err(|e| LifecycleError::validation(e.to_string()))
    }

    /// Checks required fields and rejects duplicate natural keys.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        require("name", &self.name)?;
        require("version", &self.version)?;
        if self.name.chars().any(char::is_whitespace) {
            return Err(LifecycleError::validation(format!(
                "app name '{}' must not contain whitespace",
                self.name
            )));
        }

        for module in &self.modules {
            require("modules[].name", &module.name)?;
            require("modules[].source", &module.source)?;
        }
        unique("module", self.modules.iter().map(|m| m.name.as_str()))?;

        for button in &self.action_buttons {
            require("actionButtons[].entity", &button.entity)?;
            require("actionButtons[].view", &button.view)?;
            require("actionButtons[].action", &button.action)?;
            require("actionButtons[].url", &button.url)?;
        }
        unique(
            "action button",
            self.action_buttons.iter().map(ActionButtonDecl::key),
        )?;

        for webhook in &self.webhooks {
            require("webhooks[].name", &webhook.name)?;
            require("webhooks[].url", &webhook.url)?;
            require("webhooks[].eventName", &webhook.event_name)?;
        }
        unique("webhook", self.webhooks.iter().map(|w| w.name.as_str()))?;

        for set in &self.custom_field_sets {
            require("customFieldSets[].name", &set.name)?;
            unique(
                &format!("relation of custom field set '{}'", set.name),
                set.relations.iter().map(String::as_str),
            )?;
        }
        unique(
            "custom field set",
            self.custom_field_sets.iter().map(|s| s.name.as_str()),
        )?;

        for permission in &self.permissions {
            require("permissions[].resource", &permission.resource)?;
            require("permissions[].privilege", &permission.privilege)?;
        }

        if let Some(integration) = &self.integration {
            require("integration.label", &integration.label)?;
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), LifecycleError> {
    if value.trim().is_empty() {
        return Err(LifecycleError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn unique<K, I>(what: &str, keys: I) -> Result<(), LifecycleError>
where
    K: Eq + Hash + std::fmt::Debug,
    I: IntoIterator<Item = K>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if let Some(dup) = seen.replace(key) {
            return Err(LifecycleError::validation(format!(
                "duplicate {what}: {dup:?}"
            )));
        }
    }
    Ok(())
}
