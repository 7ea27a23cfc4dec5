//! Declarative adapter setting schemas.
//!
//! Every provider adapter publishes an `API_SETTINGS` table built from these
//! types. The table does two jobs: it renders the settings UI, and it is the
//! single source of truth for every numeric/string default an adapter falls
//! back to when a request omits a setting.

use serde::{Deserialize, Serialize};

/// What kind of control a setting renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Text,
    Number,
    Toggle,
    Select,
}

/// One selectable choice for a [`SettingKind::Select`] setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingChoice {
    pub value: &'static str,
    pub label: &'static str,
}

/// One row of an adapter's `API_SETTINGS` table.
#[derive(Debug, Clone, Serialize)]
pub struct SettingSchema {
    /// Settings key, matching the `GenerationSettings` field name.
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: SettingKind,

    /// Default value, rendered and consumed as JSON.
    pub default: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SettingChoice>,
}

impl SettingSchema {
    pub fn number(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            key,
            title,
            description,
            kind: SettingKind::Number,
            default: serde_json::json!(default),
            min: Some(min),
            max: Some(max),
            choices: Vec::new(),
        }
    }

    pub fn text(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            key,
            title,
            description,
            kind: SettingKind::Text,
            default: serde_json::json!(default),
            min: None,
            max: None,
            choices: Vec::new(),
        }
    }

    pub fn toggle(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        default: bool,
    ) -> Self {
        Self {
            key,
            title,
            description,
            kind: SettingKind::Toggle,
            default: serde_json::json!(default),
            min: None,
            max: None,
            choices: Vec::new(),
        }
    }

    pub fn select(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        default: &'static str,
        choices: Vec<SettingChoice>,
    ) -> Self {
        Self {
            key,
            title,
            description,
            kind: SettingKind::Select,
            default: serde_json::json!(default),
            min: None,
            max: None,
            choices,
        }
    }

    /// The default as `f64`, for numeric settings.
    pub fn default_f64(&self) -> f64 {
        self.default.as_f64().unwrap_or(0.0)
    }

    /// The default as `&str`, for text/select settings.
    pub fn default_str(&self) -> &str {
        self.default.as_str().unwrap_or("")
    }
}

/// Find a schema row by key.
pub fn find<'a>(table: &'a [SettingSchema], key: &str) -> Option<&'a SettingSchema> {
    table.iter().find(|s| s.key == key)
}
