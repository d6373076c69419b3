// Field model
//
// Pure data contract shared by controllers, the engine, and both front-ends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Info,
    Text,
    Password,
    Email,
    Checkbox,
    Select,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Info => "info",
            FieldKind::Text => "text",
            FieldKind::Password => "password",
            FieldKind::Email => "email",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
        }
    }

    /// Info fields are display-only and never collected.
    pub fn is_input(&self) -> bool {
        !matches!(self, FieldKind::Info)
    }
}

/// Current scalar value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }

    /// Empty text (or `false`) counts as "not provided" for required-field checks.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(b) => !b,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(true) => f.write_str("yes"),
            FieldValue::Bool(false) => f.write_str("no"),
        }
    }
}

/// Values for one step, keyed by field key. Ordered so persisted blobs are stable.
pub type FieldValues = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    fn new(key: &str, kind: FieldKind, label: &str, value: FieldValue) -> Self {
        Self {
            key: key.to_string(),
            kind,
            label: label.to_string(),
            value,
            options: Vec::new(),
            required: false,
        }
    }

    pub fn info(key: &str, label: &str, text: &str) -> Self {
        Self::new(key, FieldKind::Info, label, FieldValue::text(text))
    }

    pub fn text(key: &str, label: &str, default: &str) -> Self {
        Self::new(key, FieldKind::Text, label, FieldValue::text(default))
    }

    pub fn password(key: &str, label: &str) -> Self {
        Self::new(key, FieldKind::Password, label, FieldValue::text(""))
    }

    pub fn email(key: &str, label: &str, default: &str) -> Self {
        Self::new(key, FieldKind::Email, label, FieldValue::text(default))
    }

    pub fn checkbox(key: &str, label: &str, default: bool) -> Self {
        Self::new(key, FieldKind::Checkbox, label, FieldValue::Bool(default))
    }

    pub fn select(key: &str, label: &str, options: &[&str], default: &str) -> Self {
        let mut field = Self::new(key, FieldKind::Select, label, FieldValue::text(default));
        field.options = options.iter().map(|o| o.to_string()).collect();
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Check the descriptor invariants: select needs options containing its value,
    /// checkbox carries a boolean, every other kind carries text.
    pub fn validate(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err("field key cannot be empty".to_string());
        }
        match self.kind {
            FieldKind::Select => {
                if self.options.is_empty() {
                    return Err(format!("select field '{}' has no options", self.key));
                }
                match self.value.as_text() {
                    Some(v) if self.options.iter().any(|o| o == v) => Ok(()),
                    _ => Err(format!(
                        "select field '{}' value '{}' is not one of its options",
                        self.key, self.value
                    )),
                }
            }
            FieldKind::Checkbox => match self.value {
                FieldValue::Bool(_) => Ok(()),
                FieldValue::Text(_) => Err(format!(
                    "checkbox field '{}' must carry a boolean value",
                    self.key
                )),
            },
            _ => match self.value {
                FieldValue::Text(_) => Ok(()),
                FieldValue::Bool(_) => Err(format!(
                    "{} field '{}' must carry a text value",
                    self.kind.as_str(),
                    self.key
                )),
            },
        }
    }
}

/// Check that keys are unique within a step and every descriptor is well-formed.
pub fn validate_fields(fields: &[FieldDescriptor]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        field.validate()?;
        if !seen.insert(field.key.as_str()) {
            return Err(format!("duplicate field key '{}'", field.key));
        }
    }
    Ok(())
}

/// Overlay saved values onto the controller's defaults. Saved values whose type does not
/// match the field kind (or select values no longer offered) are ignored.
pub fn merge_saved_values(fields: &mut [FieldDescriptor], saved: Option<&FieldValues>) {
    let Some(saved) = saved else {
        return;
    };
    for field in fields.iter_mut().filter(|f| f.kind.is_input()) {
        let Some(value) = saved.get(&field.key) else {
            continue;
        };
        let compatible = match (field.kind, value) {
            (FieldKind::Checkbox, FieldValue::Bool(_)) => true,
            (FieldKind::Select, FieldValue::Text(v)) => field.options.iter().any(|o| o == v),
            (FieldKind::Checkbox, _) | (FieldKind::Select, _) => false,
            (_, FieldValue::Text(_)) => true,
            _ => false,
        };
        if compatible {
            field.value = value.clone();
        }
    }
}
