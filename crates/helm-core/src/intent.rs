//! Intent definitions: named, parameterized operations an agent may request.

use crate::types::{arg_missing, ArgMap, Page};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parameter value kind, as exposed over the agent tool-invocation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Boolean,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKind::String => write!(f, "string"),
            ParamKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One entry of an intent's ordered parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParamKind,

    pub required: bool,

    pub description: String,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// A named, parameterized operation an agent may request on a page.
///
/// Intents are registered at page mount, owned by the registering page, and
/// unregistered at page unmount. They are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique per process.
    pub name: String,

    /// The page that owns (and registered) this intent.
    pub owner_page: Page,

    /// Human/agent-readable description.
    pub description: String,

    /// Ordered parameter schema.
    pub parameters: Vec<ParameterSpec>,

    /// Whether the agent should follow up after the outcome.
    pub follow_up: bool,
}

impl Intent {
    pub fn new(name: impl Into<String>, owner_page: Page) -> Self {
        Self {
            name: name.into(),
            owner_page,
            description: String::new(),
            parameters: Vec::new(),
            follow_up: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_follow_up(mut self, follow_up: bool) -> Self {
        self.follow_up = follow_up;
        self
    }

    /// First duplicated parameter name, if the schema is invalid.
    pub fn duplicate_param(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.parameters
            .iter()
            .find(|p| !seen.insert(p.name.as_str()))
            .map(|p| p.name.as_str())
    }

    /// Names of required parameters that are absent (or empty) in `args`.
    pub fn missing_required(&self, args: &ArgMap) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required && arg_missing(args, &p.name))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// The advertisement handed to the assistant runtime:
    /// `{name, description, parameters: [{name, type, required, description}], followUp}`.
    pub fn advertisement(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
            "followUp": self.follow_up,
        })
    }
}
