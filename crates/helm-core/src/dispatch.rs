//! Cross-page dispatch and navigation tickets.
//!
//! The dispatcher routes an agent-requested intent either to the current
//! page's approval gate (local signal) or into a navigation ticket carrying
//! the intent name and arguments to the owning page as query parameters.

use crate::error::{CoreError, Result};
use crate::intent::Intent;
use crate::registry::IntentRegistry;
use crate::types::{ArgMap, Page};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;

/// Prefix for intent arguments carried in the destination URL query.
const ARG_PREFIX: &str = "arg.";

/// Encoded instruction to move to another page and optionally resume an
/// intent there.
///
/// Consumed exactly once by the destination page's mount; the console keys
/// consumption on the ticket id, so reprocessing an already-handled ticket
/// (e.g. a refresh re-delivering the same ticket) never re-triggers the
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationTicket {
    pub id: Uuid,
    pub target: Page,
    pub operation: Option<String>,
    pub args: ArgMap,
}

impl NavigationTicket {
    pub fn new(target: Page, operation: Option<String>, args: ArgMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            operation,
            args,
        }
    }

    /// A ticket that navigates without resuming any operation.
    pub fn navigate_only(target: Page) -> Self {
        Self::new(target, None, ArgMap::new())
    }

    /// Encode as a destination URL: path plus `operation=<name>` and
    /// `arg.<name>=<value>` query parameters. Absence of the `operation`
    /// parameter means "navigate only".
    pub fn to_url(&self) -> String {
        let path = self.target.path();
        let Some(operation) = &self.operation else {
            return path.to_string();
        };

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("operation", operation);
        for (name, value) in &self.args {
            query.append_pair(&format!("{ARG_PREFIX}{name}"), &query_value(value));
        }
        format!("{path}?{}", query.finish())
    }

    /// Parse a destination URL back into a ticket.
    ///
    /// Argument values come back as strings; booleans are re-read as the
    /// literals `true`/`false`. The parsed instance gets a fresh identity.
    pub fn from_url(input: &str) -> Result<Self> {
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, query),
            None => (input, ""),
        };

        let target = Page::from_path(path)
            .ok_or_else(|| CoreError::UnknownPage(path.to_string()))?;

        let mut operation = None;
        let mut args = ArgMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == "operation" {
                operation = Some(value.into_owned());
            } else if let Some(name) = key.strip_prefix(ARG_PREFIX) {
                let parsed = match value.as_ref() {
                    "true" => serde_json::Value::Bool(true),
                    "false" => serde_json::Value::Bool(false),
                    other => serde_json::Value::String(other.to_string()),
                };
                args.insert(name.to_string(), parsed);
            }
        }

        if operation.is_none() && !args.is_empty() {
            return Err(CoreError::InvalidTicket(format!(
                "arguments without an operation in `{input}`"
            )));
        }

        Ok(Self::new(target, operation, args))
    }
}

fn query_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Result of routing an agent-requested intent.
#[derive(Debug)]
pub enum Dispatch {
    /// The intent is unknown everywhere: no navigation, the caller resolves
    /// the agent outcome with "operation not available".
    Unavailable,
    /// The intent belongs to the current page: signal its approval gate
    /// directly. Never navigates.
    Local { intent: Intent, args: ArgMap },
    /// The intent belongs to a different page: navigate with a ticket.
    Navigate(NavigationTicket),
}

/// Routes intent invocations between pages.
pub struct Dispatcher {
    registry: IntentRegistry,
}

impl Dispatcher {
    pub fn new(registry: IntentRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `name` against the live registry and the static page
    /// catalogue, and decide between the local-signal and navigation paths.
    pub fn dispatch(&self, current_page: Page, name: &str, args: ArgMap) -> Dispatch {
        if let Some(intent) = self.registry.resolve(name) {
            if intent.owner_page == current_page {
                tracing::debug!("Dispatching {} locally on {}", name, current_page);
                return Dispatch::Local { intent, args };
            }
        }

        // Unmounted pages keep nothing in the registry; the static catalogue
        // names their operations.
        match Page::owner_of(name) {
            Some(owner) if owner != current_page => {
                let ticket = NavigationTicket::new(owner, Some(name.to_string()), args);
                tracing::info!(
                    "Dispatching {} to {} via navigation ({})",
                    name,
                    owner,
                    ticket.id
                );
                Dispatch::Navigate(ticket)
            }
            Some(_) | None => {
                tracing::warn!("Operation not available: {}", name);
                Dispatch::Unavailable
            }
        }
    }
}
