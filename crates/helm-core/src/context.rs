//! Readable context exposed to the agent.
//!
//! The assistant runtime consults this snapshot to decide whether an
//! operation needs cross-page dispatch: it names the current user, the
//! current page, and the operations available per page.

use crate::registry::IntentRegistry;
use crate::types::{CurrentUser, Page};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of everything the agent may read about the console.
#[derive(Debug, Clone, Serialize)]
pub struct AgentContext {
    /// The current user logged into the system.
    pub current_user: CurrentUser,

    /// The page currently displayed.
    pub current_page: Page,

    /// All navigable pages.
    pub pages: Vec<Page>,

    /// Operation names available per page, keyed by page path.
    pub operations: BTreeMap<String, Vec<String>>,

    /// Full advertisements for the intents registered on the current page.
    pub intents: Vec<serde_json::Value>,
}

impl AgentContext {
    /// Build the readable from injected state. The operations map comes from
    /// the static page catalogue; the intent advertisements come from the
    /// live registry (current page only).
    pub fn build(user: &CurrentUser, current_page: Page, registry: &IntentRegistry) -> Self {
        let operations = Page::ALL
            .iter()
            .map(|page| {
                (
                    page.path().to_string(),
                    page.operations().iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();

        Self {
            current_user: user.clone(),
            current_page,
            pages: Page::ALL.to_vec(),
            operations,
            intents: registry
                .list_for_page(current_page)
                .iter()
                .map(|intent| intent.advertisement())
                .collect(),
        }
    }

    /// Serialize for the assistant runtime.
    pub fn readable(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
