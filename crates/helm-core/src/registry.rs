//! Intent registry: the process-wide catalogue of page-local intents.

use crate::error::{CoreError, Result};
use crate::intent::Intent;
use crate::types::Page;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of the intents currently available to the agent.
///
/// Registration and unregistration happen only on page mount/unmount
/// transitions; navigation always unmounts the previous page before mounting
/// the next, so a name is never re-registered while a proposal for it is
/// pending.
#[derive(Clone)]
pub struct IntentRegistry {
    intents: Arc<RwLock<HashMap<String, Intent>>>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self {
            intents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an intent, replacing any previous registration of the same
    /// name. Rejects schemas with duplicate parameter names; that is a
    /// configuration error for the caller to log, not surface.
    pub fn register(&self, intent: Intent) -> Result<()> {
        if let Some(dup) = intent.duplicate_param() {
            return Err(CoreError::Configuration(format!(
                "duplicate parameter `{dup}` on intent `{}`",
                intent.name
            )));
        }

        let name = intent.name.clone();
        self.intents.write().insert(name.clone(), intent);
        tracing::info!("Intent registered: {}", name);
        Ok(())
    }

    /// Unregister an intent by name. Idempotent.
    pub fn unregister(&self, name: &str) {
        if self.intents.write().remove(name).is_some() {
            tracing::info!("Intent unregistered: {}", name);
        }
    }

    /// Resolve an intent by name.
    pub fn resolve(&self, name: &str) -> Option<Intent> {
        self.intents.read().get(name).cloned()
    }

    /// The intents registered for a page, sorted by name for a deterministic
    /// advertisement order.
    pub fn list_for_page(&self, page: Page) -> Vec<Intent> {
        let mut intents: Vec<Intent> = self
            .intents
            .read()
            .values()
            .filter(|intent| intent.owner_page == page)
            .cloned()
            .collect();
        intents.sort_by(|a, b| a.name.cmp(&b.name));
        intents
    }

    /// Operation names registered for a page.
    pub fn operation_names(&self, page: Page) -> Vec<String> {
        self.list_for_page(page)
            .into_iter()
            .map(|intent| intent.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.intents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.read().is_empty()
    }
}

impl Default for IntentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
