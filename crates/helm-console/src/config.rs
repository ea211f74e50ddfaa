//! Console configuration.

use crate::error::Result;
use helm_core::Page;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_event_buffer() -> usize {
    64
}

fn default_true() -> bool {
    true
}

/// Runtime configuration for the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Page mounted at boot.
    #[serde(default = "ConsoleConfig::default_landing_page")]
    pub landing_page: Page,

    /// Capacity of the protocol event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Resume ticket operations automatically at destination mount. When
    /// off, navigation still lands on the target page but the carried
    /// operation is dropped.
    #[serde(default = "default_true")]
    pub auto_consume: bool,

    /// Enable verbose tracing output.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            landing_page: Self::default_landing_page(),
            event_buffer: default_event_buffer(),
            auto_consume: true,
            verbose: false,
        }
    }
}

impl ConsoleConfig {
    fn default_landing_page() -> Page {
        Page::Home
    }

    pub fn with_landing_page(mut self, page: Page) -> Self {
        self.landing_page = page;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn with_auto_consume(mut self, auto_consume: bool) -> Self {
        self.auto_consume = auto_consume;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
