//! Helm Console — operations console runtime with an approval-gated agent.
//!
//! Hosts the page controllers (team roster, corporate cards) on top of the
//! `helm-core` protocol: agent invocations become proposals, proposals wait
//! for a human decision, and approved mutations run against pluggable
//! collaborators.

pub mod cards;
pub mod collaborator;
pub mod config;
pub mod console;
pub mod data;
pub mod dialog;
pub mod error;
pub mod team;

pub use cards::CardsPage;
pub use collaborator::{
    CardVault, CollaboratorError, InMemoryDirectory, InMemoryVault, TeamDirectory,
};
pub use config::ConsoleConfig;
pub use console::{Console, NAVIGATE_INTENT};
pub use data::{CardBrand, CreditCard, ExpensePolicy, ExpenseTeam, TeamMember};
pub use dialog::{DialogEvent, DialogState, MemberForm, PinDialog, PinDialogEvent};
pub use error::{ConsoleError, Result};
pub use team::TeamPage;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
