//! Helm Core - Agent-Intent Execution Protocol
//!
//! This crate implements the protocol by which an autonomous agent proposes
//! a state-changing operation on the operations console, a human reviews it,
//! and the system relocates the user to the owning page when needed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Agent                            │
//! └───────────────┬──────────────────────────▲───────────────┘
//!                 │ invoke(intent, args)     │ outcome string
//!                 ▼                          │
//!        ┌─────────────────┐        ┌────────┴────────┐
//!        │ Intent Registry │        │  Approval Gate  │
//!        └────────┬────────┘        └────────▲────────┘
//!                 │ resolve                  │ local signal
//!                 ▼                          │
//!        ┌─────────────────┐   same page     │
//!        │   Dispatcher    ├─────────────────┘
//!        └────────┬────────┘
//!                 │ other page
//!                 ▼
//!        ┌─────────────────┐
//!        │ NavigationTicket│  consumed once at destination mount
//!        └─────────────────┘
//! ```
//!
//! Page controllers, dialog state machines, and the collaborators that
//! perform the actual mutations live in `helm-console`.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod permissions;
pub mod proposal;
pub mod registry;
pub mod types;

pub use context::AgentContext;
pub use dispatch::{Dispatch, Dispatcher, NavigationTicket};
pub use error::{CoreError, Result};
pub use intent::{Intent, ParamKind, ParameterSpec};
pub use permissions::{allowed, roles_for, Capability};
pub use proposal::{
    resolved_outcome, ApprovalGate, Decision, EventSender, OutcomeReceiver, OutcomeTexts,
    Proposal, ProposalStatus, ProtocolEvent, Responded, SUPERSEDED_OUTCOME,
};
pub use registry::IntentRegistry;
pub use types::{arg_bool, arg_missing, arg_str, ArgMap, CurrentUser, Page, Role};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
