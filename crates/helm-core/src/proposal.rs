//! Proposals and the approval gate.
//!
//! A proposal is one runtime request to execute an intent, pending a human
//! decision. The gate renders its summary, accepts exactly one decision, and
//! resolves the agent's outcome channel. Approve and deny both consume the
//! gate, so double dispatch is unrepresentable and the underlying side effect
//! runs at most once per proposal.

use crate::intent::Intent;
use crate::types::ArgMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Proposal lifecycle status. Transitions exactly once out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Denied,
}

/// A runtime instantiation of an intent, awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub intent_name: String,
    pub args: ArgMap,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

/// The human decision on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Deny,
}

/// Terminal outcome strings for one intent's approval gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTexts {
    /// Sent after the collaborator completes successfully.
    pub success: String,
    /// Sent synchronously on deny.
    pub denied: String,
    /// Sent when required arguments are absent; no collaborator call.
    pub missing: String,
    /// Sent when the collaborator rejects the mutation.
    pub failure: String,
}

impl OutcomeTexts {
    pub fn new(
        success: impl Into<String>,
        denied: impl Into<String>,
        missing: impl Into<String>,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            success: success.into(),
            denied: denied.into(),
            missing: missing.into(),
            failure: failure.into(),
        }
    }
}

/// Protocol-level events observable outside the approval flow.
///
/// The approve path commits its side effect from a detached task; failures
/// land here instead of rolling back the already-responded gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    MutationFailed { intent: String, error: String },
}

/// Outcome delivered when a newer proposal replaces a still-pending gate.
pub const SUPERSEDED_OUTCOME: &str = "Superseded by a newer proposal";

/// Sender half of the console event channel.
pub type EventSender = mpsc::Sender<ProtocolEvent>;

/// Receiver the agent awaits for a terminal outcome string.
pub type OutcomeReceiver = oneshot::Receiver<String>;

/// Build an outcome channel that is already resolved with `text`.
///
/// Used for paths that terminate without rendering a gate, e.g. "operation
/// not available".
pub fn resolved_outcome(text: impl Into<String>) -> OutcomeReceiver {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(text.into());
    rx
}

/// Acknowledgement returned once a gate has responded. The approval controls
/// are gone at this point; only the terminal acknowledgement remains.
#[derive(Debug, Clone, PartialEq)]
pub struct Responded {
    pub proposal: Proposal,
    pub decision: Decision,
}

impl Responded {
    pub fn acknowledgement(&self) -> &'static str {
        "Response submitted."
    }
}

/// Per-proposal approval state machine: `Rendered -> Responded`.
pub struct ApprovalGate {
    proposal: Proposal,
    summary: String,
    required: Vec<String>,
    texts: OutcomeTexts,
    outcome_tx: oneshot::Sender<String>,
    events: EventSender,
}

impl ApprovalGate {
    /// Render a gate for a proposal of `intent` with `args`.
    ///
    /// `summary` is the human-readable rendering resolved from current domain
    /// data by the caller (falling back to raw identifiers for unknown
    /// references). Returns the gate and the receiver the agent awaits.
    pub fn new(
        intent: &Intent,
        args: ArgMap,
        summary: impl Into<String>,
        texts: OutcomeTexts,
        events: EventSender,
    ) -> (Self, OutcomeReceiver) {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let proposal = Proposal {
            id: Uuid::new_v4(),
            intent_name: intent.name.clone(),
            args,
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
        };

        tracing::info!("Proposal rendered: {} ({})", proposal.intent_name, proposal.id);

        let gate = Self {
            proposal,
            summary: summary.into(),
            required: intent
                .parameters
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.clone())
                .collect(),
            texts,
            outcome_tx,
            events,
        };
        (gate, outcome_rx)
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// The human-readable rendering shown while the proposal is pending.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Deny the proposal. The collaborator is never invoked; the denial
    /// outcome is delivered synchronously.
    pub fn deny(mut self) -> Responded {
        self.proposal.status = ProposalStatus::Denied;
        tracing::info!(
            "Proposal denied: {} ({})",
            self.proposal.intent_name,
            self.proposal.id
        );
        let _ = self.outcome_tx.send(self.texts.denied);
        Responded {
            proposal: self.proposal,
            decision: Decision::Deny,
        }
    }

    /// Withdraw a gate that was replaced before a decision arrived.
    ///
    /// The collaborator is never invoked; the agent's outcome resolves with
    /// the superseded text instead of a dropped channel.
    pub fn supersede(mut self) -> Responded {
        self.proposal.status = ProposalStatus::Denied;
        tracing::warn!(
            "Proposal superseded: {} ({})",
            self.proposal.intent_name,
            self.proposal.id
        );
        let _ = self.outcome_tx.send(SUPERSEDED_OUTCOME.to_string());
        Responded {
            proposal: self.proposal,
            decision: Decision::Deny,
        }
    }

    /// Approve the proposal.
    ///
    /// If required arguments are missing, short-circuits with the "missing
    /// information" outcome and never builds the side effect. Otherwise the
    /// gate flips to responded first, then `effect` runs as a detached task:
    /// the success outcome is delivered on completion, and a failure delivers
    /// the failure outcome plus a [`ProtocolEvent::MutationFailed`] on the
    /// event channel. Must be called within a Tokio runtime.
    pub fn approve<F, Fut>(mut self, effect: F) -> Responded
    where
        F: FnOnce(ArgMap) -> Fut,
        Fut: Future<Output = std::result::Result<(), String>> + Send + 'static,
    {
        self.proposal.status = ProposalStatus::Approved;

        let missing: Vec<&String> = self
            .required
            .iter()
            .filter(|name| crate::types::arg_missing(&self.proposal.args, name))
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                "Proposal {} approved with missing arguments: {:?}",
                self.proposal.intent_name,
                missing
            );
            let _ = self.outcome_tx.send(self.texts.missing);
            return Responded {
                proposal: self.proposal,
                decision: Decision::Approve,
            };
        }

        tracing::info!(
            "Proposal approved: {} ({})",
            self.proposal.intent_name,
            self.proposal.id
        );

        // Responded precedes the side effect: the future is built here but
        // only polled by the detached task below.
        let fut = effect(self.proposal.args.clone());
        let intent_name = self.proposal.intent_name.clone();
        let texts = self.texts.clone();
        let outcome_tx = self.outcome_tx;
        let events = self.events.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(()) => {
                    let _ = outcome_tx.send(texts.success);
                }
                Err(error) => {
                    tracing::error!("Mutation failed for {}: {}", intent_name, error);
                    let _ = events
                        .send(ProtocolEvent::MutationFailed {
                            intent: intent_name,
                            error,
                        })
                        .await;
                    let _ = outcome_tx.send(texts.failure);
                }
            }
        });

        Responded {
            proposal: self.proposal,
            decision: Decision::Approve,
        }
    }
}
