//! The console runtime: page lifecycle, navigation, and agent invocation.
//!
//! One `Console` per signed-in user. It owns the shared intent registry, the
//! mounted page controller, and the navigation ticket ledger, and it routes
//! every agent invocation either to the mounted page's approval surface or
//! across pages via a navigation ticket.

use crate::cards::CardsPage;
use crate::collaborator::{CardVault, TeamDirectory};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::team::TeamPage;
use chrono::Utc;
use helm_core::{
    arg_bool, arg_str, resolved_outcome, AgentContext, ArgMap, CurrentUser, Decision, Dispatch,
    Dispatcher, EventSender, Intent, IntentRegistry, NavigationTicket, OutcomeReceiver, Page,
    ParamKind, ParameterSpec, Proposal, ProposalStatus, ProtocolEvent, Responded,
    SUPERSEDED_OUTCOME,
};
use std::collections::HashSet;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Console-global intent: move to another page and optionally resume an
/// operation there. Intercepted before dispatch; never enters the registry.
pub const NAVIGATE_INTENT: &str = "navigate-to-page-and-perform";

const NAVIGATION_COMPLETED: &str = "Navigation completed";
const NAVIGATION_DENIED: &str = "Navigation denied by user";
const OPERATION_UNAVAILABLE: &str = "Operation not available";

/// The page controller currently mounted.
enum Mounted {
    Home,
    Team(TeamPage),
    Cards(CardsPage),
}

impl Mounted {
    fn page(&self) -> Page {
        match self {
            Mounted::Home => Page::Home,
            Mounted::Team(_) => Page::Team,
            Mounted::Cards(_) => Page::Cards,
        }
    }
}

/// Pending approval for an explicit navigation proposal.
///
/// Unlike the page gates, approving this mutates the console (it swaps the
/// mounted page), so the console resolves it inline rather than from a
/// detached task.
struct NavigationGate {
    ticket: NavigationTicket,
    args: ArgMap,
    summary: String,
    outcome_tx: oneshot::Sender<String>,
}

/// The console runtime for one user session.
pub struct Console {
    user: CurrentUser,
    directory: std::sync::Arc<dyn TeamDirectory>,
    vault: std::sync::Arc<dyn CardVault>,
    registry: IntentRegistry,
    dispatcher: Dispatcher,
    events: EventSender,
    auto_consume: bool,
    mounted: Mounted,
    consumed: HashSet<Uuid>,
    pending_navigation: Option<NavigationGate>,
}

impl Console {
    /// Boot the console on the configured landing page. Returns the console
    /// and the receiver for protocol events (detached mutation failures).
    pub async fn new(
        config: &ConsoleConfig,
        user: CurrentUser,
        directory: std::sync::Arc<dyn TeamDirectory>,
        vault: std::sync::Arc<dyn CardVault>,
    ) -> (Self, mpsc::Receiver<ProtocolEvent>) {
        let registry = IntentRegistry::new();
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer);
        let mut console = Self {
            user,
            directory,
            vault,
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            events: events_tx,
            auto_consume: config.auto_consume,
            mounted: Mounted::Home,
            consumed: HashSet::new(),
            pending_navigation: None,
        };
        console.mount(config.landing_page, None).await;
        (console, events_rx)
    }

    pub fn current_page(&self) -> Page {
        self.mounted.page()
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// The mounted team page, if the console is on `/team`.
    pub fn team(&self) -> Result<&TeamPage> {
        match &self.mounted {
            Mounted::Team(page) => Ok(page),
            other => Err(ConsoleError::PageNotMounted(other.page().to_string())),
        }
    }

    pub fn team_mut(&mut self) -> Result<&mut TeamPage> {
        match &mut self.mounted {
            Mounted::Team(page) => Ok(page),
            other => Err(ConsoleError::PageNotMounted(other.page().to_string())),
        }
    }

    /// The mounted cards page, if the console is on `/cards`.
    pub fn cards(&self) -> Result<&CardsPage> {
        match &self.mounted {
            Mounted::Cards(page) => Ok(page),
            other => Err(ConsoleError::PageNotMounted(other.page().to_string())),
        }
    }

    pub fn cards_mut(&mut self) -> Result<&mut CardsPage> {
        match &mut self.mounted {
            Mounted::Cards(page) => Ok(page),
            other => Err(ConsoleError::PageNotMounted(other.page().to_string())),
        }
    }

    async fn mount(&mut self, page: Page, ticket: Option<&NavigationTicket>) {
        match std::mem::replace(&mut self.mounted, Mounted::Home) {
            Mounted::Team(old) => old.unmount(),
            Mounted::Cards(old) => old.unmount(),
            Mounted::Home => {}
        }
        self.mounted = match page {
            Page::Home => Mounted::Home,
            Page::Team => Mounted::Team(
                TeamPage::mount(
                    self.user.clone(),
                    self.directory.clone(),
                    self.registry.clone(),
                    self.events.clone(),
                    ticket,
                )
                .await,
            ),
            Page::Cards => Mounted::Cards(
                CardsPage::mount(
                    self.user.clone(),
                    self.vault.clone(),
                    self.registry.clone(),
                    ticket,
                )
                .await,
            ),
        };
        tracing::info!("Mounted {}", page);
    }

    /// Navigate by ticket. A ticket id already in the ledger still lands on
    /// the target page, but its operation never resumes again.
    pub async fn navigate(&mut self, ticket: NavigationTicket) {
        if !self.auto_consume || !self.consumed.insert(ticket.id) {
            if self.consumed.contains(&ticket.id) {
                tracing::info!("Ticket {} already consumed; navigating only", ticket.id);
            }
            self.mount(ticket.target, None).await;
            return;
        }
        self.mount(ticket.target, Some(&ticket)).await;
    }

    /// Open a destination URL, e.g. `/team?operation=remove-member&arg.id=2`.
    pub async fn open_url(&mut self, url: &str) -> Result<()> {
        let ticket = NavigationTicket::from_url(url)?;
        self.navigate(ticket).await;
        Ok(())
    }

    /// The intent advertisement for the console-global navigation intent.
    pub fn navigation_intent() -> Intent {
        Intent::new(NAVIGATE_INTENT, Page::Home)
            .with_description(
                "Navigate to another page and optionally perform one of its operations there",
            )
            .with_param(ParameterSpec::required(
                "page",
                ParamKind::String,
                "Path of the destination page",
            ))
            .with_param(ParameterSpec::optional(
                "operation",
                ParamKind::String,
                "Operation to perform after navigating",
            ))
            .with_param(ParameterSpec::optional(
                "operationAvailable",
                ParamKind::Boolean,
                "Whether the destination page advertises the operation",
            ))
    }

    /// Handle one agent invocation. Returns the receiver the agent awaits
    /// for the terminal outcome string.
    pub async fn invoke(&mut self, name: &str, args: ArgMap) -> OutcomeReceiver {
        if name == NAVIGATE_INTENT {
            return self.propose_navigation(args);
        }

        match self.dispatcher.dispatch(self.current_page(), name, args) {
            Dispatch::Unavailable => resolved_outcome(OPERATION_UNAVAILABLE),
            Dispatch::Local { intent, args } => match &mut self.mounted {
                Mounted::Team(page) => page.propose(&intent, args),
                Mounted::Cards(page) => page.propose(&intent, args),
                Mounted::Home => resolved_outcome(OPERATION_UNAVAILABLE),
            },
            Dispatch::Navigate(ticket) => {
                let url = ticket.to_url();
                self.navigate(ticket).await;
                resolved_outcome(format!("Navigated to {url}"))
            }
        }
    }

    /// Render the approval gate for an explicit navigation proposal.
    fn propose_navigation(&mut self, args: ArgMap) -> OutcomeReceiver {
        let Some(path) = arg_str(&args, "page") else {
            return resolved_outcome("Missing page information");
        };
        let Some(target) = Page::from_path(path) else {
            return resolved_outcome(format!("Unknown page: {path}"));
        };

        // The operation rides along only when the agent flagged it available
        // at the destination; otherwise the ticket navigates only.
        let operation = match arg_bool(&args, "operationAvailable") {
            Some(false) => None,
            _ => arg_str(&args, "operation").map(str::to_string),
        };
        let op_args: ArgMap = if operation.is_some() {
            args.iter()
                .filter(|(key, _)| {
                    !matches!(key.as_str(), "page" | "operation" | "operationAvailable")
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        } else {
            ArgMap::new()
        };

        let summary = match &operation {
            Some(operation) => format!("Navigate to {} and perform {operation}", target.path()),
            None => format!("Navigate to {}", target.path()),
        };
        let ticket = NavigationTicket::new(target, operation, op_args);
        tracing::info!("Navigation proposal rendered: {} ({})", summary, ticket.id);

        let (outcome_tx, outcome_rx) = oneshot::channel();
        // A still-pending navigation gate resolves before it is replaced.
        if let Some(previous) = self.pending_navigation.take() {
            let _ = previous.outcome_tx.send(SUPERSEDED_OUTCOME.to_string());
        }
        self.pending_navigation = Some(NavigationGate {
            ticket,
            args,
            summary,
            outcome_tx,
        });
        outcome_rx
    }

    /// Summary of the pending proposal, whichever surface rendered it.
    pub fn pending_summary(&self) -> Option<&str> {
        if let Some(gate) = &self.pending_navigation {
            return Some(&gate.summary);
        }
        match &self.mounted {
            Mounted::Team(page) => page.pending_summary(),
            _ => None,
        }
    }

    /// Deliver the human decision on the pending proposal. Navigation gates
    /// take precedence; otherwise the decision goes to the mounted page.
    pub async fn respond(&mut self, decision: Decision) -> Result<Responded> {
        if let Some(gate) = self.pending_navigation.take() {
            return Ok(self.respond_navigation(gate, decision).await);
        }
        match &mut self.mounted {
            Mounted::Team(page) => page.respond(decision),
            _ => Err(ConsoleError::NothingPending),
        }
    }

    async fn respond_navigation(&mut self, gate: NavigationGate, decision: Decision) -> Responded {
        let mut proposal = Proposal {
            id: gate.ticket.id,
            intent_name: NAVIGATE_INTENT.to_string(),
            args: gate.args,
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
        };
        match decision {
            Decision::Deny => {
                proposal.status = ProposalStatus::Denied;
                tracing::info!("Navigation denied: {}", gate.summary);
                let _ = gate.outcome_tx.send(NAVIGATION_DENIED.to_string());
            }
            Decision::Approve => {
                proposal.status = ProposalStatus::Approved;
                self.navigate(gate.ticket).await;
                let _ = gate.outcome_tx.send(NAVIGATION_COMPLETED.to_string());
            }
        }
        Responded { proposal, decision }
    }

    /// Snapshot of everything the agent may read, including the
    /// console-global navigation intent.
    pub fn agent_context(&self) -> AgentContext {
        let mut context = AgentContext::build(&self.user, self.current_page(), &self.registry);
        context.intents.push(Self::navigation_intent().advertisement());
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{InMemoryDirectory, InMemoryVault};
    use crate::data::{seed_cards, seed_team};
    use helm_core::Role;
    use serde_json::json;

    async fn console(landing: Page) -> Console {
        let user = CurrentUser::new("u1", "Dana Reyes", Role::Admin);
        let config = ConsoleConfig::default().with_landing_page(landing);
        let (console, _events) = Console::new(
            &config,
            user.clone(),
            InMemoryDirectory::new(user.clone(), seed_team()),
            InMemoryVault::new(user, seed_cards()),
        )
        .await;
        console
    }

    #[tokio::test]
    async fn test_boot_mounts_landing_page() {
        let console = console(Page::Team).await;
        assert_eq!(console.current_page(), Page::Team);
        assert_eq!(console.team().unwrap().roster().len(), 3);
        assert!(console.cards().is_err());
    }

    #[tokio::test]
    async fn test_unknown_operation_resolves_unavailable() {
        let mut console = console(Page::Team).await;
        let outcome = console.invoke("launch-rocket", ArgMap::new()).await;
        assert_eq!(outcome.await.unwrap(), "Operation not available");
        assert_eq!(console.current_page(), Page::Team);
    }

    #[tokio::test]
    async fn test_cross_page_invocation_navigates_and_resumes() {
        let mut console = console(Page::Team).await;

        let mut args = ArgMap::new();
        args.insert("cardId".to_string(), json!("card-2"));
        let outcome = console.invoke("change-pin", args).await;

        assert_eq!(
            outcome.await.unwrap(),
            "Navigated to /cards?operation=change-pin&arg.cardId=card-2"
        );
        assert_eq!(console.current_page(), Page::Cards);
        assert_eq!(console.cards().unwrap().pin_dialog().card_id(), Some("card-2"));
        // The team page's intents left the registry with the page.
        assert!(console.registry.resolve("remove-member").is_none());
    }

    #[tokio::test]
    async fn test_local_invocation_never_navigates() {
        let mut console = console(Page::Team).await;

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        let _outcome = console.invoke("remove-member", args).await;

        assert_eq!(console.current_page(), Page::Team);
        assert_eq!(
            console.pending_summary(),
            Some("Remove team member Omar Haddad")
        );
    }

    #[tokio::test]
    async fn test_navigation_gate_approve_then_resume() {
        let mut console = console(Page::Cards).await;

        let mut args = ArgMap::new();
        args.insert("page".to_string(), json!("/team"));
        args.insert("operation".to_string(), json!("remove-member"));
        args.insert("id".to_string(), json!("2"));
        let outcome = console.invoke(NAVIGATE_INTENT, args).await;

        assert_eq!(console.current_page(), Page::Cards);
        assert_eq!(
            console.pending_summary(),
            Some("Navigate to /team and perform remove-member")
        );

        let responded = console.respond(Decision::Approve).await.unwrap();
        assert_eq!(responded.acknowledgement(), "Response submitted.");
        assert_eq!(outcome.await.unwrap(), "Navigation completed");
        assert_eq!(console.current_page(), Page::Team);
        assert_eq!(console.team().unwrap().dialog().member_id(), Some("2"));
    }

    #[tokio::test]
    async fn test_navigation_gate_deny_stays_put() {
        let mut console = console(Page::Cards).await;

        let mut args = ArgMap::new();
        args.insert("page".to_string(), json!("/team"));
        let outcome = console.invoke(NAVIGATE_INTENT, args).await;

        console.respond(Decision::Deny).await.unwrap();
        assert_eq!(outcome.await.unwrap(), "Navigation denied by user");
        assert_eq!(console.current_page(), Page::Cards);
    }

    #[tokio::test]
    async fn test_unavailable_operation_yields_navigate_only_ticket() {
        let mut console = console(Page::Cards).await;

        let mut args = ArgMap::new();
        args.insert("page".to_string(), json!("/team"));
        args.insert("operation".to_string(), json!("remove-member"));
        args.insert("operationAvailable".to_string(), json!(false));
        args.insert("id".to_string(), json!("2"));
        let outcome = console.invoke(NAVIGATE_INTENT, args).await;

        assert_eq!(console.pending_summary(), Some("Navigate to /team"));
        console.respond(Decision::Approve).await.unwrap();
        assert_eq!(outcome.await.unwrap(), "Navigation completed");
        assert_eq!(console.current_page(), Page::Team);
        assert!(!console.team().unwrap().dialog().is_open());
    }

    #[tokio::test]
    async fn test_new_navigation_proposal_supersedes_pending() {
        let mut console = console(Page::Home).await;

        let mut first_args = ArgMap::new();
        first_args.insert("page".to_string(), json!("/team"));
        let first = console.invoke(NAVIGATE_INTENT, first_args).await;

        let mut second_args = ArgMap::new();
        second_args.insert("page".to_string(), json!("/cards"));
        let second = console.invoke(NAVIGATE_INTENT, second_args).await;

        assert_eq!(first.await.unwrap(), helm_core::SUPERSEDED_OUTCOME);
        console.respond(Decision::Approve).await.unwrap();
        assert_eq!(second.await.unwrap(), "Navigation completed");
        assert_eq!(console.current_page(), Page::Cards);
    }

    #[tokio::test]
    async fn test_navigation_to_unknown_page_resolves_immediately() {
        let mut console = console(Page::Home).await;

        let mut args = ArgMap::new();
        args.insert("page".to_string(), json!("/warehouse"));
        let outcome = console.invoke(NAVIGATE_INTENT, args).await;
        assert_eq!(outcome.await.unwrap(), "Unknown page: /warehouse");
        assert!(console.pending_summary().is_none());
    }

    #[tokio::test]
    async fn test_consumed_ticket_never_resumes_twice() {
        let mut console = console(Page::Home).await;

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        let ticket =
            NavigationTicket::new(Page::Team, Some("remove-member".to_string()), args);

        console.navigate(ticket.clone()).await;
        assert!(console.team().unwrap().dialog().is_open());

        console.team_mut().unwrap().cancel_dialog();
        console.navigate(ticket).await;
        assert_eq!(console.current_page(), Page::Team);
        assert!(!console.team().unwrap().dialog().is_open());
    }

    #[tokio::test]
    async fn test_auto_consume_disabled_drops_operation() {
        let user = CurrentUser::new("u1", "Dana Reyes", Role::Admin);
        let config = ConsoleConfig::default().with_auto_consume(false);
        let (mut console, _events) = Console::new(
            &config,
            user.clone(),
            InMemoryDirectory::new(user.clone(), seed_team()),
            InMemoryVault::new(user, seed_cards()),
        )
        .await;

        console
            .open_url("/team?operation=remove-member&arg.id=2")
            .await
            .unwrap();
        assert_eq!(console.current_page(), Page::Team);
        assert!(!console.team().unwrap().dialog().is_open());
    }

    #[tokio::test]
    async fn test_open_url_parses_and_resumes() {
        let mut console = console(Page::Home).await;
        console
            .open_url("/team?operation=edit-member&arg.id=3")
            .await
            .unwrap();

        assert_eq!(console.current_page(), Page::Team);
        assert_eq!(console.team().unwrap().dialog().action(), Some("edit"));
        assert!(console.open_url("/nowhere").await.is_err());
    }

    #[tokio::test]
    async fn test_respond_with_nothing_pending() {
        let mut console = console(Page::Team).await;
        assert!(matches!(
            console.respond(Decision::Approve).await,
            Err(ConsoleError::NothingPending)
        ));
    }

    #[tokio::test]
    async fn test_agent_context_advertises_navigation() {
        let console = console(Page::Team).await;
        let context = console.agent_context();

        assert_eq!(context.current_page, Page::Team);
        let names: Vec<&str> = context
            .intents
            .iter()
            .filter_map(|i| i["name"].as_str())
            .collect();
        assert!(names.contains(&"remove-member"));
        assert!(names.contains(&NAVIGATE_INTENT));
    }
}
