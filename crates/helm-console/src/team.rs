//! Team page controller.
//!
//! Registers the team-owned intents at mount, owns the roster snapshot and
//! the member dialog, renders approval gates for agent proposals, and runs
//! the directory collaborator once a proposal is approved.

use crate::collaborator::TeamDirectory;
use crate::data::{ExpenseTeam, TeamMember};
use crate::dialog::{DialogEvent, DialogState, MemberForm};
use crate::error::{ConsoleError, Result};
use helm_core::{
    arg_str, ApprovalGate, ArgMap, CurrentUser, Decision, EventSender, Intent, IntentRegistry,
    NavigationTicket, OutcomeReceiver, OutcomeTexts, Page, ParamKind, ParameterSpec, Responded,
    Role,
};
use std::str::FromStr;
use std::sync::Arc;

pub const INVITE_MEMBER: &str = "invite-member";
pub const REMOVE_MEMBER: &str = "remove-member";
pub const EDIT_MEMBER: &str = "edit-member";
pub const CHANGE_MEMBER_ROLE: &str = "change-member-role";
pub const CHANGE_MEMBER_TEAM: &str = "change-member-team";

/// The gate-backed mutations the team page can execute. Parsed from the
/// intent name at proposal time; unknown names never reach this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeamAction {
    RemoveMember,
    ChangeMemberRole,
    ChangeMemberTeam,
}

impl TeamAction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            REMOVE_MEMBER => Some(Self::RemoveMember),
            CHANGE_MEMBER_ROLE => Some(Self::ChangeMemberRole),
            CHANGE_MEMBER_TEAM => Some(Self::ChangeMemberTeam),
            _ => None,
        }
    }

    fn texts(self) -> OutcomeTexts {
        match self {
            Self::RemoveMember => OutcomeTexts::new(
                "Member removed successfully",
                "Member removal denied by user",
                "Missing member information",
                "Member removal failed",
            ),
            Self::ChangeMemberRole => OutcomeTexts::new(
                "Role changed successfully",
                "Role change denied by user",
                "Missing member or role information",
                "Role change failed",
            ),
            Self::ChangeMemberTeam => OutcomeTexts::new(
                "Team changed successfully",
                "Team change denied by user",
                "Missing member or team information",
                "Team change failed",
            ),
        }
    }
}

struct PendingApproval {
    gate: ApprovalGate,
    action: TeamAction,
}

/// The mounted team page.
pub struct TeamPage {
    user: CurrentUser,
    directory: Arc<dyn TeamDirectory>,
    registry: IntentRegistry,
    events: EventSender,
    roster: Vec<TeamMember>,
    dialog: DialogState,
    pending: Option<PendingApproval>,
}

impl TeamPage {
    /// Mount the page: register its intents, snapshot the roster, and
    /// consume a navigation ticket if one was carried here.
    pub async fn mount(
        user: CurrentUser,
        directory: Arc<dyn TeamDirectory>,
        registry: IntentRegistry,
        events: EventSender,
        ticket: Option<&NavigationTicket>,
    ) -> Self {
        for intent in Self::intents() {
            if let Err(e) = registry.register(intent) {
                tracing::error!("Team page intent registration failed: {}", e);
            }
        }

        let roster = directory.list().await;
        let mut page = Self {
            user,
            directory,
            registry,
            events,
            roster,
            dialog: DialogState::Closed,
            pending: None,
        };
        if let Some(ticket) = ticket {
            page.resume(ticket);
        }
        page
    }

    /// Unregister this page's intents. Called by the console before the next
    /// page mounts.
    pub fn unmount(&self) {
        for name in [
            INVITE_MEMBER,
            REMOVE_MEMBER,
            EDIT_MEMBER,
            CHANGE_MEMBER_ROLE,
            CHANGE_MEMBER_TEAM,
        ] {
            self.registry.unregister(name);
        }
    }

    fn intents() -> Vec<Intent> {
        vec![
            Intent::new(INVITE_MEMBER, Page::Team)
                .with_description("Invite a new team member; opens the invite dialog")
                .with_param(ParameterSpec::optional(
                    "email",
                    ParamKind::String,
                    "Email address to pre-fill",
                )),
            Intent::new(EDIT_MEMBER, Page::Team)
                .with_description("Edit a team member; opens the edit dialog")
                .with_param(ParameterSpec::optional(
                    "id",
                    ParamKind::String,
                    "The ID of the member to edit",
                )),
            Intent::new(REMOVE_MEMBER, Page::Team)
                .with_description(
                    "Remove a team member. Call immediately; the approval UI handles confirmation",
                )
                .with_param(ParameterSpec::required(
                    "id",
                    ParamKind::String,
                    "The ID of the member to remove",
                )),
            Intent::new(CHANGE_MEMBER_ROLE, Page::Team)
                .with_description(
                    "Change the role of a team member. Call immediately; the approval UI handles confirmation",
                )
                .with_param(ParameterSpec::required(
                    "id",
                    ParamKind::String,
                    "The ID of the member to change the role of",
                ))
                .with_param(ParameterSpec::required(
                    "role",
                    ParamKind::String,
                    "The new role of the member",
                )),
            Intent::new(CHANGE_MEMBER_TEAM, Page::Team)
                .with_description(
                    "Change the team of a team member. Call immediately; the approval UI handles confirmation",
                )
                .with_param(ParameterSpec::required(
                    "id",
                    ParamKind::String,
                    "The ID of the member to change the team of",
                ))
                .with_param(ParameterSpec::required(
                    "team",
                    ParamKind::String,
                    "The new team of the member",
                )),
        ]
    }

    /// Consume a resumed operation: open the matching dialog. Operations
    /// without a dialog affordance here are ignored; the ticket is advisory.
    fn resume(&mut self, ticket: &NavigationTicket) {
        let Some(operation) = ticket.operation.as_deref() else {
            return;
        };
        match operation {
            INVITE_MEMBER => {
                self.apply_dialog(DialogEvent::OpenAdd);
                if let Some(email) = arg_str(&ticket.args, "email") {
                    self.apply_dialog(DialogEvent::EditForm(crate::dialog::FormPatch {
                        email: Some(email.to_string()),
                        ..Default::default()
                    }));
                }
            }
            EDIT_MEMBER => {
                let Some(id) = arg_str(&ticket.args, "id") else {
                    tracing::warn!("Resumed edit-member ticket without a member id; ignored");
                    return;
                };
                let form = self
                    .member(id)
                    .map(|m| MemberForm {
                        email: m.email.clone(),
                        role: m.role,
                        team: m.team,
                    })
                    .unwrap_or_default();
                self.apply_dialog(DialogEvent::OpenEdit {
                    member_id: id.to_string(),
                    form,
                });
            }
            REMOVE_MEMBER => {
                let Some(id) = arg_str(&ticket.args, "id") else {
                    tracing::warn!("Resumed remove-member ticket without a member id; ignored");
                    return;
                };
                self.apply_dialog(DialogEvent::OpenRemove {
                    member_id: id.to_string(),
                });
            }
            other => {
                tracing::warn!("Team page ignoring unknown resumed operation: {}", other);
            }
        }
    }

    pub fn roster(&self) -> &[TeamMember] {
        &self.roster
    }

    /// Re-snapshot the roster from the directory.
    pub async fn refresh(&mut self) {
        self.roster = self.directory.list().await;
    }

    fn member(&self, id: &str) -> Option<&TeamMember> {
        self.roster.iter().find(|m| m.id == id)
    }

    /// Name shown in proposal summaries; unknown references degrade to the
    /// raw id.
    fn member_label(&self, id: &str) -> String {
        self.member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    /// Direct UI affordance on the dialog machine (buttons, form edits).
    pub fn apply_dialog(&mut self, event: DialogEvent) {
        self.dialog = std::mem::take(&mut self.dialog).apply(event);
    }

    /// May the current user see the edit/remove affordances?
    pub fn can_manage_members(&self) -> bool {
        helm_core::allowed(helm_core::Capability::EditMember, self.user.role)
    }

    /// Submit the open dialog: run the mutation, then reset to closed.
    pub async fn submit_dialog(&mut self) -> Result<()> {
        let state = std::mem::take(&mut self.dialog);
        let result = match &state {
            DialogState::Closed => return Err(ConsoleError::NoDialogOpen),
            DialogState::AddOpen { form, .. } => {
                self.directory
                    .invite_member(&form.email, form.role, form.team)
                    .await
            }
            DialogState::EditOpen {
                member_id, form, ..
            } => {
                self.directory
                    .change_member_role(member_id, form.role)
                    .await
                    .and(
                        self.directory
                            .change_member_team(member_id, form.team)
                            .await,
                    )
            }
            DialogState::RemoveOpen { member_id, .. } => {
                self.directory.remove_member(member_id).await
            }
        };
        // The dialog resets after submit regardless; failures surface
        // through the page's generic error channel.
        self.refresh().await;
        result.map_err(Into::into)
    }

    pub fn cancel_dialog(&mut self) {
        self.apply_dialog(DialogEvent::Cancel);
    }

    /// Render an approval gate (or dialog affordance) for a locally
    /// dispatched intent and hand back the agent's outcome receiver.
    pub fn propose(&mut self, intent: &Intent, args: ArgMap) -> OutcomeReceiver {
        let Some(action) = TeamAction::from_name(&intent.name) else {
            // Dialog-backed operations have no gate: opening the dialog is
            // the affordance, and the outcome resolves immediately.
            self.resume(&NavigationTicket::new(
                Page::Team,
                Some(intent.name.clone()),
                args,
            ));
            return helm_core::resolved_outcome(format!("Opened the {} dialog", intent.name));
        };

        let summary = self.summarize(action, &args);
        let (gate, outcome) = ApprovalGate::new(
            intent,
            args,
            summary,
            action.texts(),
            self.events.clone(),
        );
        // A still-pending gate resolves before it is replaced; the earlier
        // agent await must never see a dropped channel.
        if let Some(previous) = self.pending.take() {
            previous.gate.supersede();
        }
        self.pending = Some(PendingApproval { gate, action });
        outcome
    }

    fn summarize(&self, action: TeamAction, args: &ArgMap) -> String {
        let id = arg_str(args, "id").unwrap_or("?");
        let label = self.member_label(id);
        match action {
            TeamAction::RemoveMember => format!("Remove team member {label}"),
            TeamAction::ChangeMemberRole => {
                let role = arg_str(args, "role").unwrap_or("?");
                format!("Change role of {label} to {role}")
            }
            TeamAction::ChangeMemberTeam => {
                let team = arg_str(args, "team").unwrap_or("?");
                format!("Move {label} to the {team} team")
            }
        }
    }

    /// Summary of the pending proposal, if one is rendered.
    pub fn pending_summary(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.gate.summary())
    }

    /// Deliver the human decision on the pending proposal. The gate is
    /// consumed either way; a second decision has nothing left to act on.
    pub fn respond(&mut self, decision: Decision) -> Result<Responded> {
        let PendingApproval { gate, action } =
            self.pending.take().ok_or(ConsoleError::NothingPending)?;

        match decision {
            Decision::Deny => Ok(gate.deny()),
            Decision::Approve => {
                let directory = self.directory.clone();
                Ok(gate.approve(move |args| run_action(directory, action, args)))
            }
        }
    }
}

/// The detached side effect for an approved team mutation. Argument presence
/// was already validated by the gate; value parsing failures surface as
/// collaborator-style failures.
async fn run_action(
    directory: Arc<dyn TeamDirectory>,
    action: TeamAction,
    args: ArgMap,
) -> std::result::Result<(), String> {
    let id = arg_str(&args, "id").ok_or("missing member id")?.to_string();
    match action {
        TeamAction::RemoveMember => directory
            .remove_member(&id)
            .await
            .map_err(|e| e.to_string()),
        TeamAction::ChangeMemberRole => {
            let role = Role::from_str(arg_str(&args, "role").ok_or("missing role")?)?;
            directory
                .change_member_role(&id, role)
                .await
                .map_err(|e| e.to_string())
        }
        TeamAction::ChangeMemberTeam => {
            let team = ExpenseTeam::from_str(arg_str(&args, "team").ok_or("missing team")?)?;
            directory
                .change_member_team(&id, team)
                .await
                .map_err(|e| e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::InMemoryDirectory;
    use crate::data::seed_team;
    use serde_json::json;
    use tokio::sync::mpsc;

    async fn page() -> (TeamPage, Arc<InMemoryDirectory>, IntentRegistry) {
        let user = CurrentUser::new("u1", "Dana Reyes", Role::Admin);
        let directory = InMemoryDirectory::new(user.clone(), seed_team());
        let registry = IntentRegistry::new();
        let (events_tx, _events_rx) = mpsc::channel(8);
        let page = TeamPage::mount(
            user,
            directory.clone(),
            registry.clone(),
            events_tx,
            None,
        )
        .await;
        (page, directory, registry)
    }

    #[tokio::test]
    async fn test_mount_registers_and_unmount_clears() {
        let (page, _directory, registry) = page().await;
        assert!(registry.resolve(REMOVE_MEMBER).is_some());
        assert!(registry.resolve(CHANGE_MEMBER_ROLE).is_some());

        page.unmount();
        assert!(registry.resolve(REMOVE_MEMBER).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_approve_change_role_executes_collaborator() {
        let (mut page, directory, registry) = page().await;
        let intent = registry.resolve(CHANGE_MEMBER_ROLE).unwrap();

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        args.insert("role".to_string(), json!("admin"));

        let outcome = page.propose(&intent, args);
        assert_eq!(
            page.pending_summary(),
            Some("Change role of Omar Haddad to admin")
        );

        page.respond(Decision::Approve).unwrap();
        assert_eq!(outcome.await.unwrap(), "Role changed successfully");

        let omar = directory
            .list()
            .await
            .into_iter()
            .find(|m| m.id == "2")
            .unwrap();
        assert_eq!(omar.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_deny_leaves_roster_untouched() {
        let (mut page, directory, registry) = page().await;
        let intent = registry.resolve(REMOVE_MEMBER).unwrap();

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        let outcome = page.propose(&intent, args);

        page.respond(Decision::Deny).unwrap();
        assert_eq!(outcome.await.unwrap(), "Member removal denied by user");
        assert_eq!(directory.list().await.len(), 3);
    }

    #[tokio::test]
    async fn test_new_proposal_supersedes_pending_gate() {
        let (mut page, directory, registry) = page().await;
        let intent = registry.resolve(REMOVE_MEMBER).unwrap();

        let mut first_args = ArgMap::new();
        first_args.insert("id".to_string(), json!("2"));
        let first = page.propose(&intent, first_args);

        let mut second_args = ArgMap::new();
        second_args.insert("id".to_string(), json!("3"));
        let second = page.propose(&intent, second_args);

        // The first await resolves instead of seeing a dropped channel, and
        // its collaborator never ran.
        assert_eq!(first.await.unwrap(), helm_core::SUPERSEDED_OUTCOME);
        assert_eq!(directory.list().await.len(), 3);
        assert_eq!(
            page.pending_summary(),
            Some("Remove team member Priya Natarajan")
        );

        page.respond(Decision::Approve).unwrap();
        assert_eq!(second.await.unwrap(), "Member removed successfully");
        assert!(directory.list().await.iter().all(|m| m.id != "3"));
    }

    #[tokio::test]
    async fn test_second_response_has_nothing_pending() {
        let (mut page, _directory, registry) = page().await;
        let intent = registry.resolve(REMOVE_MEMBER).unwrap();

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        let _outcome = page.propose(&intent, args);

        page.respond(Decision::Approve).unwrap();
        assert!(matches!(
            page.respond(Decision::Deny),
            Err(ConsoleError::NothingPending)
        ));
    }

    #[tokio::test]
    async fn test_summary_falls_back_to_raw_id() {
        let (mut page, _directory, registry) = page().await;
        let intent = registry.resolve(REMOVE_MEMBER).unwrap();

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("42"));
        let _outcome = page.propose(&intent, args);
        assert_eq!(page.pending_summary(), Some("Remove team member 42"));
    }

    #[tokio::test]
    async fn test_resume_opens_remove_dialog() {
        let user = CurrentUser::new("u1", "Dana Reyes", Role::Admin);
        let directory = InMemoryDirectory::new(user.clone(), seed_team());
        let registry = IntentRegistry::new();
        let (events_tx, _events_rx) = mpsc::channel(8);

        let mut args = ArgMap::new();
        args.insert("id".to_string(), json!("2"));
        let ticket = NavigationTicket::new(Page::Team, Some(REMOVE_MEMBER.to_string()), args);

        let page = TeamPage::mount(user, directory, registry, events_tx, Some(&ticket)).await;
        assert_eq!(page.dialog().action(), Some("remove"));
        assert_eq!(page.dialog().member_id(), Some("2"));
    }

    #[tokio::test]
    async fn test_resume_unknown_operation_ignored() {
        let user = CurrentUser::new("u1", "Dana Reyes", Role::Admin);
        let directory = InMemoryDirectory::new(user.clone(), seed_team());
        let registry = IntentRegistry::new();
        let (events_tx, _events_rx) = mpsc::channel(8);

        let ticket =
            NavigationTicket::new(Page::Team, Some("defragment-disk".to_string()), ArgMap::new());
        let page = TeamPage::mount(user, directory, registry, events_tx, Some(&ticket)).await;
        assert_eq!(*page.dialog(), DialogState::Closed);
    }

    #[tokio::test]
    async fn test_submit_invite_dialog() {
        let (mut page, directory, _registry) = page().await;
        page.apply_dialog(DialogEvent::OpenAdd);
        page.apply_dialog(DialogEvent::EditForm(crate::dialog::FormPatch {
            email: Some("lena@acme.dev".to_string()),
            ..Default::default()
        }));

        page.submit_dialog().await.unwrap();
        assert_eq!(*page.dialog(), DialogState::Closed);
        assert_eq!(directory.list().await.len(), 4);
        assert_eq!(page.roster().len(), 4);
    }
}
