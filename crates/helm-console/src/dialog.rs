//! Page-local dialog state machines.
//!
//! Modeled as explicit finite-state machines with a closed transition
//! function rather than a merge-any-partial reducer, so the invariants hold
//! structurally: a member id exists exactly in the edit/remove states, and
//! form fields exist only while a dialog is open.

use crate::data::ExpenseTeam;
use helm_core::Role;
use serde::{Deserialize, Serialize};

/// In-flight form values for the add/edit member dialog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemberForm {
    pub email: String,
    pub role: Role,
    pub team: ExpenseTeam,
}

/// Shallow patch applied to an open form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormPatch {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub team: Option<ExpenseTeam>,
}

impl MemberForm {
    fn patched(mut self, patch: FormPatch) -> Self {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(team) = patch.team {
            self.team = team;
        }
        self
    }
}

/// Member dialog state. One instance per team page.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    AddOpen {
        form: MemberForm,
        loading: bool,
    },
    EditOpen {
        member_id: String,
        form: MemberForm,
        loading: bool,
    },
    RemoveOpen {
        member_id: String,
        loading: bool,
    },
}

/// Inputs to the member dialog machine: direct UI affordances, resumed
/// intents, and the submit/cancel handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    OpenAdd,
    OpenEdit { member_id: String, form: MemberForm },
    OpenRemove { member_id: String },
    EditForm(FormPatch),
    SetLoading(bool),
    Submit,
    Cancel,
}

impl DialogState {
    /// Closed transition function. Form edits and loading flags are ignored
    /// while no dialog is open; submit and cancel always reset to `Closed`.
    pub fn apply(self, event: DialogEvent) -> DialogState {
        match (self, event) {
            (_, DialogEvent::OpenAdd) => DialogState::AddOpen {
                form: MemberForm::default(),
                loading: false,
            },
            (_, DialogEvent::OpenEdit { member_id, form }) => DialogState::EditOpen {
                member_id,
                form,
                loading: false,
            },
            (_, DialogEvent::OpenRemove { member_id }) => DialogState::RemoveOpen {
                member_id,
                loading: false,
            },
            (_, DialogEvent::Submit) | (_, DialogEvent::Cancel) => DialogState::Closed,
            (DialogState::AddOpen { form, loading }, DialogEvent::EditForm(patch)) => {
                DialogState::AddOpen {
                    form: form.patched(patch),
                    loading,
                }
            }
            (
                DialogState::EditOpen {
                    member_id,
                    form,
                    loading,
                },
                DialogEvent::EditForm(patch),
            ) => DialogState::EditOpen {
                member_id,
                form: form.patched(patch),
                loading,
            },
            (DialogState::AddOpen { form, .. }, DialogEvent::SetLoading(loading)) => {
                DialogState::AddOpen { form, loading }
            }
            (
                DialogState::EditOpen {
                    member_id, form, ..
                },
                DialogEvent::SetLoading(loading),
            ) => DialogState::EditOpen {
                member_id,
                form,
                loading,
            },
            (DialogState::RemoveOpen { member_id, .. }, DialogEvent::SetLoading(loading)) => {
                DialogState::RemoveOpen { member_id, loading }
            }
            // EditForm/SetLoading while closed, or patches to the remove
            // confirmation, change nothing.
            (state, _) => state,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DialogState::Closed)
    }

    /// The member the dialog refers to, present exactly for edit/remove.
    pub fn member_id(&self) -> Option<&str> {
        match self {
            DialogState::EditOpen { member_id, .. }
            | DialogState::RemoveOpen { member_id, .. } => Some(member_id),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&'static str> {
        match self {
            DialogState::Closed => None,
            DialogState::AddOpen { .. } => Some("add"),
            DialogState::EditOpen { .. } => Some("edit"),
            DialogState::RemoveOpen { .. } => Some("remove"),
        }
    }
}

/// PIN dialog state for the cards page.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PinDialog {
    #[default]
    Closed,
    Open {
        card_id: String,
        pin: String,
        loading: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PinDialogEvent {
    Open { card_id: String },
    SetPin(String),
    SetLoading(bool),
    Submit,
    Cancel,
}

impl PinDialog {
    pub fn apply(self, event: PinDialogEvent) -> PinDialog {
        match (self, event) {
            (_, PinDialogEvent::Open { card_id }) => PinDialog::Open {
                card_id,
                pin: String::new(),
                loading: false,
            },
            (_, PinDialogEvent::Submit) | (_, PinDialogEvent::Cancel) => PinDialog::Closed,
            (PinDialog::Open { card_id, loading, .. }, PinDialogEvent::SetPin(pin)) => {
                PinDialog::Open {
                    card_id,
                    pin,
                    loading,
                }
            }
            (PinDialog::Open { card_id, pin, .. }, PinDialogEvent::SetLoading(loading)) => {
                PinDialog::Open {
                    card_id,
                    pin,
                    loading,
                }
            }
            (state, _) => state,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, PinDialog::Closed)
    }

    pub fn card_id(&self) -> Option<&str> {
        match self {
            PinDialog::Open { card_id, .. } => Some(card_id),
            PinDialog::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_open_add_then_submit_resets() {
        let state = DialogState::Closed
            .apply(DialogEvent::OpenAdd)
            .apply(DialogEvent::EditForm(FormPatch {
                email: Some("lena@acme.dev".to_string()),
                ..FormPatch::default()
            }))
            .apply(DialogEvent::SetLoading(true));

        match &state {
            DialogState::AddOpen { form, loading } => {
                assert_eq!(form.email, "lena@acme.dev");
                assert!(loading);
            }
            other => panic!("expected AddOpen, got {other:?}"),
        }

        assert_eq!(state.apply(DialogEvent::Submit), DialogState::Closed);
    }

    #[test]
    fn test_cancel_clears_member_id_and_action_together() {
        let state = DialogState::Closed.apply(DialogEvent::OpenRemove {
            member_id: "2".to_string(),
        });
        assert_eq!(state.member_id(), Some("2"));
        assert_eq!(state.action(), Some("remove"));

        let state = state.apply(DialogEvent::Cancel);
        assert_eq!(state.member_id(), None);
        assert_eq!(state.action(), None);
    }

    #[test]
    fn test_form_edits_ignored_while_closed() {
        let state = DialogState::Closed.apply(DialogEvent::EditForm(FormPatch {
            email: Some("ghost@acme.dev".to_string()),
            ..FormPatch::default()
        }));
        assert_eq!(state, DialogState::Closed);
    }

    #[test]
    fn test_pin_dialog_lifecycle() {
        let state = PinDialog::Closed
            .apply(PinDialogEvent::Open {
                card_id: "card-1".to_string(),
            })
            .apply(PinDialogEvent::SetPin("4321".to_string()));

        assert_eq!(state.card_id(), Some("card-1"));
        assert_eq!(state.apply(PinDialogEvent::Submit), PinDialog::Closed);
    }

    fn arb_event() -> impl Strategy<Value = DialogEvent> {
        prop_oneof![
            Just(DialogEvent::OpenAdd),
            "[0-9]{1,3}".prop_map(|id| DialogEvent::OpenEdit {
                member_id: id,
                form: MemberForm::default(),
            }),
            "[0-9]{1,3}".prop_map(|id| DialogEvent::OpenRemove { member_id: id }),
            "[a-z]{0,8}".prop_map(|email| DialogEvent::EditForm(FormPatch {
                email: Some(email),
                ..FormPatch::default()
            })),
            any::<bool>().prop_map(DialogEvent::SetLoading),
            Just(DialogEvent::Submit),
            Just(DialogEvent::Cancel),
        ]
    }

    proptest! {
        // A member id is present iff the action is edit/remove, and only
        // while the dialog is open.
        #[test]
        fn prop_member_id_iff_edit_or_remove(events in proptest::collection::vec(arb_event(), 0..32)) {
            let mut state = DialogState::Closed;
            for event in events {
                state = state.apply(event);
                let has_id = state.member_id().is_some();
                let is_edit_or_remove = matches!(state.action(), Some("edit") | Some("remove"));
                prop_assert_eq!(has_id, is_edit_or_remove);
                prop_assert_eq!(state.action().is_some(), state.is_open());
            }
        }
    }
}
