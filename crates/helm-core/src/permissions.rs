//! Permission oracle: a static capability-to-roles table.
//!
//! The oracle is advisory for UI affordances (disable/hide). Collaborators
//! performing the actual mutation re-check on their side; client-side gating
//! alone is never trusted.

use crate::types::Role;
use serde::{Deserialize, Serialize};

/// A named protected action checked against the current role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    AddCard,
    ChangePin,
    InviteMember,
    RemoveMember,
    EditMember,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::AddCard,
        Capability::ChangePin,
        Capability::InviteMember,
        Capability::RemoveMember,
        Capability::EditMember,
    ];
}

/// The roles permitted to exercise a capability.
///
/// Every capability maps to a non-empty role set; the match is exhaustive, so
/// an unmapped capability cannot exist at runtime.
pub fn roles_for(capability: Capability) -> &'static [Role] {
    match capability {
        Capability::AddCard => &[Role::Admin],
        Capability::ChangePin => &[Role::Admin, Role::Member],
        Capability::InviteMember => &[Role::Admin],
        Capability::RemoveMember => &[Role::Admin],
        Capability::EditMember => &[Role::Admin],
    }
}

/// Pure permission check: may `role` exercise `capability`?
pub fn allowed(capability: Capability, role: Role) -> bool {
    roles_for(capability).contains(&role)
}
