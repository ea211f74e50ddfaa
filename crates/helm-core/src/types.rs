//! Shared protocol types: roles, pages, users, and intent arguments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Authorization role attached to the current user and to each team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Default for Role {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A navigable page of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Cards,
    Team,
    Home,
}

impl Page {
    /// All pages, in advertisement order.
    pub const ALL: [Page; 3] = [Page::Cards, Page::Team, Page::Home];

    /// Stable path form of the page, as used in navigation URLs.
    pub fn path(&self) -> &'static str {
        match self {
            Page::Cards => "/cards",
            Page::Team => "/team",
            Page::Home => "/",
        }
    }

    /// Parse a page from its path form. Accepts a leading slash or a bare
    /// segment; anything unrecognised is not a page.
    pub fn from_path(path: &str) -> Option<Page> {
        match path.trim().trim_matches('/') {
            "cards" => Some(Page::Cards),
            "team" => Some(Page::Team),
            "" => Some(Page::Home),
            _ => None,
        }
    }

    /// The statically advertised operation names available on this page.
    ///
    /// This is the catalogue the agent consults to decide whether an
    /// operation requires navigating to a different page. The live registry
    /// only ever holds the intents of the currently mounted page.
    pub fn operations(&self) -> &'static [&'static str] {
        match self {
            Page::Cards => &["change-pin"],
            Page::Team => &[
                "invite-member",
                "remove-member",
                "edit-member",
                "change-member-role",
                "change-member-team",
            ],
            Page::Home => &[],
        }
    }

    /// Resolve the page that owns an operation name, if any.
    pub fn owner_of(operation: &str) -> Option<Page> {
        Page::ALL
            .iter()
            .copied()
            .find(|page| page.operations().contains(&operation))
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// The authenticated user the console is acting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

/// Arguments supplied by the agent when invoking an intent.
pub type ArgMap = BTreeMap<String, serde_json::Value>;

/// Fetch a non-empty string argument.
///
/// An empty string counts as absent, matching the falsy-check semantics the
/// approval flow applies to required arguments.
pub fn arg_str<'a>(args: &'a ArgMap, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(|value| value.as_str())
        .filter(|s| !s.is_empty())
}

/// Fetch a boolean argument.
pub fn arg_bool(args: &ArgMap, name: &str) -> Option<bool> {
    args.get(name).and_then(|value| value.as_bool())
}

/// True when a named argument is absent, null, or an empty string.
pub fn arg_missing(args: &ArgMap, name: &str) -> bool {
    match args.get(name) {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
