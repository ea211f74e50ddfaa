//! Domain records: team members, expense teams, and corporate cards.

use helm_core::Role;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Expense team a member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseTeam {
    Engineering,
    Marketing,
    Finance,
    Operations,
}

impl Default for ExpenseTeam {
    fn default() -> Self {
        Self::Engineering
    }
}

impl std::fmt::Display for ExpenseTeam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseTeam::Engineering => write!(f, "engineering"),
            ExpenseTeam::Marketing => write!(f, "marketing"),
            ExpenseTeam::Finance => write!(f, "finance"),
            ExpenseTeam::Operations => write!(f, "operations"),
        }
    }
}

impl FromStr for ExpenseTeam {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engineering" => Ok(ExpenseTeam::Engineering),
            "marketing" => Ok(ExpenseTeam::Marketing),
            "finance" => Ok(ExpenseTeam::Finance),
            "operations" => Ok(ExpenseTeam::Operations),
            other => Err(format!("unknown team: {other}")),
        }
    }
}

/// One member of the team roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: ExpenseTeam,
}

/// Card network brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    MasterCard,
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardBrand::Visa => write!(f, "Visa"),
            CardBrand::MasterCard => write!(f, "Mastercard"),
        }
    }
}

/// Spending policy attached to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpensePolicy {
    pub limit: u64,
    pub spent: u64,
}

impl ExpensePolicy {
    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.spent)
    }
}

/// A corporate card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: String,
    pub brand: CardBrand,
    pub last4: String,
    pub expiry: String,
    pub policy: Option<ExpensePolicy>,
}

/// Seed roster used by the demo binary and tests.
pub fn seed_team() -> Vec<TeamMember> {
    vec![
        TeamMember {
            id: "1".to_string(),
            name: "Dana Reyes".to_string(),
            email: "dana@acme.dev".to_string(),
            role: Role::Admin,
            team: ExpenseTeam::Engineering,
        },
        TeamMember {
            id: "2".to_string(),
            name: "Omar Haddad".to_string(),
            email: "omar@acme.dev".to_string(),
            role: Role::Member,
            team: ExpenseTeam::Finance,
        },
        TeamMember {
            id: "3".to_string(),
            name: "Priya Natarajan".to_string(),
            email: "priya@acme.dev".to_string(),
            role: Role::Member,
            team: ExpenseTeam::Marketing,
        },
    ]
}

/// Seed cards used by the demo binary and tests.
pub fn seed_cards() -> Vec<CreditCard> {
    vec![
        CreditCard {
            id: "card-1".to_string(),
            brand: CardBrand::Visa,
            last4: "4242".to_string(),
            expiry: "12/27".to_string(),
            policy: Some(ExpensePolicy {
                limit: 5000,
                spent: 1240,
            }),
        },
        CreditCard {
            id: "card-2".to_string(),
            brand: CardBrand::MasterCard,
            last4: "4444".to_string(),
            expiry: "03/26".to_string(),
            policy: None,
        },
    ]
}
