//! Collaborator interfaces: the external asynchronous functions performing
//! the actual data mutations.
//!
//! The protocol core treats these as opaque and never interprets their
//! errors. The in-memory implementations here back the demo binary and the
//! tests; they re-check permissions on their side of the boundary, since
//! client-side gating is advisory only.

use crate::data::{CardBrand, CreditCard, ExpensePolicy, ExpenseTeam, TeamMember};
use async_trait::async_trait;
use helm_core::{allowed, Capability, CurrentUser, Role};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use thiserror::Error;

/// Implementation-defined collaborator failure. Opaque to the protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type CollaboratorResult = std::result::Result<(), CollaboratorError>;

/// Team roster CRUD consumed by the team page controller.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn list(&self) -> Vec<TeamMember>;
    async fn invite_member(&self, email: &str, role: Role, team: ExpenseTeam)
        -> CollaboratorResult;
    async fn remove_member(&self, id: &str) -> CollaboratorResult;
    async fn change_member_role(&self, id: &str, role: Role) -> CollaboratorResult;
    async fn change_member_team(&self, id: &str, team: ExpenseTeam) -> CollaboratorResult;
}

/// Card CRUD consumed by the cards page controller.
#[async_trait]
pub trait CardVault: Send + Sync {
    async fn list(&self) -> Vec<CreditCard>;
    async fn add_card(&self, brand: CardBrand) -> std::result::Result<CreditCard, CollaboratorError>;
    async fn change_pin(&self, card_id: &str, pin: &str) -> CollaboratorResult;
}

/// Shared failure-injection switch for the in-memory collaborators.
#[derive(Default)]
struct FailureSwitch(Mutex<Option<String>>);

impl FailureSwitch {
    fn arm(&self, message: impl Into<String>) {
        *self.0.lock() = Some(message.into());
    }

    fn trip(&self) -> CollaboratorResult {
        match self.0.lock().take() {
            Some(message) => Err(CollaboratorError::Rejected(message)),
            None => Ok(()),
        }
    }
}

/// In-memory team directory.
pub struct InMemoryDirectory {
    members: Arc<RwLock<Vec<TeamMember>>>,
    actor: CurrentUser,
    failure: FailureSwitch,
    next_id: Mutex<u64>,
}

impl InMemoryDirectory {
    pub fn new(actor: CurrentUser, members: Vec<TeamMember>) -> Arc<Self> {
        let next_id = members
            .iter()
            .filter_map(|m| m.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Arc::new(Self {
            members: Arc::new(RwLock::new(members)),
            actor,
            failure: FailureSwitch::default(),
            next_id: Mutex::new(next_id),
        })
    }

    /// Make the next mutation fail with `message`. Test hook.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failure.arm(message);
    }

    fn check(&self, capability: Capability) -> CollaboratorResult {
        if allowed(capability, self.actor.role) {
            Ok(())
        } else {
            Err(CollaboratorError::Rejected(format!(
                "{} is not permitted for role {}",
                self.actor.name, self.actor.role
            )))
        }
    }
}

#[async_trait]
impl TeamDirectory for InMemoryDirectory {
    async fn list(&self) -> Vec<TeamMember> {
        self.members.read().clone()
    }

    async fn invite_member(
        &self,
        email: &str,
        role: Role,
        team: ExpenseTeam,
    ) -> CollaboratorResult {
        self.check(Capability::InviteMember)?;
        self.failure.trip()?;

        let id = {
            let mut next = self.next_id.lock();
            let id = next.to_string();
            *next += 1;
            id
        };
        let name = email.split('@').next().unwrap_or(email).to_string();
        self.members.write().push(TeamMember {
            id,
            name,
            email: email.to_string(),
            role,
            team,
        });
        Ok(())
    }

    async fn remove_member(&self, id: &str) -> CollaboratorResult {
        self.check(Capability::RemoveMember)?;
        self.failure.trip()?;

        let mut members = self.members.write();
        let before = members.len();
        members.retain(|m| m.id != id);
        if members.len() == before {
            return Err(CollaboratorError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn change_member_role(&self, id: &str, role: Role) -> CollaboratorResult {
        self.check(Capability::EditMember)?;
        self.failure.trip()?;

        let mut members = self.members.write();
        match members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.role = role;
                Ok(())
            }
            None => Err(CollaboratorError::NotFound(id.to_string())),
        }
    }

    async fn change_member_team(&self, id: &str, team: ExpenseTeam) -> CollaboratorResult {
        self.check(Capability::EditMember)?;
        self.failure.trip()?;

        let mut members = self.members.write();
        match members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.team = team;
                Ok(())
            }
            None => Err(CollaboratorError::NotFound(id.to_string())),
        }
    }
}

/// In-memory card vault.
pub struct InMemoryVault {
    cards: Arc<RwLock<Vec<CreditCard>>>,
    actor: CurrentUser,
    failure: FailureSwitch,
    next_id: Mutex<u64>,
}

impl InMemoryVault {
    pub fn new(actor: CurrentUser, cards: Vec<CreditCard>) -> Arc<Self> {
        let next_id = cards.len() as u64 + 1;
        Arc::new(Self {
            cards: Arc::new(RwLock::new(cards)),
            actor,
            failure: FailureSwitch::default(),
            next_id: Mutex::new(next_id),
        })
    }

    /// Make the next mutation fail with `message`. Test hook.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failure.arm(message);
    }

    fn check(&self, capability: Capability) -> CollaboratorResult {
        if allowed(capability, self.actor.role) {
            Ok(())
        } else {
            Err(CollaboratorError::Rejected(format!(
                "{} is not permitted for role {}",
                self.actor.name, self.actor.role
            )))
        }
    }
}

#[async_trait]
impl CardVault for InMemoryVault {
    async fn list(&self) -> Vec<CreditCard> {
        self.cards.read().clone()
    }

    async fn add_card(
        &self,
        brand: CardBrand,
    ) -> std::result::Result<CreditCard, CollaboratorError> {
        self.check(Capability::AddCard)?;
        self.failure.trip()?;

        let serial = {
            let mut next = self.next_id.lock();
            let serial = *next;
            *next += 1;
            serial
        };
        let card = CreditCard {
            id: format!("card-{serial}"),
            brand,
            last4: format!("{:04}", 1000 + serial * 7 % 9000),
            expiry: "01/29".to_string(),
            policy: Some(ExpensePolicy {
                limit: 2500,
                spent: 0,
            }),
        };
        self.cards.write().push(card.clone());
        Ok(card)
    }

    async fn change_pin(&self, card_id: &str, _pin: &str) -> CollaboratorResult {
        self.check(Capability::ChangePin)?;
        self.failure.trip()?;

        if self.cards.read().iter().any(|c| c.id == card_id) {
            Ok(())
        } else {
            Err(CollaboratorError::NotFound(card_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{seed_cards, seed_team};

    fn admin() -> CurrentUser {
        CurrentUser::new("u1", "Dana Reyes", Role::Admin)
    }

    #[tokio::test]
    async fn test_directory_crud() {
        let directory = InMemoryDirectory::new(admin(), seed_team());

        directory
            .invite_member("lena@acme.dev", Role::Member, ExpenseTeam::Operations)
            .await
            .unwrap();
        assert_eq!(directory.list().await.len(), 4);

        directory.change_member_role("2", Role::Admin).await.unwrap();
        let omar = directory
            .list()
            .await
            .into_iter()
            .find(|m| m.id == "2")
            .unwrap();
        assert_eq!(omar.role, Role::Admin);

        directory.remove_member("3").await.unwrap();
        assert_eq!(directory.list().await.len(), 3);

        assert_eq!(
            directory.remove_member("99").await,
            Err(CollaboratorError::NotFound("99".to_string()))
        );
    }

    #[tokio::test]
    async fn test_directory_rechecks_permissions() {
        let member = CurrentUser::new("u2", "Omar Haddad", Role::Member);
        let directory = InMemoryDirectory::new(member, seed_team());

        let result = directory.remove_member("1").await;
        assert!(matches!(result, Err(CollaboratorError::Rejected(_))));
        assert_eq!(directory.list().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let directory = InMemoryDirectory::new(admin(), seed_team());
        directory.fail_next("directory offline");

        assert!(directory.remove_member("2").await.is_err());
        assert!(directory.remove_member("2").await.is_ok());
    }

    #[tokio::test]
    async fn test_vault_add_card_gated() {
        let member = CurrentUser::new("u2", "Omar Haddad", Role::Member);
        let vault = InMemoryVault::new(member, seed_cards());
        assert!(matches!(
            vault.add_card(CardBrand::Visa).await,
            Err(CollaboratorError::Rejected(_))
        ));

        let vault = InMemoryVault::new(admin(), seed_cards());
        let card = vault.add_card(CardBrand::Visa).await.unwrap();
        assert_eq!(card.brand, CardBrand::Visa);
        assert_eq!(vault.list().await.len(), 3);
    }

    #[tokio::test]
    async fn test_change_pin_unknown_card() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        assert!(vault.change_pin("card-1", "0000").await.is_ok());
        assert_eq!(
            vault.change_pin("card-9", "0000").await,
            Err(CollaboratorError::NotFound("card-9".to_string()))
        );
    }
}
