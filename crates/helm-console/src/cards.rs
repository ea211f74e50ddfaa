//! Cards page controller.
//!
//! Owns the card list snapshot and the PIN dialog, registers the single
//! card-owned intent, and gates the add-card affordance on the permission
//! table.

use crate::collaborator::CardVault;
use crate::data::{CardBrand, CreditCard};
use crate::dialog::{PinDialog, PinDialogEvent};
use crate::error::{ConsoleError, Result};
use helm_core::{
    allowed, arg_str, ArgMap, Capability, CurrentUser, Intent, IntentRegistry, NavigationTicket,
    OutcomeReceiver, Page, ParamKind, ParameterSpec,
};
use std::sync::Arc;

pub const CHANGE_PIN: &str = "change-pin";

/// The mounted cards page.
pub struct CardsPage {
    user: CurrentUser,
    vault: Arc<dyn CardVault>,
    registry: IntentRegistry,
    cards: Vec<CreditCard>,
    pin_dialog: PinDialog,
}

impl CardsPage {
    /// Mount the page: register the change-pin intent, snapshot the vault,
    /// and consume a navigation ticket if one was carried here.
    pub async fn mount(
        user: CurrentUser,
        vault: Arc<dyn CardVault>,
        registry: IntentRegistry,
        ticket: Option<&NavigationTicket>,
    ) -> Self {
        let intent = Intent::new(CHANGE_PIN, Page::Cards)
            .with_description("Change the PIN of a corporate card; opens the PIN dialog")
            .with_param(ParameterSpec::optional(
                "cardId",
                ParamKind::String,
                "The ID of the card to change the PIN of",
            ));
        if let Err(e) = registry.register(intent) {
            tracing::error!("Cards page intent registration failed: {}", e);
        }

        let cards = vault.list().await;
        let mut page = Self {
            user,
            vault,
            registry,
            cards,
            pin_dialog: PinDialog::Closed,
        };
        if let Some(ticket) = ticket {
            page.resume(ticket);
        }
        page
    }

    pub fn unmount(&self) {
        self.registry.unregister(CHANGE_PIN);
    }

    /// Consume a resumed operation: open the PIN dialog. Without a card id
    /// the dialog targets the first card, matching the direct affordance.
    fn resume(&mut self, ticket: &NavigationTicket) {
        let Some(operation) = ticket.operation.as_deref() else {
            return;
        };
        if operation != CHANGE_PIN {
            tracing::warn!("Cards page ignoring unknown resumed operation: {}", operation);
            return;
        }

        let card_id = arg_str(&ticket.args, "cardId")
            .map(str::to_string)
            .or_else(|| self.cards.first().map(|c| c.id.clone()));
        match card_id {
            Some(card_id) => self.apply_pin_dialog(PinDialogEvent::Open { card_id }),
            None => tracing::warn!("Resumed change-pin with no cards on file; ignored"),
        }
    }

    pub fn cards(&self) -> &[CreditCard] {
        &self.cards
    }

    /// Re-snapshot the card list from the vault.
    pub async fn refresh(&mut self) {
        self.cards = self.vault.list().await;
    }

    pub fn pin_dialog(&self) -> &PinDialog {
        &self.pin_dialog
    }

    pub fn apply_pin_dialog(&mut self, event: PinDialogEvent) {
        self.pin_dialog = std::mem::take(&mut self.pin_dialog).apply(event);
    }

    /// Render the affordance for a locally dispatched intent. Change-pin is
    /// dialog-backed: opening the dialog is the affordance, so the outcome
    /// resolves immediately.
    pub fn propose(&mut self, intent: &Intent, args: ArgMap) -> OutcomeReceiver {
        self.resume(&NavigationTicket::new(
            Page::Cards,
            Some(intent.name.clone()),
            args,
        ));
        helm_core::resolved_outcome("Opened the PIN dialog")
    }

    /// May the current user see the add-card affordance?
    pub fn can_add_card(&self) -> bool {
        allowed(Capability::AddCard, self.user.role)
    }

    /// Direct add-card affordance. Checked against the permission table
    /// before the vault is touched.
    pub async fn add_card(&mut self, brand: CardBrand) -> Result<CreditCard> {
        if !self.can_add_card() {
            return Err(ConsoleError::PermissionDenied(
                "Only admins can add new cards".to_string(),
            ));
        }
        let card = self.vault.add_card(brand).await?;
        self.refresh().await;
        Ok(card)
    }

    /// Submit the open PIN dialog: run the vault mutation, then reset.
    pub async fn submit_pin(&mut self) -> Result<()> {
        let state = std::mem::take(&mut self.pin_dialog);
        let PinDialog::Open { card_id, pin, .. } = state else {
            return Err(ConsoleError::NoDialogOpen);
        };
        self.vault.change_pin(&card_id, &pin).await?;
        Ok(())
    }

    pub fn cancel_pin(&mut self) {
        self.apply_pin_dialog(PinDialogEvent::Cancel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::InMemoryVault;
    use crate::data::seed_cards;
    use helm_core::Role;
    use serde_json::json;

    fn admin() -> CurrentUser {
        CurrentUser::new("u1", "Dana Reyes", Role::Admin)
    }

    #[tokio::test]
    async fn test_mount_registers_change_pin() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        let registry = IntentRegistry::new();
        let page = CardsPage::mount(admin(), vault, registry.clone(), None).await;

        assert!(registry.resolve(CHANGE_PIN).is_some());
        page.unmount();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_resume_opens_pin_dialog_for_named_card() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        let registry = IntentRegistry::new();

        let mut args = ArgMap::new();
        args.insert("cardId".to_string(), json!("card-2"));
        let ticket = NavigationTicket::new(Page::Cards, Some(CHANGE_PIN.to_string()), args);

        let page = CardsPage::mount(admin(), vault, registry, Some(&ticket)).await;
        assert_eq!(page.pin_dialog().card_id(), Some("card-2"));
    }

    #[tokio::test]
    async fn test_resume_without_card_id_targets_first_card() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        let registry = IntentRegistry::new();
        let ticket =
            NavigationTicket::new(Page::Cards, Some(CHANGE_PIN.to_string()), ArgMap::new());

        let page = CardsPage::mount(admin(), vault, registry, Some(&ticket)).await;
        assert_eq!(page.pin_dialog().card_id(), Some("card-1"));
    }

    #[tokio::test]
    async fn test_add_card_denied_for_member() {
        let member = CurrentUser::new("u2", "Omar Haddad", Role::Member);
        let vault = InMemoryVault::new(member.clone(), seed_cards());
        let registry = IntentRegistry::new();
        let mut page = CardsPage::mount(member, vault, registry, None).await;

        assert!(!page.can_add_card());
        let err = page.add_card(CardBrand::Visa).await.unwrap_err();
        assert!(matches!(err, ConsoleError::PermissionDenied(_)));
        assert_eq!(page.cards().len(), 2);
    }

    #[tokio::test]
    async fn test_add_card_as_admin_refreshes_list() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        let registry = IntentRegistry::new();
        let mut page = CardsPage::mount(admin(), vault, registry, None).await;

        let card = page.add_card(CardBrand::MasterCard).await.unwrap();
        assert_eq!(card.brand, CardBrand::MasterCard);
        assert_eq!(page.cards().len(), 3);
    }

    #[tokio::test]
    async fn test_submit_pin_requires_open_dialog() {
        let vault = InMemoryVault::new(admin(), seed_cards());
        let registry = IntentRegistry::new();
        let mut page = CardsPage::mount(admin(), vault, registry, None).await;

        assert!(matches!(
            page.submit_pin().await,
            Err(ConsoleError::NoDialogOpen)
        ));

        page.apply_pin_dialog(PinDialogEvent::Open {
            card_id: "card-1".to_string(),
        });
        page.apply_pin_dialog(PinDialogEvent::SetPin("4321".to_string()));
        page.submit_pin().await.unwrap();
        assert!(!page.pin_dialog().is_open());
    }
}
