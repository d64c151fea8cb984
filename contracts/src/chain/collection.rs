//! Non-fungible item collections.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use lockbox_protocol::types::{Address, ItemId};

use super::ChainError;

/// How a collection contract treats transfers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionBehavior {
    #[default]
    Standard,
    /// Reports success on `transfer_from` but never moves the item.
    IgnoresTransfers,
}

/// State of one item collection contract.
#[derive(Clone, Debug, Default)]
pub struct ItemCollection {
    pub name: String,
    pub behavior: CollectionBehavior,
    owners: HashMap<ItemId, Address>,
    /// `(owner, operator)` pairs with blanket approval.
    operators: HashSet<(Address, Address)>,
}

impl ItemCollection {
    pub fn new(name: impl Into<String>, behavior: CollectionBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            ..Self::default()
        }
    }

    pub fn owner_of(&self, item_id: ItemId) -> Option<Address> {
        self.owners.get(&item_id).copied()
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*owner, *operator))
    }

    pub(crate) fn mint(
        &mut self,
        collection: Address,
        to: Address,
        item_id: ItemId,
    ) -> Result<(), ChainError> {
        if self.owners.contains_key(&item_id) {
            return Err(ChainError::ItemAlreadyMinted {
                collection,
                item_id,
            });
        }
        self.owners.insert(item_id, to);
        Ok(())
    }

    pub(crate) fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((owner, operator));
        } else {
            self.operators.remove(&(owner, operator));
        }
    }

    pub(crate) fn transfer_from(
        &mut self,
        collection: Address,
        operator: Address,
        from: Address,
        to: Address,
        item_id: ItemId,
    ) -> Result<(), ChainError> {
        let owner = self
            .owner_of(item_id)
            .ok_or(ChainError::UnknownItem {
                collection,
                item_id,
            })?;
        if owner != from {
            return Err(ChainError::ItemNotOwned {
                collection,
                item_id,
                from,
            });
        }
        if operator != owner && !self.is_approved_for_all(&owner, &operator) {
            return Err(ChainError::NotApproved {
                collection,
                item_id,
                operator,
            });
        }

        if self.behavior == CollectionBehavior::IgnoresTransfers {
            return Ok(());
        }
        self.owners.insert(item_id, to);
        Ok(())
    }
}
