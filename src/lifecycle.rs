//! Creation and reset of cart instances
use tracing::info;

use crate::cart::StateDocument;
use crate::error::CartError;
use crate::store::VersionedStore;
use crate::types::{CartId, Versioned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    Uninitialized,
    Active,
}

pub struct LifecycleController<'a> {
    store: &'a VersionedStore,
}

impl<'a> LifecycleController<'a> {
    pub fn new(store: &'a VersionedStore) -> Self {
        Self { store }
    }

    pub fn state(&self, cart_id: &CartId) -> Result<CartState, CartError> {
        if self.store.exists(cart_id)? {
            Ok(CartState::Active)
        } else {
            Ok(CartState::Uninitialized)
        }
    }

    /// Creates the zero document for a new cart.
    ///
    /// Running it again on an existing cart overwrites the document with the
    /// same zero value and advances the version.
    pub fn initialize(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        match self.store.create(cart_id, StateDocument::empty())? {
            Some(created) => Ok(created),
            None => {
                info!(cart = %cart_id, "cart re-initialized");
                self.store.mutate(cart_id, |doc| {
                    doc.clear();
                    Ok(())
                })
            }
        }
    }

    /// Makes sure the cart exists, creating the zero document if it does not.
    /// Existing carts are left untouched.
    pub fn ensure(&self, cart_id: &CartId) -> Result<(), CartError> {
        if self.state(cart_id)? == CartState::Uninitialized {
            self.store.create(cart_id, StateDocument::empty())?;
        }
        Ok(())
    }

    /// Unconditionally resets the document to the zero value.
    pub fn clean(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        self.store.mutate(cart_id, |doc| {
            doc.clear();
            Ok(())
        })
    }
}
