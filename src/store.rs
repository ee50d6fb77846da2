//! Versioned document storage backed by a sled tree
//!
//! Every cart is stored as a single CBOR record holding the document, its
//! version and the time of the last mutation. Keeping the pair in one value
//! means each sled compare-and-swap replaces document and version together,
//! so readers only ever observe the state before or after a mutation.
use std::sync::Arc;

use chrono::Utc;
use sled::IVec;
use tracing::{debug, info, warn};

use crate::cart::StateDocument;
use crate::error::CartError;
use crate::types::{CartId, TimeStamp, Version, Versioned};

const CART_TREE: &str = "carts";

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
struct VersionedRecord {
    #[n(0)]
    version: Version,
    #[n(1)]
    updated_at: TimeStamp<Utc>,
    #[n(2)]
    document: StateDocument,
}

impl VersionedRecord {
    fn encode(&self) -> Result<Vec<u8>, CartError> {
        minicbor::to_vec(self).map_err(|e| CartError::Encoding(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, CartError> {
        Ok(minicbor::decode(bytes)?)
    }

    fn into_versioned(self) -> Versioned<StateDocument> {
        Versioned {
            value: self.document,
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

pub struct VersionedStore {
    instance: Arc<sled::Db>,
    carts: sled::Tree,
}

impl VersionedStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, CartError> {
        let carts = instance.open_tree(CART_TREE)?;
        Ok(Self { instance, carts })
    }

    /// Stores `document` at the initial version unless the cart already exists.
    ///
    /// Returns `None` when a record was already present; it is left as is.
    pub fn create(
        &self,
        cart_id: &CartId,
        document: StateDocument,
    ) -> Result<Option<Versioned<StateDocument>>, CartError> {
        let record = VersionedRecord {
            version: Version::INITIAL,
            updated_at: TimeStamp::now(),
            document,
        };

        let created = self
            .carts
            .compare_and_swap(cart_id.as_bytes(), None::<&[u8]>, Some(record.encode()?))?;

        match created {
            Ok(()) => {
                info!(cart = %cart_id, version = %record.version, "cart created");
                Ok(Some(record.into_versioned()))
            }
            Err(_) => {
                debug!(cart = %cart_id, "cart already exists");
                Ok(None)
            }
        }
    }

    pub fn exists(&self, cart_id: &CartId) -> Result<bool, CartError> {
        Ok(self.carts.contains_key(cart_id.as_bytes())?)
    }

    /// Current document and version. Never changes the stored record.
    pub fn read(&self, cart_id: &CartId) -> Result<Versioned<StateDocument>, CartError> {
        let (_, record) = self.load(cart_id)?;
        debug!(cart = %cart_id, version = %record.version, "cart read");
        Ok(record.into_versioned())
    }

    /// Replaces the document wholesale if `expected` is the current version.
    ///
    /// On mismatch nothing is written and the conflict carries the current
    /// version. The document is validated only once the version matches.
    /// There is no retry: losing a race to another writer is also a
    /// conflict, since every accepted mutation advances the version.
    pub fn conditional_write(
        &self,
        cart_id: &CartId,
        document: StateDocument,
        expected: Version,
    ) -> Result<Version, CartError> {
        let (raw, current) = self.load(cart_id)?;

        if current.version != expected {
            warn!(
                cart = %cart_id,
                requested = %expected,
                current = %current.version,
                "version conflict"
            );
            return Err(CartError::VersionConflict {
                requested: expected,
                current: current.version,
            });
        }

        document.validate()?;

        let next = VersionedRecord {
            version: current.version.next()?,
            updated_at: TimeStamp::now(),
            document,
        };

        match self
            .carts
            .compare_and_swap(cart_id.as_bytes(), Some(&raw), Some(next.encode()?))?
        {
            Ok(()) => {
                info!(cart = %cart_id, version = %next.version, "state replaced");
                Ok(next.version)
            }
            Err(swap) => {
                let winner = swap
                    .current
                    .ok_or_else(|| CartError::NotFound(cart_id.clone()))?;
                let winner = VersionedRecord::decode(&winner)?;
                warn!(
                    cart = %cart_id,
                    requested = %expected,
                    current = %winner.version,
                    "lost race on conditional write"
                );
                Err(CartError::VersionConflict {
                    requested: expected,
                    current: winner.version,
                })
            }
        }
    }

    /// Applies `mutation` to whatever document is current and advances the
    /// version.
    ///
    /// The read-modify-swap cycle repeats only when another writer committed
    /// in between, so `mutation` may run more than once and must not have
    /// side effects. An error from `mutation` aborts without writing.
    pub fn mutate<F>(
        &self,
        cart_id: &CartId,
        mutation: F,
    ) -> Result<Versioned<StateDocument>, CartError>
    where
        F: Fn(&mut StateDocument) -> Result<(), CartError>,
    {
        loop {
            let (raw, mut record) = self.load(cart_id)?;

            mutation(&mut record.document)?;
            record.version = record.version.next()?;
            record.updated_at = TimeStamp::now();

            match self
                .carts
                .compare_and_swap(cart_id.as_bytes(), Some(&raw), Some(record.encode()?))?
            {
                Ok(()) => {
                    info!(cart = %cart_id, version = %record.version, "state mutated");
                    return Ok(record.into_versioned());
                }
                Err(_) => debug!(cart = %cart_id, "concurrent write detected, retrying"),
            }
        }
    }

    pub fn flush(&self) -> Result<(), CartError> {
        self.instance.flush()?;
        Ok(())
    }

    fn load(&self, cart_id: &CartId) -> Result<(IVec, VersionedRecord), CartError> {
        let raw = self
            .carts
            .get(cart_id.as_bytes())?
            .ok_or_else(|| CartError::NotFound(cart_id.clone()))?;
        let record = VersionedRecord::decode(&raw)?;
        Ok((raw, record))
    }
}
