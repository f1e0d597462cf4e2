//! Entities created during setup and the corpus that holds them.

use std::collections::HashSet;

use alloy_primitives::{Address, B256};
use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;

use crate::{
    derive::{derive_authorization_id, derive_data_id, derive_product_id},
    gateway::BlockContext,
    operations::EntityKind,
};

/// A registered data resource and every input of its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRecord {
    /// Derived resource ID.
    pub id: B256,
    /// Content hash sent at registration.
    pub data_hash: B256,
    /// Metadata sent at registration.
    pub metadata: String,
    /// Watermark features sent at registration.
    pub watermark: String,
    /// Block the registration was included in.
    pub block: BlockContext,
    /// Registering account.
    pub owner: Address,
}

impl DataRecord {
    /// Recomputes the ID from the recorded inputs.
    pub fn rederive(&self) -> B256 {
        derive_data_id(self.data_hash, &self.metadata, &self.block, self.owner)
    }
}

/// A granted processing right and every input of its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRecord {
    /// Derived authorization ID.
    pub id: B256,
    /// Data resource the right applies to.
    pub data_id: B256,
    /// Granting owner.
    pub grantor: Address,
    /// Receiving account.
    pub grantee: Address,
    /// Block the grant was included in.
    pub block: BlockContext,
}

impl AuthorizationRecord {
    /// Recomputes the ID from the recorded inputs.
    pub fn rederive(&self) -> B256 {
        derive_authorization_id(self.data_id, self.grantee, &self.block, self.grantor)
    }
}

/// A created data product and every input of its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    /// Derived product ID.
    pub id: B256,
    /// Source data resource.
    pub original_data_id: B256,
    /// Product metadata.
    pub metadata: String,
    /// Block the creation was included in.
    pub block: BlockContext,
    /// Creating account.
    pub creator: Address,
}

impl ProductRecord {
    /// Recomputes the ID from the recorded inputs.
    pub fn rederive(&self) -> B256 {
        derive_product_id(self.original_data_id, &self.metadata, &self.block, self.creator)
    }
}

/// The entities available to benchmark batches.
///
/// Append-only while the dataset is being built and read-only afterwards: the
/// only way to obtain a populated corpus outside this crate is to finish a
/// dataset build.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    data: Vec<DataRecord>,
    authorizations: Vec<AuthorizationRecord>,
    products: Vec<ProductRecord>,
    data_ids: HashSet<B256>,
}

impl Corpus {
    /// Appends a data record.
    pub(crate) fn push_data(&mut self, record: DataRecord) {
        self.data_ids.insert(record.id);
        self.data.push(record);
    }

    /// Appends an authorization. Returns false, appending nothing, if its
    /// data record is not in the corpus.
    #[must_use]
    pub(crate) fn push_authorization(&mut self, record: AuthorizationRecord) -> bool {
        if !self.data_ids.contains(&record.data_id) {
            return false;
        }
        self.authorizations.push(record);
        true
    }

    /// Appends a product. Returns false, appending nothing, if its source
    /// data record is not in the corpus.
    #[must_use]
    pub(crate) fn push_product(&mut self, record: ProductRecord) -> bool {
        if !self.data_ids.contains(&record.original_data_id) {
            return false;
        }
        self.products.push(record);
        true
    }

    /// Registered data resources in creation order.
    pub fn data(&self) -> &[DataRecord] {
        &self.data
    }

    /// Granted authorizations in creation order.
    pub fn authorizations(&self) -> &[AuthorizationRecord] {
        &self.authorizations
    }

    /// Created products in creation order.
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Data => self.data.len(),
            EntityKind::Authorization => self.authorizations.len(),
            EntityKind::Product => self.products.len(),
        }
    }

    /// Returns true if the corpus holds no entities at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.authorizations.is_empty() && self.products.is_empty()
    }

    /// Data record at round-robin position `i`.
    pub fn data_at(&self, i: usize) -> Option<&DataRecord> {
        if self.data.is_empty() { None } else { self.data.get(i % self.data.len()) }
    }

    /// Uniformly sampled data record.
    pub fn sample_data<R: Rng>(&self, rng: &mut R) -> Option<&DataRecord> {
        self.data.choose(rng)
    }

    /// Uniformly sampled authorization.
    pub fn sample_authorization<R: Rng>(&self, rng: &mut R) -> Option<&AuthorizationRecord> {
        self.authorizations.choose(rng)
    }

    /// Uniformly sampled product.
    pub fn sample_product<R: Rng>(&self, rng: &mut R) -> Option<&ProductRecord> {
        self.products.choose(rng)
    }
}
