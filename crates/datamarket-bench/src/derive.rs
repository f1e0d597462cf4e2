//! Content-addressed identifier derivation.
//!
//! The contracts derive every entity ID as
//! `keccak256(abi.encodePacked(field, .., block.timestamp, msg.sender))`. The
//! functions here reproduce that scheme so the harness can reference entities
//! it just created without asking the node for their IDs.
//!
//! Every derivation takes the [`BlockContext`] of the block the creating
//! transaction was included in. Reusing one context for several derivations
//! produces IDs that only match for the first entity of that block, so callers
//! must fetch a fresh context per derivation.

use alloy_primitives::{Address, B256, U256, keccak256};

use crate::gateway::BlockContext;

/// Builder for Solidity's non-standard packed encoding (`abi.encodePacked`).
#[derive(Debug, Default, Clone)]
pub struct PackedEncoder {
    buf: Vec<u8>,
}

impl PackedEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `bytes32` as its 32 raw bytes.
    pub fn bytes32(mut self, value: B256) -> Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Appends a `string` as its raw UTF-8 bytes, without length prefix.
    pub fn string(mut self, value: &str) -> Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Appends a `uint256` as 32 big-endian bytes.
    pub fn uint256(mut self, value: U256) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Appends an `address` as its 20 raw bytes.
    ///
    /// Checksum casing only exists in the hex representation, so any
    /// spelling of the same account encodes identically.
    pub fn address(mut self, value: Address) -> Self {
        self.buf.extend_from_slice(value.as_slice());
        self
    }

    /// Returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hashes the encoded bytes with keccak256.
    pub fn finish(self) -> B256 {
        keccak256(&self.buf)
    }
}

/// Derives the ID `registerDataResource` assigns to a data resource.
///
/// `keccak256(abi.encodePacked(dataHash, metadata, block.timestamp, owner))`
pub fn derive_data_id(
    data_hash: B256,
    metadata: &str,
    context: &BlockContext,
    owner: Address,
) -> B256 {
    PackedEncoder::new()
        .bytes32(data_hash)
        .string(metadata)
        .uint256(U256::from(context.timestamp))
        .address(owner)
        .finish()
}

/// Derives the ID `grantProcessingRight` assigns to an authorization.
///
/// `keccak256(abi.encodePacked(dataId, grantee, block.timestamp, grantor))`
pub fn derive_authorization_id(
    data_id: B256,
    grantee: Address,
    context: &BlockContext,
    grantor: Address,
) -> B256 {
    PackedEncoder::new()
        .bytes32(data_id)
        .address(grantee)
        .uint256(U256::from(context.timestamp))
        .address(grantor)
        .finish()
}

/// Derives the ID `createDataProduct` assigns to a product.
///
/// `keccak256(abi.encodePacked(originalDataId, productMetadata, block.timestamp, creator))`
pub fn derive_product_id(
    original_data_id: B256,
    product_metadata: &str,
    context: &BlockContext,
    creator: Address,
) -> B256 {
    PackedEncoder::new()
        .bytes32(original_data_id)
        .string(product_metadata)
        .uint256(U256::from(context.timestamp))
        .address(creator)
        .finish()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use alloy_primitives::{address, b256};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const OWNER: Address = address!("0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1");
    const OTHER: Address = address!("0xffcf8fdee72ac11b5c542428b35eef5769c409f0");
    const HASH: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    fn ctx(timestamp: u64) -> BlockContext {
        BlockContext { number: 7, timestamp }
    }

    #[test]
    fn test_packed_layout() {
        let encoded = PackedEncoder::new()
            .bytes32(HASH)
            .string("meta")
            .uint256(U256::from(0x0102u64))
            .address(OWNER);
        let bytes = encoded.as_bytes();

        assert_eq!(bytes.len(), 32 + 4 + 32 + 20);
        assert_eq!(&bytes[..32], HASH.as_slice());
        assert_eq!(&bytes[32..36], b"meta");
        assert!(bytes[36..66].iter().all(|b| *b == 0));
        assert_eq!(&bytes[66..68], &[0x01, 0x02]);
        assert_eq!(&bytes[68..], OWNER.as_slice());
    }

    #[test]
    fn test_data_id_matches_manual_hash() {
        let mut manual = Vec::new();
        manual.extend_from_slice(HASH.as_slice());
        manual.extend_from_slice(b"metadata");
        manual.extend_from_slice(&U256::from(1_700_000_000u64).to_be_bytes::<32>());
        manual.extend_from_slice(OWNER.as_slice());

        assert_eq!(derive_data_id(HASH, "metadata", &ctx(1_700_000_000), OWNER), keccak256(&manual));
    }

    #[test]
    fn test_authorization_id_field_order() {
        let id = derive_authorization_id(HASH, OTHER, &ctx(5), OWNER);
        let swapped = derive_authorization_id(HASH, OWNER, &ctx(5), OTHER);
        assert_ne!(id, swapped);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_product_id(HASH, "Test product 3", &ctx(42), OWNER);
        let b = derive_product_id(HASH, "Test product 3", &ctx(42), OWNER);
        assert_eq!(a, b);
    }

    #[test]
    fn test_each_field_changes_output() {
        let base = derive_data_id(HASH, "metadata", &ctx(100), OWNER);
        assert_ne!(base, derive_data_id(B256::ZERO, "metadata", &ctx(100), OWNER));
        assert_ne!(base, derive_data_id(HASH, "metadatb", &ctx(100), OWNER));
        assert_ne!(base, derive_data_id(HASH, "metadata", &ctx(101), OWNER));
        assert_ne!(base, derive_data_id(HASH, "metadata", &ctx(100), OTHER));
    }

    #[test]
    fn test_block_number_is_not_hashed() {
        let a = derive_data_id(HASH, "m", &BlockContext { number: 1, timestamp: 9 }, OWNER);
        let b = derive_data_id(HASH, "m", &BlockContext { number: 2, timestamp: 9 }, OWNER);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stale_context_breaks_later_ids() {
        // Two grants in consecutive blocks: reusing the first context only
        // reproduces the first ID.
        let first = ctx(1_000);
        let second = ctx(1_002);
        let expected_second = derive_authorization_id(HASH, OTHER, &second, OWNER);
        assert_ne!(derive_authorization_id(HASH, OTHER, &first, OWNER), expected_second);
    }

    #[test]
    fn test_no_collisions_across_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let data_hash = B256::from(rng.random::<[u8; 32]>());
            let owner = Address::from(rng.random::<[u8; 20]>());
            let metadata: String =
                (0..12).map(|_| char::from(rng.random_range(b'a'..=b'z'))).collect();
            let timestamp = rng.random_range(1_600_000_000u64..1_800_000_000);
            assert!(seen.insert(derive_data_id(data_hash, &metadata, &ctx(timestamp), owner)));
        }
    }
}
