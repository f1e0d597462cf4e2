//! Random inputs for generated entities.

use alloy_primitives::{B256, U256, keccak256};
use rand::{Rng, SeedableRng, distr::Alphanumeric};
use rand_chacha::ChaCha8Rng;

use crate::constants::{
    DATA_HASH_SEED_LEN, MAX_LISTING_PRICE_WEI, METADATA_LEN, MIN_LISTING_PRICE_WEI, WATERMARK_LEN,
};

/// Creates the harness RNG, seeded when a seed is given.
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// Returns a random ASCII alphanumeric string of `len` characters.
pub fn random_string<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Returns the keccak256 of a random 32-character alphanumeric string.
pub fn random_data_hash<R: Rng>(rng: &mut R) -> B256 {
    keccak256(random_string(rng, DATA_HASH_SEED_LEN).as_bytes())
}

/// Returns random metadata for a registered resource.
pub fn random_metadata<R: Rng>(rng: &mut R) -> String {
    random_string(rng, METADATA_LEN)
}

/// Returns random watermark features for a registered resource.
pub fn random_watermark<R: Rng>(rng: &mut R) -> String {
    random_string(rng, WATERMARK_LEN)
}

/// Returns a listing price drawn uniformly from 0.001 to 0.01 ETH.
pub fn random_listing_price<R: Rng>(rng: &mut R) -> U256 {
    U256::from(rng.random_range(MIN_LISTING_PRICE_WEI..=MAX_LISTING_PRICE_WEI))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_is_alphanumeric() {
        let mut rng = rng_from_seed(Some(1));
        let s = random_string(&mut rng, 64);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(random_metadata(&mut rng).len(), METADATA_LEN);
        assert_eq!(random_watermark(&mut rng).len(), WATERMARK_LEN);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = random_data_hash(&mut rng_from_seed(Some(42)));
        let b = random_data_hash(&mut rng_from_seed(Some(42)));
        let c = random_data_hash(&mut rng_from_seed(Some(43)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_listing_price_bounds() {
        let mut rng = rng_from_seed(Some(9));
        for _ in 0..1_000 {
            let price = random_listing_price(&mut rng);
            assert!(price >= U256::from(MIN_LISTING_PRICE_WEI));
            assert!(price <= U256::from(MAX_LISTING_PRICE_WEI));
        }
    }
}
