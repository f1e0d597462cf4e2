//! Fixed pool of node-managed sender accounts.

use alloy_primitives::Address;
use rand::Rng;

use crate::error::{BenchError, BenchResult};

/// Non-empty, fixed-size list of accounts used as senders and counterparties.
///
/// Positions wrap around, so `get(i)` is valid for every `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPool {
    accounts: Vec<Address>,
}

impl AccountPool {
    /// Creates a pool from the given accounts.
    ///
    /// Returns [`BenchError::NoAccounts`] if the list is empty.
    pub fn new(accounts: Vec<Address>) -> BenchResult<Self> {
        if accounts.is_empty() {
            return Err(BenchError::NoAccounts);
        }
        Ok(Self { accounts })
    }

    /// Takes at most `limit` accounts from the front of `available`.
    pub fn take(available: Vec<Address>, limit: usize) -> BenchResult<Self> {
        Self::new(available.into_iter().take(limit).collect())
    }

    /// Number of accounts in the pool.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Always false: a pool holds at least one account.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Account at round-robin position `i`.
    pub fn get(&self, i: usize) -> Address {
        self.accounts[i % self.accounts.len()]
    }

    /// Account following `account` in the pool, wrapping at the end.
    ///
    /// An account outside the pool maps to the first pool account.
    pub fn next_after(&self, account: Address) -> Address {
        self.position(account).map_or(self.accounts[0], |pos| self.get(pos + 1))
    }

    /// Position of `account` in the pool.
    pub fn position(&self, account: Address) -> Option<usize> {
        self.accounts.iter().position(|a| *a == account)
    }

    /// Uniformly random account.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Address {
        self.accounts[rng.random_range(0..self.accounts.len())]
    }

    /// All accounts in pool order.
    pub fn as_slice(&self) -> &[Address] {
        &self.accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::rng_from_seed;

    fn pool(n: u8) -> AccountPool {
        AccountPool::new((1..=n).map(Address::repeat_byte).collect()).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(AccountPool::new(vec![]), Err(BenchError::NoAccounts)));
        assert!(matches!(AccountPool::take(vec![Address::ZERO], 0), Err(BenchError::NoAccounts)));
    }

    #[test]
    fn test_round_robin_wraps() {
        let pool = pool(3);
        assert_eq!(pool.get(0), Address::repeat_byte(1));
        assert_eq!(pool.get(3), Address::repeat_byte(1));
        assert_eq!(pool.get(5), Address::repeat_byte(3));
    }

    #[test]
    fn test_next_after() {
        let pool = pool(3);
        assert_eq!(pool.next_after(Address::repeat_byte(1)), Address::repeat_byte(2));
        assert_eq!(pool.next_after(Address::repeat_byte(3)), Address::repeat_byte(1));
        assert_eq!(pool.next_after(Address::repeat_byte(9)), Address::repeat_byte(1));

        let single = super::AccountPool::new(vec![Address::repeat_byte(7)]).unwrap();
        assert_eq!(single.next_after(Address::repeat_byte(7)), Address::repeat_byte(7));
    }

    #[test]
    fn test_take_limits_pool() {
        let available: Vec<_> = (1..=20).map(Address::repeat_byte).collect();
        let pool = AccountPool::take(available, 10).unwrap();
        assert_eq!(pool.len(), 10);
        assert_eq!(pool.as_slice()[9], Address::repeat_byte(10));
    }

    #[test]
    fn test_random_stays_in_pool() {
        let pool = pool(4);
        let mut rng = rng_from_seed(Some(3));
        for _ in 0..100 {
            assert!(pool.position(pool.random(&mut rng)).is_some());
        }
    }
}
