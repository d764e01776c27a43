//! In-memory ledger backing mock mode.
//!
//! Models the two ledger properties the registry relies on:
//! - account creation at an address fails if the address already holds data
//! - a transaction applies all of its writes or none of them
//!
//! Uniqueness of commitments comes from the first property alone; the
//! client never takes its own lock around a commit.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::types::{AccountAddress, TransactionSignature};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account {0} already in use")]
    AccountInUse(String),

    #[error("Account {0} not found")]
    AccountNotFound(String),
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountAddress, Vec<u8>>,
    /// Transaction counter for generating mock signatures
    tx_counter: u64,
}

/// Shared in-memory account store.
#[derive(Debug, Default)]
pub struct MockLedger {
    state: RwLock<LedgerState>,
    /// Fixed clock for deterministic tests; `None` reads the system clock
    fixed_time: Option<i64>,
}

/// Staged writes of one mock transaction.
pub struct Transaction<'a> {
    accounts: &'a BTreeMap<AccountAddress, Vec<u8>>,
    staged: BTreeMap<AccountAddress, Vec<u8>>,
    unix_timestamp: i64,
}

impl Transaction<'_> {
    pub fn get(&self, address: &AccountAddress) -> Option<&[u8]> {
        self.staged
            .get(address)
            .or_else(|| self.accounts.get(address))
            .map(Vec::as_slice)
    }

    /// Create a new account; fails if the address already holds data.
    pub fn create_account(&mut self, address: AccountAddress, data: Vec<u8>) -> Result<(), LedgerError> {
        if self.get(&address).is_some() {
            return Err(LedgerError::AccountInUse(bs58::encode(address).into_string()));
        }
        self.staged.insert(address, data);
        Ok(())
    }

    /// Overwrite an existing account's data.
    pub fn write_account(&mut self, address: AccountAddress, data: Vec<u8>) -> Result<(), LedgerError> {
        if self.get(&address).is_none() {
            return Err(LedgerError::AccountNotFound(bs58::encode(address).into_string()));
        }
        self.staged.insert(address, data);
        Ok(())
    }

    /// Ledger clock as seen by this transaction.
    pub fn unix_timestamp(&self) -> i64 {
        self.unix_timestamp
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose clock always reads `unix_timestamp`.
    pub fn with_fixed_clock(unix_timestamp: i64) -> Self {
        Self {
            state: RwLock::default(),
            fixed_time: Some(unix_timestamp),
        }
    }

    fn now(&self) -> i64 {
        self.fixed_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or_default()
        })
    }

    pub fn get_account(&self, address: &AccountAddress) -> Option<Vec<u8>> {
        let state = self.state.read().expect("ledger lock poisoned");
        state.accounts.get(address).cloned()
    }

    /// Accounts of `data_len` bytes whose data contains `bytes` at `offset`
    /// (the mock equivalent of `getProgramAccounts` with memcmp + dataSize).
    pub fn scan(&self, offset: usize, bytes: &[u8], data_len: usize) -> Vec<(AccountAddress, Vec<u8>)> {
        let state = self.state.read().expect("ledger lock poisoned");
        state
            .accounts
            .iter()
            .filter(|(_, data)| {
                data.len() == data_len && data.get(offset..offset + bytes.len()) == Some(bytes)
            })
            .map(|(address, data)| (*address, data.clone()))
            .collect()
    }

    /// Ledger pre-populated with `accounts` (restoring a saved snapshot).
    pub fn from_accounts(accounts: impl IntoIterator<Item = (AccountAddress, Vec<u8>)>) -> Self {
        let ledger = Self::new();
        ledger.state.write().expect("ledger lock poisoned").accounts.extend(accounts);
        ledger
    }

    /// Copy of every account, ordered by address.
    pub fn accounts(&self) -> Vec<(AccountAddress, Vec<u8>)> {
        let state = self.state.read().expect("ledger lock poisoned");
        state.accounts.iter().map(|(a, d)| (*a, d.clone())).collect()
    }

    pub fn account_count(&self) -> usize {
        self.state.read().expect("ledger lock poisoned").accounts.len()
    }

    /// Run `f` as one atomic transaction. Staged writes land only if `f`
    /// returns `Ok`; a signature is generated for each applied transaction.
    pub fn execute<T, E>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<(T, TransactionSignature), E> {
        let mut state = self.state.write().expect("ledger lock poisoned");
        let unix_timestamp = self.now();

        let (value, staged) = {
            let mut tx = Transaction {
                accounts: &state.accounts,
                staged: BTreeMap::new(),
                unix_timestamp,
            };
            let value = f(&mut tx)?;
            (value, tx.staged)
        };

        state.accounts.extend(staged);
        state.tx_counter += 1;
        let mut sig = [0u8; 64];
        sig[0..8].copy_from_slice(&state.tx_counter.to_le_bytes());
        sig[8..16].copy_from_slice(b"mocktxn!");
        Ok((value, sig))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_once() {
        let ledger = MockLedger::new();
        ledger
            .execute(|tx| tx.create_account([1u8; 32], vec![1, 2, 3]))
            .unwrap();

        let err = ledger
            .execute(|tx| tx.create_account([1u8; 32], vec![9]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountInUse(_)));
        assert_eq!(ledger.get_account(&[1u8; 32]), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_failed_transaction_applies_nothing() {
        let ledger = MockLedger::new();
        let result = ledger.execute(|tx| {
            tx.create_account([1u8; 32], vec![1])?;
            tx.write_account([2u8; 32], vec![2])
        });
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn test_staged_reads_within_transaction() {
        let ledger = MockLedger::new();
        ledger
            .execute(|tx| {
                tx.create_account([1u8; 32], vec![1])?;
                assert_eq!(tx.get(&[1u8; 32]), Some(&[1u8][..]));
                tx.write_account([1u8; 32], vec![2])
            })
            .unwrap();
        assert_eq!(ledger.get_account(&[1u8; 32]), Some(vec![2]));
    }

    #[test]
    fn test_signatures_are_unique() {
        let ledger = MockLedger::new();
        let (_, s1) = ledger.execute(|tx| tx.create_account([1u8; 32], vec![])).unwrap();
        let (_, s2) = ledger.execute(|tx| tx.create_account([2u8; 32], vec![])).unwrap();
        assert_ne!(s1, s2);
        assert_ne!(s1, [0u8; 64]);
    }

    #[test]
    fn test_scan_filters_offset_and_length() {
        let ledger = MockLedger::new();
        ledger
            .execute(|tx| {
                tx.create_account([1u8; 32], vec![0, 7, 7, 0])?;
                tx.create_account([2u8; 32], vec![0, 7, 8, 0])?;
                tx.create_account([3u8; 32], vec![0, 7, 7])
            })
            .unwrap();
        let hits = ledger.scan(1, &[7, 7], 4);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, [1u8; 32]);
    }

    #[test]
    fn test_snapshot_restore() {
        let ledger = MockLedger::new();
        ledger
            .execute(|tx| {
                tx.create_account([2u8; 32], vec![2])?;
                tx.create_account([1u8; 32], vec![1])
            })
            .unwrap();

        let restored = MockLedger::from_accounts(ledger.accounts());
        assert_eq!(restored.accounts(), vec![([1u8; 32], vec![1]), ([2u8; 32], vec![2])]);
        assert!(restored.execute(|tx| tx.create_account([1u8; 32], vec![])).is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let ledger = MockLedger::with_fixed_clock(1_700_000_000);
        let (ts, _) = ledger
            .execute(|tx| Ok::<_, LedgerError>(tx.unix_timestamp()))
            .unwrap();
        assert_eq!(ts, 1_700_000_000);
    }
}
