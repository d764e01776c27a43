//! Mock ledger persistence between CLI invocations
//!
//! The snapshot is a JSON object mapping base58 account addresses to
//! hex-encoded account data.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use moat_core::decode_identity;
use moat_registry::MockLedger;

pub fn load(path: &Path) -> Result<MockLedger> {
    if !path.exists() {
        return Ok(MockLedger::new());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading mock ledger {}", path.display()))?;
    let raw: BTreeMap<String, String> = serde_json::from_str(&text)
        .with_context(|| format!("parsing mock ledger {}", path.display()))?;

    let mut accounts = Vec::with_capacity(raw.len());
    for (address, data) in raw {
        let address = decode_identity(&address).context("mock ledger address")?;
        let data = hex::decode(&data).context("mock ledger account data")?;
        accounts.push((address, data));
    }
    Ok(MockLedger::from_accounts(accounts))
}

pub fn save(path: &Path, ledger: &MockLedger) -> Result<()> {
    let raw: BTreeMap<String, String> = ledger
        .accounts()
        .into_iter()
        .map(|(address, data)| (bs58::encode(address).into_string(), hex::encode(data)))
        .collect();
    let text = serde_json::to_string_pretty(&raw)?;
    std::fs::write(path, text).with_context(|| format!("writing mock ledger {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("moat-ledger-{}.json", std::process::id()));
        let ledger = MockLedger::new();
        ledger
            .execute(|tx| tx.create_account([5u8; 32], vec![0xde, 0xad]))
            .unwrap();

        save(&path, &ledger).unwrap();
        let restored = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.get_account(&[5u8; 32]), Some(vec![0xde, 0xad]));
    }

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let ledger = load(Path::new("/nonexistent/moat-ledger.json")).unwrap();
        assert_eq!(ledger.account_count(), 0);
    }
}
