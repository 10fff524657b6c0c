//! Small helpers shared by contract test suites.

use chainforge_common::config::{COIN_UNIT, POLICY_ID_SIZE};
use chainforge_common::transaction::{Address, Assets, CompletedTransaction, PendingTransaction};
use rand::RngCore;

/// A freshly generated key-hash identity and its enterprise address.
#[derive(Clone, Debug)]
pub struct Wallet {
    pub key_hash: String,
    pub address: Address,
}

impl Wallet {
    pub fn generate() -> Self {
        let mut bytes = [0u8; POLICY_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        let key_hash = hex::encode(bytes);
        let address = Address::key(key_hash.clone());
        Self { key_hash, address }
    }
}

/// Asset map holding only the fee asset.
pub fn coins(amount: i128) -> Assets {
    indexmap::indexmap! { COIN_UNIT.to_string() => amount }
}

/// Attach `key_hash` as a witness once the transaction is completed.
pub fn add_signature(tx: PendingTransaction, key_hash: impl Into<String>) -> PendingTransaction {
    let key_hash = key_hash.into();
    tx.add_post_finalize_hook(move |mut completed: CompletedTransaction| async move {
        completed.add_signature(key_hash);
        Ok(completed)
    })
}

/// Error matcher accepting any failure whose text contains `fragment`.
pub fn with_trace(fragment: impl Into<String>) -> impl Fn(&str) -> bool + Send + Sync {
    let fragment = fragment.into();
    move |text| text.contains(&fragment)
}
