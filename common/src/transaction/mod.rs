//! Transaction domain types, the chain-provider contract, and the deferred
//! builder.
//!
//! The builder assembles a [`TransactionDraft`] from typed parts; balancing,
//! fee computation and submission belong to a [`ChainProvider`]
//! implementation (a node, an emulator). Failures coming back from the
//! provider are propagated unchanged.

use crate::config::{COIN_UNIT, POLICY_ID_HEX_SIZE};
use crate::data::ScriptData;
use crate::schema::EncodeError;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod builder;

pub use builder::{PendingTransaction, PostFinalizeHook, PreFinalizeHook};


#[derive(Debug, Error)]
pub enum BuildError {
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("cannot balance transaction: {0}")]
    Balancing(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("missing signature for {0}")]
    MissingSignature(String),
    #[error("unknown or spent input {0}")]
    UnknownInput(String),
    #[error("transaction {0} not included")]
    NotIncluded(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// Unit-to-quantity asset map. Insertion ordered; a unit is the hex policy
/// id concatenated with the hex asset name, or [`COIN_UNIT`] for the fee
/// asset.
pub type Assets = IndexMap<String, i128>;

/// Build a unit from its policy and asset-name parts.
pub fn asset_unit(policy: &str, name: &str) -> String {
    if policy.is_empty() && name.is_empty() {
        COIN_UNIT.to_string()
    } else {
        format!("{policy}{name}")
    }
}

/// Policy part of a unit (empty for the fee asset).
pub fn unit_policy(unit: &str) -> &str {
    if unit == COIN_UNIT || unit.len() < POLICY_ID_HEX_SIZE {
        ""
    } else {
        &unit[..POLICY_ID_HEX_SIZE]
    }
}

/// Asset-name part of a unit.
pub fn unit_asset_name(unit: &str) -> &str {
    if unit == COIN_UNIT || unit.len() < POLICY_ID_HEX_SIZE {
        ""
    } else {
        &unit[POLICY_ID_HEX_SIZE..]
    }
}

/// Accumulate `other` into `target`, unit by unit.
pub fn add_assets(target: &mut Assets, other: &Assets) {
    for (unit, quantity) in other {
        *target.entry(unit.clone()).or_insert(0) += quantity;
    }
}

/// True when the asset map holds exactly quantity 1 of the marker unit.
pub fn holds_marker(assets: &Assets, unit: &str) -> bool {
    assets.get(unit) == Some(&1)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Key(String),
    Script(String),
}

impl Credential {
    pub fn hash(&self) -> &str {
        match self {
            Credential::Key(hash) | Credential::Script(hash) => hash,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub payment: Credential,
    pub stake: Option<Credential>,
}

impl Address {
    pub fn key(hash: impl Into<String>) -> Self {
        Self {
            payment: Credential::Key(hash.into()),
            stake: None,
        }
    }

    pub fn script(hash: impl Into<String>) -> Self {
        Self {
            payment: Credential::Script(hash.into()),
            stake: None,
        }
    }

    pub fn with_stake(mut self, credential: Credential) -> Self {
        self.stake = Some(credential);
        self
    }

    /// Payment script hash, if the payment part is a script.
    pub fn payment_script_hash(&self) -> Option<&str> {
        match &self.payment {
            Credential::Script(hash) => Some(hash),
            Credential::Key(_) => None,
        }
    }
}

/// Reference to a transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutRef {
    pub tx_id: String,
    pub index: u64,
}

impl OutRef {
    pub fn new(tx_id: impl Into<String>, index: u64) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }
}

/// An unspent transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    pub out_ref: OutRef,
    pub address: Address,
    pub assets: Assets,
    pub datum: Option<ScriptData>,
}

/// An attachable script witness.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub hash: String,
    pub code: String,
}

/// Serialized form of a pending transaction, produced at finalize time.
/// Redeemers and datums are wire data at this point; this is what pre-finalize
/// hooks operate on and what a provider completes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct TransactionDraft {
    pub inputs: Vec<DraftInput>,
    pub mints: Vec<DraftMint>,
    pub outputs: Vec<DraftOutput>,
    pub reference_inputs: Vec<Utxo>,
    pub withdrawals: Vec<DraftWithdrawal>,
    pub required_signers: Vec<String>,
    pub scripts: Vec<Script>,
    pub valid_from: Option<u64>,
    pub valid_to: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DraftInput {
    pub utxo: Utxo,
    pub redeemer: Option<ScriptData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DraftMint {
    pub assets: Assets,
    pub redeemer: Option<ScriptData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DraftOutput {
    pub address: Address,
    pub datum: Option<ScriptData>,
    pub assets: Assets,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DraftWithdrawal {
    pub credential: Credential,
    pub amount: u64,
    pub redeemer: Option<ScriptData>,
}

/// Execution-budget usage reported by a provider.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExUnits {
    pub cpu: u64,
    pub mem: u64,
}

/// A balanced, fee-computed transaction artifact awaiting signatures and
/// submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompletedTransaction {
    pub id: String,
    pub draft: TransactionDraft,
    pub fee: u64,
    pub size: usize,
    pub ex_units: Option<ExUnits>,
    pub signatures: Vec<String>,
}

impl CompletedTransaction {
    pub fn add_signature(&mut self, key_hash: impl Into<String>) {
        let key_hash = key_hash.into();
        if !self.signatures.contains(&key_hash) {
            self.signatures.push(key_hash);
        }
    }

    pub fn signed_by(&self, key_hash: &str) -> bool {
        self.signatures.iter().any(|hash| hash == key_hash)
    }
}

/// External ledger collaborator: balances and completes drafts, accepts
/// submissions, reports inclusion, and answers utxo queries.
///
/// Every operation suspends the caller until the provider responds; the
/// ledger is one shared mutable resource and callers sequence their own
/// operations against it.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn complete(&self, draft: TransactionDraft) -> Result<CompletedTransaction, BuildError>;

    async fn submit(&self, tx: &CompletedTransaction) -> Result<String, BuildError>;

    async fn await_inclusion(&self, tx_id: &str) -> Result<(), BuildError>;

    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, BuildError>;

    async fn utxos_with_unit(&self, unit: &str) -> Result<Vec<Utxo>, BuildError>;
}
