//! One-stop imports for contract test suites.

pub use crate::ledger::{LedgerConfig, TestLedger, TestLedgerBuilder};
pub use crate::sequencer::{
    CaseOutcome, SequenceOptions, SequencerFailure, Status, TestCase, TestSequencer, TxMetrics,
};
pub use crate::utilities::{add_signature, coins, with_trace, Wallet};

pub use chainforge_common::data::ScriptData;
pub use chainforge_common::schema::{FieldEncoder, Schema, SchemaRegistry, Value};
pub use chainforge_common::transaction::{
    asset_unit, holds_marker, Address, Assets, BuildError, ChainProvider, Credential,
    PendingTransaction, Utxo,
};

pub use std::sync::Arc;
