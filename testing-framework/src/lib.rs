//! # Chainforge Testing Framework
//!
//! Deterministic test engine for chainforge contracts: an in-memory ledger
//! plus a sequential case runner that executes ordered transaction-producing
//! actions against it, classifying each outcome against an expectation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chainforge_testing_framework::prelude::*;
//!
//! #[tokio::test]
//! async fn test_simple_payment() {
//!     let wallet = Wallet::generate();
//!     let ledger = TestLedgerBuilder::new()
//!         .with_funded_address(wallet.address.clone(), coins(1_000_000_000))
//!         .with_payer(wallet.address.clone())
//!         .build();
//!
//!     let mut sequencer = TestSequencer::new(registry, Arc::new(ledger))
//!         .with_signing_key(wallet.key_hash.clone());
//!     // register cases, then:
//!     sequencer.run(cases, SequenceOptions::default()).await.unwrap();
//! }
//! ```
//!
//! ## Design
//!
//! - **Single-threaded by contract**: the ledger is one shared mutable
//!   resource and case ordering is a correctness requirement; cases run
//!   strictly in declared order.
//! - **Deterministic**: flat fee model, content-derived transaction ids,
//!   no wall-clock dependence.

#![warn(clippy::all)]

/// In-memory deterministic chain provider
pub mod ledger;

/// Sequential case runner and outcome report
pub mod sequencer;

/// Wallets and error matchers shared across tests
pub mod utilities;

// Convenient re-exports for common usage
pub mod prelude;

pub use ledger::{LedgerConfig, TestLedger, TestLedgerBuilder};
pub use sequencer::{CaseOutcome, SequenceOptions, Status, TestCase, TestSequencer};

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
