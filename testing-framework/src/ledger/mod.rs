//! In-memory deterministic chain provider.
//!
//! [`TestLedger`] completes, validates, and applies transactions against a
//! utxo set held in process memory. Script execution is modeled by
//! registered check functions keyed on script hash; fee and transaction id
//! are derived from the serialized draft, so a run is reproducible
//! byte-for-byte.

use chainforge_common::config::{COIN_UNIT, DEFAULT_BASE_FEE, DEFAULT_FEE_PER_BYTE};
use chainforge_common::transaction::{
    add_assets, unit_policy, Address, Assets, BuildError, ChainProvider, CompletedTransaction,
    Credential, DraftInput, DraftOutput, ExUnits, OutRef, TransactionDraft, Utxo,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::Mutex;
use sha3::{Digest, Sha3_256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Verdict of one modeled script execution: `Err` carries the trace text a
/// real evaluator would emit.
pub type ScriptCheck = Arc<dyn Fn(&TransactionDraft) -> Result<(), String> + Send + Sync>;

/// Fee and budget parameters of the ledger.
#[derive(Clone, Copy, Debug)]
pub struct LedgerConfig {
    pub base_fee: u64,
    pub fee_per_byte: u64,
    /// Modeled per-script-execution budget charge
    pub ex_cpu_per_script: u64,
    pub ex_mem_per_script: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_fee: DEFAULT_BASE_FEE,
            fee_per_byte: DEFAULT_FEE_PER_BYTE,
            ex_cpu_per_script: 250_000_000,
            ex_mem_per_script: 350_000,
        }
    }
}

struct LedgerState {
    utxos: IndexMap<OutRef, Utxo>,
    included: HashSet<String>,
}

/// Builder for a funded [`TestLedger`].
#[derive(Default)]
pub struct TestLedgerBuilder {
    config: LedgerConfig,
    payer: Option<Address>,
    checks: HashMap<String, ScriptCheck>,
    genesis: Vec<(Address, Assets)>,
}

impl TestLedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the genesis utxo set with one output holding `assets`.
    pub fn with_funded_address(mut self, address: Address, assets: Assets) -> Self {
        self.genesis.push((address, assets));
        self
    }

    /// Address whose utxos cover fees and shortfalls during completion, and
    /// which receives change.
    pub fn with_payer(mut self, address: Address) -> Self {
        self.payer = Some(address);
        self
    }

    /// Install the modeled execution of a script. A transaction touching
    /// `script_hash` without a registered check passes vacuously.
    pub fn with_script_check<F>(mut self, script_hash: impl Into<String>, check: F) -> Self
    where
        F: Fn(&TransactionDraft) -> Result<(), String> + Send + Sync + 'static,
    {
        self.checks.insert(script_hash.into(), Arc::new(check));
        self
    }

    pub fn build(self) -> TestLedger {
        let mut utxos = IndexMap::new();
        for (index, (address, assets)) in self.genesis.into_iter().enumerate() {
            let out_ref = OutRef::new("genesis", index as u64);
            utxos.insert(
                out_ref.clone(),
                Utxo {
                    out_ref,
                    address,
                    assets,
                    datum: None,
                },
            );
        }
        debug!("test ledger starting with {} genesis utxos", utxos.len());
        TestLedger {
            config: self.config,
            payer: self.payer,
            checks: self.checks,
            state: Mutex::new(LedgerState {
                utxos,
                included: HashSet::new(),
            }),
        }
    }
}

/// Deterministic in-memory ledger implementing [`ChainProvider`].
///
/// Completion runs script checks and balances the draft from the payer's
/// utxos; submission verifies inputs and signatures and applies the state
/// transition atomically.
pub struct TestLedger {
    config: LedgerConfig,
    payer: Option<Address>,
    checks: HashMap<String, ScriptCheck>,
    state: Mutex<LedgerState>,
}

impl TestLedger {
    pub fn builder() -> TestLedgerBuilder {
        TestLedgerBuilder::new()
    }

    /// Script hashes whose checks a draft must pass: payment scripts of the
    /// inputs, mint policies, and withdrawal script credentials, deduplicated
    /// in first-appearance order.
    fn involved_scripts(draft: &TransactionDraft) -> Vec<String> {
        let mut seen = Vec::new();
        let mut push = |hash: &str| {
            if !seen.iter().any(|h: &String| h == hash) {
                seen.push(hash.to_string());
            }
        };
        for input in &draft.inputs {
            if let Some(hash) = input.utxo.address.payment_script_hash() {
                push(hash);
            }
        }
        for mint in &draft.mints {
            for unit in mint.assets.keys() {
                let policy = unit_policy(unit);
                if !policy.is_empty() {
                    push(policy);
                }
            }
        }
        for withdrawal in &draft.withdrawals {
            if let Credential::Script(hash) = &withdrawal.credential {
                push(hash);
            }
        }
        seen
    }

    fn run_script_checks(&self, draft: &TransactionDraft) -> Result<usize, BuildError> {
        let scripts = Self::involved_scripts(draft);
        for hash in &scripts {
            if let Some(check) = self.checks.get(hash) {
                trace!("running script check {hash}");
                check(draft).map_err(|cause| {
                    BuildError::Script(format!("script {hash} rejected the transaction: {cause}"))
                })?;
            }
        }
        Ok(scripts.len())
    }

    /// Net asset flow of the draft: inputs, mints, and withdrawals in;
    /// outputs and the fee out.
    fn net_flow(draft: &TransactionDraft, fee: u64) -> Assets {
        let mut net = Assets::new();
        for input in &draft.inputs {
            add_assets(&mut net, &input.utxo.assets);
        }
        for mint in &draft.mints {
            add_assets(&mut net, &mint.assets);
        }
        for withdrawal in &draft.withdrawals {
            *net.entry(COIN_UNIT.to_string()).or_insert(0) += withdrawal.amount as i128;
        }
        for output in &draft.outputs {
            for (unit, quantity) in &output.assets {
                *net.entry(unit.clone()).or_insert(0) -= quantity;
            }
        }
        *net.entry(COIN_UNIT.to_string()).or_insert(0) -= fee as i128;
        net
    }

    fn draft_size(draft: &TransactionDraft) -> Result<usize, BuildError> {
        Ok(serde_json::to_vec(draft)
            .map_err(|e| BuildError::Provider(e.to_string()))?
            .len())
    }

    fn tx_id(draft: &TransactionDraft) -> Result<String, BuildError> {
        let bytes = serde_json::to_vec(draft).map_err(|e| BuildError::Provider(e.to_string()))?;
        Ok(hex::encode(Sha3_256::digest(&bytes)))
    }
}

#[async_trait]
impl ChainProvider for TestLedger {
    /// Validate scripts, balance from the payer, and compute fee and id.
    ///
    /// The fee is charged over the caller's draft; balancing inputs and the
    /// change output do not feed back into it.
    async fn complete(
        &self,
        mut draft: TransactionDraft,
    ) -> Result<CompletedTransaction, BuildError> {
        let script_runs = self.run_script_checks(&draft)?;

        let fee = self.config.base_fee
            + self.config.fee_per_byte * Self::draft_size(&draft)? as u64;
        let mut net = Self::net_flow(&draft, fee);
        net.retain(|_, quantity| *quantity != 0);

        // Any shortfall must be coverable from the payer's utxos.
        if net.values().any(|quantity| *quantity < 0) {
            let payer = self.payer.as_ref().ok_or_else(|| {
                BuildError::Balancing("draft is short of assets and no payer is set".to_string())
            })?;
            let spent: HashSet<OutRef> = draft
                .inputs
                .iter()
                .map(|input| input.utxo.out_ref.clone())
                .collect();
            let candidates: Vec<Utxo> = {
                let state = self.state.lock();
                state
                    .utxos
                    .values()
                    .filter(|utxo| utxo.address == *payer && !spent.contains(&utxo.out_ref))
                    .cloned()
                    .collect()
            };
            for utxo in candidates {
                if !net.values().any(|quantity| *quantity < 0) {
                    break;
                }
                add_assets(&mut net, &utxo.assets);
                draft.inputs.push(DraftInput {
                    utxo,
                    redeemer: None,
                });
            }
            net.retain(|_, quantity| *quantity != 0);
            if let Some((unit, quantity)) = net.iter().find(|(_, quantity)| **quantity < 0) {
                return Err(BuildError::Balancing(format!(
                    "short {} of {unit} after spending the payer's utxos",
                    -quantity
                )));
            }
        }

        // Surplus goes back to the payer as change.
        if !net.is_empty() {
            let change_owner = self.payer.as_ref().ok_or_else(|| {
                BuildError::Balancing("surplus assets with no payer to return them to".to_string())
            })?;
            draft.outputs.push(DraftOutput {
                address: change_owner.clone(),
                datum: None,
                assets: net,
            });
        }

        let size = Self::draft_size(&draft)?;
        let id = Self::tx_id(&draft)?;
        let ex_units = (script_runs > 0).then(|| ExUnits {
            cpu: self.config.ex_cpu_per_script * script_runs as u64,
            mem: self.config.ex_mem_per_script * script_runs as u64,
        });
        debug!("completed transaction {id}: size {size}, fee {fee}");
        Ok(CompletedTransaction {
            id,
            draft,
            fee,
            size,
            ex_units,
            signatures: Vec::new(),
        })
    }

    /// Verify inputs and signatures, then apply the state transition.
    async fn submit(&self, tx: &CompletedTransaction) -> Result<String, BuildError> {
        let mut state = self.state.lock();

        for input in &tx.draft.inputs {
            if !state.utxos.contains_key(&input.utxo.out_ref) {
                return Err(BuildError::UnknownInput(format!(
                    "{}#{}",
                    input.utxo.out_ref.tx_id, input.utxo.out_ref.index
                )));
            }
            if let Credential::Key(hash) = &input.utxo.address.payment {
                if !tx.signed_by(hash) {
                    return Err(BuildError::MissingSignature(hash.clone()));
                }
            }
        }
        for withdrawal in &tx.draft.withdrawals {
            if let Credential::Key(hash) = &withdrawal.credential {
                if !tx.signed_by(hash) {
                    return Err(BuildError::MissingSignature(hash.clone()));
                }
            }
        }
        for signer in &tx.draft.required_signers {
            if !tx.signed_by(signer) {
                return Err(BuildError::MissingSignature(signer.clone()));
            }
        }

        for input in &tx.draft.inputs {
            state.utxos.shift_remove(&input.utxo.out_ref);
        }
        for (index, output) in tx.draft.outputs.iter().enumerate() {
            let out_ref = OutRef::new(tx.id.clone(), index as u64);
            state.utxos.insert(
                out_ref.clone(),
                Utxo {
                    out_ref,
                    address: output.address.clone(),
                    assets: output.assets.clone(),
                    datum: output.datum.clone(),
                },
            );
        }
        state.included.insert(tx.id.clone());
        debug!("applied transaction {}", tx.id);
        Ok(tx.id.clone())
    }

    async fn await_inclusion(&self, tx_id: &str) -> Result<(), BuildError> {
        if self.state.lock().included.contains(tx_id) {
            Ok(())
        } else {
            Err(BuildError::NotIncluded(tx_id.to_string()))
        }
    }

    async fn utxos_at(&self, address: &Address) -> Result<Vec<Utxo>, BuildError> {
        Ok(self
            .state
            .lock()
            .utxos
            .values()
            .filter(|utxo| utxo.address == *address)
            .cloned()
            .collect())
    }

    async fn utxos_with_unit(&self, unit: &str) -> Result<Vec<Utxo>, BuildError> {
        Ok(self
            .state
            .lock()
            .utxos
            .values()
            .filter(|utxo| utxo.assets.get(unit).is_some_and(|quantity| *quantity > 0))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::coins;
    use chainforge_common::transaction::{asset_unit, DraftMint, DraftWithdrawal};

    fn payer_address() -> Address {
        Address::key("aa".repeat(28))
    }

    fn funded_ledger() -> TestLedger {
        TestLedgerBuilder::new()
            .with_funded_address(payer_address(), coins(1_000_000_000))
            .with_payer(payer_address())
            .build()
    }

    fn signed(mut tx: CompletedTransaction) -> CompletedTransaction {
        tx.add_signature("aa".repeat(28));
        tx
    }

    #[tokio::test]
    async fn completion_balances_from_the_payer_and_returns_change() {
        let ledger = funded_ledger();
        let draft = TransactionDraft {
            outputs: vec![DraftOutput {
                address: Address::key("bb".repeat(28)),
                datum: None,
                assets: coins(5_000_000),
            }],
            ..Default::default()
        };

        let tx = ledger.complete(draft).await.unwrap();
        assert_eq!(tx.draft.inputs.len(), 1);
        assert_eq!(tx.draft.outputs.len(), 2);
        let change = &tx.draft.outputs[1];
        assert_eq!(change.address, payer_address());
        assert_eq!(
            change.assets.get(COIN_UNIT),
            Some(&(1_000_000_000 - 5_000_000 - tx.fee as i128))
        );
    }

    #[tokio::test]
    async fn completion_fails_when_the_payer_cannot_cover() {
        let ledger = funded_ledger();
        let draft = TransactionDraft {
            outputs: vec![DraftOutput {
                address: Address::key("bb".repeat(28)),
                datum: None,
                assets: coins(2_000_000_000),
            }],
            ..Default::default()
        };

        let err = ledger.complete(draft).await.unwrap_err();
        assert!(matches!(err, BuildError::Balancing(_)), "{err}");
    }

    #[tokio::test]
    async fn script_check_failure_carries_the_trace() {
        let policy = "cc".repeat(28);
        let ledger = TestLedgerBuilder::new()
            .with_funded_address(payer_address(), coins(1_000_000_000))
            .with_payer(payer_address())
            .with_script_check(policy.clone(), |_draft| Err("minting is closed".to_string()))
            .build();
        let draft = TransactionDraft {
            mints: vec![DraftMint {
                assets: indexmap::indexmap! { asset_unit(&policy, "01") => 1 },
                redeemer: None,
            }],
            ..Default::default()
        };

        let err = ledger.complete(draft).await.unwrap_err();
        match err {
            BuildError::Script(trace) => {
                assert!(trace.contains("minting is closed"), "{trace}");
                assert!(trace.contains(&policy), "{trace}");
            }
            other => panic!("expected script failure, got {other}"),
        }
    }

    #[tokio::test]
    async fn submission_rejects_a_double_spend() {
        let ledger = funded_ledger();
        let draft = TransactionDraft {
            outputs: vec![DraftOutput {
                address: Address::key("bb".repeat(28)),
                datum: None,
                assets: coins(5_000_000),
            }],
            ..Default::default()
        };

        let tx = signed(ledger.complete(draft.clone()).await.unwrap());
        ledger.submit(&tx).await.unwrap();
        ledger.await_inclusion(&tx.id).await.unwrap();

        let err = ledger.submit(&tx).await.unwrap_err();
        assert!(matches!(err, BuildError::UnknownInput(_)), "{err}");
    }

    #[tokio::test]
    async fn submission_requires_input_owner_signatures() {
        let ledger = funded_ledger();
        let tx = ledger
            .complete(TransactionDraft {
                outputs: vec![DraftOutput {
                    address: Address::key("bb".repeat(28)),
                    datum: None,
                    assets: coins(5_000_000),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        let err = ledger.submit(&tx).await.unwrap_err();
        match err {
            BuildError::MissingSignature(hash) => assert_eq!(hash, "aa".repeat(28)),
            other => panic!("expected missing signature, got {other}"),
        }
    }

    #[tokio::test]
    async fn withdrawal_amounts_enter_the_balance() {
        let key = "dd".repeat(28);
        let ledger = funded_ledger();
        let tx = ledger
            .complete(TransactionDraft {
                withdrawals: vec![DraftWithdrawal {
                    credential: Credential::Key(key.clone()),
                    amount: 400_000_000,
                    redeemer: None,
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        // Withdrawn coin exceeds the fee, so no payer input is needed and the
        // remainder comes back as change.
        assert!(tx.draft.inputs.is_empty());
        assert_eq!(tx.draft.outputs.len(), 1);
        assert_eq!(
            tx.draft.outputs[0].assets.get(COIN_UNIT),
            Some(&(400_000_000 - tx.fee as i128))
        );
    }

    #[tokio::test]
    async fn utxo_queries_see_applied_transactions() {
        let marker = asset_unit(&"ee".repeat(28), "01");
        let recipient = Address::key("bb".repeat(28));
        let ledger = funded_ledger();
        let mut assets = coins(5_000_000);
        assets.insert(marker.clone(), 1);

        let tx = signed(
            ledger
                .complete(TransactionDraft {
                    mints: vec![DraftMint {
                        assets: indexmap::indexmap! { marker.clone() => 1 },
                        redeemer: None,
                    }],
                    outputs: vec![DraftOutput {
                        address: recipient.clone(),
                        datum: None,
                        assets,
                    }],
                    ..Default::default()
                })
                .await
                .unwrap(),
        );
        ledger.submit(&tx).await.unwrap();

        let at = ledger.utxos_at(&recipient).await.unwrap();
        assert_eq!(at.len(), 1);
        let with_unit = ledger.utxos_with_unit(&marker).await.unwrap();
        assert_eq!(with_unit.len(), 1);
        assert_eq!(with_unit[0].out_ref.tx_id, tx.id);
    }
}
