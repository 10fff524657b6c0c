//! Deferred, composable transaction builder.
//!
//! A [`PendingTransaction`] collects typed parts out of order, composes with
//! other instances, and only touches the codec and the chain provider when
//! [`finalize`](PendingTransaction::finalize) is called. Redeemers and datums
//! stay typed until that point, so transforms applied before finalization
//! operate on native values.

use super::{
    holds_marker, Address, Assets, BuildError, ChainProvider, CompletedTransaction, Credential,
    DraftInput, DraftMint, DraftOutput, DraftWithdrawal, Script, TransactionDraft, Utxo,
};
use crate::data::ScriptData;
use crate::schema::{SchemaRegistry, Value};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use std::future::Future;

/// Pure transform applied to the serialized draft before completion.
pub type PreFinalizeHook = Box<dyn FnOnce(TransactionDraft) -> TransactionDraft + Send>;

/// Async transform applied to the completed artifact, e.g. attaching a
/// signature. May replace the artifact entirely.
pub type PostFinalizeHook =
    Box<dyn FnOnce(CompletedTransaction) -> BoxFuture<'static, Result<CompletedTransaction, BuildError>> + Send>;

/// A planned spend: utxo plus optional typed redeemer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub utxo: Utxo,
    pub redeemer: Option<Value>,
}

/// A planned mint or burn: asset deltas plus optional typed redeemer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mint {
    pub assets: Assets,
    pub redeemer: Option<Value>,
}

/// A planned output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub address: Address,
    pub datum: Option<Value>,
    pub assets: Assets,
}

/// A planned reward withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    pub credential: Credential,
    pub amount: u64,
    pub redeemer: Option<Value>,
}

/// Mutable, not-yet-serialized collection of planned transaction parts.
///
/// Mutators consume and return the builder, so call sites chain them; merging
/// two builders with [`compose`](Self::compose) consumes both operands.
/// Finalize exactly once per logical transaction.
#[derive(Default)]
pub struct PendingTransaction {
    inputs: Vec<Input>,
    mints: Vec<Mint>,
    outputs: Vec<Output>,
    reference_inputs: Vec<Utxo>,
    withdrawals: Vec<Withdrawal>,
    required_signers: Vec<String>,
    scripts: Vec<Script>,
    valid_from: Option<u64>,
    valid_to: Option<u64>,
    pre_finalize: Vec<PreFinalizeHook>,
    post_finalize: Vec<PostFinalizeHook>,
}

impl PendingTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(mut self, utxo: Utxo, redeemer: Option<Value>) -> Self {
        self.inputs.push(Input { utxo, redeemer });
        self
    }

    /// Spend several utxos with one shared redeemer.
    pub fn collect_from(mut self, utxos: Vec<Utxo>, redeemer: Option<Value>) -> Self {
        for utxo in utxos {
            self.inputs.push(Input {
                utxo,
                redeemer: redeemer.clone(),
            });
        }
        self
    }

    pub fn add_mint(mut self, assets: Assets, redeemer: Option<Value>) -> Self {
        self.mints.push(Mint { assets, redeemer });
        self
    }

    pub fn add_output(mut self, address: Address, datum: Option<Value>, assets: Assets) -> Self {
        self.outputs.push(Output {
            address,
            datum,
            assets,
        });
        self
    }

    pub fn pay_to_address(self, address: Address, assets: Assets) -> Self {
        self.add_output(address, None, assets)
    }

    pub fn add_reference_input(mut self, utxo: Utxo) -> Self {
        self.reference_inputs.push(utxo);
        self
    }

    pub fn add_withdrawal(
        mut self,
        credential: Credential,
        amount: u64,
        redeemer: Option<Value>,
    ) -> Self {
        self.withdrawals.push(Withdrawal {
            credential,
            amount,
            redeemer,
        });
        self
    }

    pub fn add_required_signer(mut self, key_hash: impl Into<String>) -> Self {
        self.required_signers.push(key_hash.into());
        self
    }

    /// No-op when the key hash was never added.
    pub fn remove_required_signer(mut self, key_hash: &str) -> Self {
        if let Some(position) = self.required_signers.iter().position(|hash| hash == key_hash) {
            self.required_signers.remove(position);
        }
        self
    }

    pub fn attach_script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn valid_from(mut self, timestamp: u64) -> Self {
        self.valid_from = Some(timestamp);
        self
    }

    pub fn valid_to(mut self, timestamp: u64) -> Self {
        self.valid_to = Some(timestamp);
        self
    }

    /// Drop the first input whose utxo holds quantity 1 of the marker unit.
    /// No-op when absent.
    pub fn remove_input_by_marker(mut self, unit: &str) -> Self {
        if let Some(position) = self
            .inputs
            .iter()
            .position(|input| holds_marker(&input.utxo.assets, unit))
        {
            self.inputs.remove(position);
        }
        self
    }

    /// Drop the first output holding quantity 1 of the marker unit. No-op
    /// when absent.
    pub fn remove_output_by_marker(mut self, unit: &str) -> Self {
        if let Some(position) = self
            .outputs
            .iter()
            .position(|output| holds_marker(&output.assets, unit))
        {
            self.outputs.remove(position);
        }
        self
    }

    /// Apply a pure transform to the datum of the first output holding the
    /// marker unit. No-op when absent.
    pub fn transform_output_datum_by_marker(
        mut self,
        unit: &str,
        f: impl FnOnce(Option<Value>) -> Option<Value>,
    ) -> Self {
        if let Some(output) = self
            .outputs
            .iter_mut()
            .find(|output| holds_marker(&output.assets, unit))
        {
            output.datum = f(output.datum.take());
        }
        self
    }

    /// Apply a pure transform to the assets of the first output holding the
    /// marker unit. No-op when absent.
    pub fn transform_output_assets_by_marker(
        mut self,
        unit: &str,
        f: impl FnOnce(Assets) -> Assets,
    ) -> Self {
        if let Some(output) = self
            .outputs
            .iter_mut()
            .find(|output| holds_marker(&output.assets, unit))
        {
            output.assets = f(std::mem::take(&mut output.assets));
        }
        self
    }

    /// Apply a transform to the assets of every output whose payment part is
    /// the given script hash.
    pub fn transform_output_assets_by_owner_script(
        mut self,
        script_hash: &str,
        f: impl Fn(Assets) -> Assets,
    ) -> Self {
        for output in self
            .outputs
            .iter_mut()
            .filter(|output| output.address.payment_script_hash() == Some(script_hash))
        {
            output.assets = f(std::mem::take(&mut output.assets));
        }
        self
    }

    /// Earlier-registered pre-finalize hooks run first.
    pub fn add_pre_finalize_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(TransactionDraft) -> TransactionDraft + Send + 'static,
    {
        self.pre_finalize.push(Box::new(hook));
        self
    }

    /// Earlier-registered post-finalize hooks run first; each is awaited
    /// before the next begins.
    pub fn add_post_finalize_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce(CompletedTransaction) -> Fut + Send + 'static,
        Fut: Future<Output = Result<CompletedTransaction, BuildError>> + Send + 'static,
    {
        self.post_finalize.push(Box::new(move |tx| hook(tx).boxed()));
        self
    }

    /// Merge `other` into this builder: pending lists concatenate in order,
    /// hook chains append after this builder's. Associative and
    /// order-preserving.
    pub fn compose(mut self, other: PendingTransaction) -> Self {
        self.inputs.extend(other.inputs);
        self.mints.extend(other.mints);
        self.outputs.extend(other.outputs);
        self.reference_inputs.extend(other.reference_inputs);
        self.withdrawals.extend(other.withdrawals);
        self.required_signers.extend(other.required_signers);
        self.scripts.extend(other.scripts);
        if self.valid_from.is_none() {
            self.valid_from = other.valid_from;
        }
        if self.valid_to.is_none() {
            self.valid_to = other.valid_to;
        }
        self.pre_finalize.extend(other.pre_finalize);
        self.post_finalize.extend(other.post_finalize);
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn mints(&self) -> &[Mint] {
        &self.mints
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn reference_inputs(&self) -> &[Utxo] {
        &self.reference_inputs
    }

    pub fn withdrawals(&self) -> &[Withdrawal] {
        &self.withdrawals
    }

    pub fn required_signers(&self) -> &[String] {
        &self.required_signers
    }

    /// Serialize every pending item through the codec, run the pre-finalize
    /// chain over the draft, complete it through the provider, then run the
    /// post-finalize chain over the artifact.
    ///
    /// Typed redeemers and datums are encoded here and nowhere earlier.
    /// Balancing and validation failures from the provider are propagated
    /// unchanged.
    pub async fn finalize<P>(
        self,
        registry: &SchemaRegistry,
        provider: &P,
    ) -> Result<CompletedTransaction, BuildError>
    where
        P: ChainProvider + ?Sized,
    {
        debug!(
            "finalizing transaction: {} inputs, {} mints, {} outputs, {} withdrawals",
            self.inputs.len(),
            self.mints.len(),
            self.outputs.len(),
            self.withdrawals.len()
        );

        let mut draft = TransactionDraft {
            required_signers: self.required_signers,
            scripts: self.scripts,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            ..TransactionDraft::default()
        };
        for input in self.inputs {
            draft.inputs.push(DraftInput {
                utxo: input.utxo,
                redeemer: encode_opt(registry, input.redeemer)?,
            });
        }
        for mint in self.mints {
            draft.mints.push(DraftMint {
                assets: mint.assets,
                redeemer: encode_opt(registry, mint.redeemer)?,
            });
        }
        for output in self.outputs {
            draft.outputs.push(DraftOutput {
                address: output.address,
                datum: encode_opt(registry, output.datum)?,
                assets: output.assets,
            });
        }
        draft.reference_inputs = self.reference_inputs;
        for withdrawal in self.withdrawals {
            draft.withdrawals.push(DraftWithdrawal {
                credential: withdrawal.credential,
                amount: withdrawal.amount,
                redeemer: encode_opt(registry, withdrawal.redeemer)?,
            });
        }

        for hook in self.pre_finalize {
            draft = hook(draft);
        }

        let mut completed = provider.complete(draft).await?;

        for hook in self.post_finalize {
            completed = hook(completed).await?;
        }
        Ok(completed)
    }
}

fn encode_opt(
    registry: &SchemaRegistry,
    value: Option<Value>,
) -> Result<Option<ScriptData>, BuildError> {
    value
        .map(|v| registry.encode(&v))
        .transpose()
        .map_err(BuildError::from)
}
