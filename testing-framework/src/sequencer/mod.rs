//! Sequential test-case runner.
//!
//! Runs an ordered list of transaction-producing cases against a shared
//! ledger. Each case's preconditions are established by the prior
//! successfully-applied cases, so ordering is part of correctness and no
//! parallel execution is supported.
//!
//! When a case fails unexpectedly the runner either aborts at once
//! (rethrowing that first error) or, with `keep_going`, records the failure
//! and keeps running: later Fail-expecting cases are independent and still
//! execute, while Success-expecting cases are proactively skipped because
//! the ledger state they depend on never advanced.

use chainforge_common::config::{DEFAULT_MAX_EX_CPU, DEFAULT_MAX_EX_MEM, DEFAULT_MAX_TX_SIZE};
use chainforge_common::schema::SchemaRegistry;
use chainforge_common::transaction::{
    BuildError, ChainProvider, ExUnits, PendingTransaction,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Expected or actual disposition of one case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Fail,
    /// Not executed because an earlier unexpected failure froze the ledger
    Skipped,
    /// Declared inactive; never executed
    Ignored,
}

/// The first unexpected failure of a non-keep-going run.
#[derive(Debug, Error)]
#[error("case '{label}' failed unexpectedly: {source}")]
pub struct SequencerFailure {
    pub label: String,
    #[source]
    pub source: BuildError,
}

/// Resource usage of a completed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxMetrics {
    pub size: usize,
    pub fee: u64,
    pub ex_units: Option<ExUnits>,
}

/// One line of the run report. Append-only; the full ordered sequence is the
/// run's report.
pub struct CaseOutcome {
    pub label: String,
    pub expected: Status,
    pub status: Status,
    pub error: Option<String>,
    /// Expected failure occurred but the error matcher rejected it
    pub mismatch: bool,
    pub metrics: Option<TxMetrics>,
    /// Per-case report supplement, evaluated when the report is printed
    pub extra_log: Option<ExtraLog>,
}

impl std::fmt::Debug for CaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseOutcome")
            .field("label", &self.label)
            .field("expected", &self.expected)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("mismatch", &self.mismatch)
            .field("metrics", &self.metrics)
            .field("extra_log", &self.extra_log.is_some())
            .finish()
    }
}

type BuildFn =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<PendingTransaction, BuildError>> + Send>;
type ErrorMatcher = Box<dyn Fn(&str) -> bool + Send + Sync>;
/// Extra report text attached to one case, rendered under its line.
pub type ExtraLog = Box<dyn Fn() -> String + Send + Sync>;

/// A labeled transaction-producing action plus its expectation.
pub struct TestCase {
    label: String,
    expect: Status,
    match_error: Option<ErrorMatcher>,
    extra_log: Option<ExtraLog>,
    build: BuildFn,
}

impl TestCase {
    /// Case expecting success.
    pub fn new<F, Fut>(label: impl Into<String>, build: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<PendingTransaction, BuildError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            expect: Status::Success,
            match_error: None,
            extra_log: None,
            build: Box::new(move || build().boxed()),
        }
    }

    pub fn expect(mut self, status: Status) -> Self {
        self.expect = status;
        self
    }

    pub fn expect_fail(self) -> Self {
        self.expect(Status::Fail)
    }

    pub fn ignored(self) -> Self {
        self.expect(Status::Ignored)
    }

    /// Predicate over the failure's display text; an expected failure whose
    /// text does not match is reported as Fail with a mismatch flag.
    pub fn match_error<M>(mut self, matcher: M) -> Self
    where
        M: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.match_error = Some(Box::new(matcher));
        self
    }

    /// Supplementary text printed under this case's report line, evaluated
    /// at print time so it can read state the run produced.
    pub fn extra_log<F>(mut self, extra: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.extra_log = Some(Box::new(extra));
        self
    }
}

/// Run options.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceOptions {
    /// Keep running independent cases after an unexpected failure instead of
    /// aborting the run
    pub keep_going: bool,
}

/// Runs ordered cases against a shared provider, one at a time.
pub struct TestSequencer<P> {
    registry: Arc<SchemaRegistry>,
    provider: Arc<P>,
    signing_key: Option<String>,
    outcomes: Vec<CaseOutcome>,
}

impl<P: ChainProvider> TestSequencer<P> {
    pub fn new(registry: Arc<SchemaRegistry>, provider: Arc<P>) -> Self {
        Self {
            registry,
            provider,
            signing_key: None,
            outcomes: Vec::new(),
        }
    }

    /// Key hash appended to every completed transaction's signatures, the
    /// runner's default wallet.
    pub fn with_signing_key(mut self, key_hash: impl Into<String>) -> Self {
        self.signing_key = Some(key_hash.into());
        self
    }

    /// Execute the cases in declared order.
    ///
    /// Without `keep_going`, the first unexpected failure aborts the run and
    /// is returned; later cases never execute. With `keep_going`, the run
    /// always completes and the report carries every outcome.
    pub async fn run(
        &mut self,
        cases: Vec<TestCase>,
        options: SequenceOptions,
    ) -> Result<(), SequencerFailure> {
        let mut running = true;

        for case in cases {
            let TestCase {
                label,
                expect,
                match_error,
                extra_log,
                build,
            } = case;

            if !running && expect == Status::Success {
                info!("skipping '{label}': ledger state did not advance");
                self.outcomes.push(CaseOutcome {
                    label,
                    expected: expect,
                    status: Status::Skipped,
                    error: None,
                    mismatch: false,
                    metrics: None,
                    extra_log,
                });
                continue;
            }
            if expect == Status::Ignored {
                self.outcomes.push(CaseOutcome {
                    label,
                    expected: expect,
                    status: Status::Ignored,
                    error: None,
                    mismatch: false,
                    metrics: None,
                    extra_log,
                });
                continue;
            }

            debug!("executing case '{label}'");
            match self.execute(build, expect == Status::Success).await {
                Ok(metrics) => {
                    let status = if expect == Status::Fail {
                        warn!("case '{label}' succeeded but was expected to fail");
                        Status::Fail
                    } else {
                        Status::Success
                    };
                    self.outcomes.push(CaseOutcome {
                        label,
                        expected: expect,
                        status,
                        error: None,
                        mismatch: false,
                        metrics: Some(metrics),
                        extra_log,
                    });
                }
                Err(error) => {
                    if expect != Status::Fail {
                        warn!("case '{label}' failed unexpectedly: {error}");
                        self.outcomes.push(CaseOutcome {
                            label: label.clone(),
                            expected: expect,
                            status: Status::Fail,
                            error: Some(error.to_string()),
                            mismatch: false,
                            metrics: None,
                            extra_log,
                        });
                        if !options.keep_going {
                            return Err(SequencerFailure {
                                label,
                                source: error,
                            });
                        }
                        running = false;
                    } else {
                        let text = error.to_string();
                        let matched = match_error.as_ref().map(|m| m(&text)).unwrap_or(true);
                        self.outcomes.push(CaseOutcome {
                            label,
                            expected: expect,
                            status: if matched { Status::Success } else { Status::Fail },
                            error: Some(text),
                            mismatch: !matched,
                            metrics: None,
                            extra_log,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Build, finalize, sign, and (for cases expected to apply) submit and
    /// await inclusion.
    async fn execute(&self, build: BuildFn, submit: bool) -> Result<TxMetrics, BuildError> {
        let pending = build().await?;
        let mut completed = pending
            .finalize(self.registry.as_ref(), self.provider.as_ref())
            .await?;
        let metrics = TxMetrics {
            size: completed.size,
            fee: completed.fee,
            ex_units: completed.ex_units,
        };
        if let Some(key_hash) = &self.signing_key {
            completed.add_signature(key_hash.clone());
        }
        if submit {
            let tx_id = self.provider.submit(&completed).await?;
            self.provider.await_inclusion(&tx_id).await?;
        }
        Ok(metrics)
    }

    /// Ordered per-case report.
    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    /// Aggregate status: Fail if any outcome is Fail, else Success.
    pub fn status(&self) -> Status {
        if self.outcomes.iter().any(|o| o.status == Status::Fail) {
            Status::Fail
        } else {
            Status::Success
        }
    }

    /// Print one line per case, indented error text under failures, and a
    /// final pass/skip tally. An aggregate Fail should map to a non-zero
    /// process exit at the call site.
    pub fn log_results(&self, print_metrics: bool) {
        const INDENT: &str = "         ";
        let mut successes = 0usize;
        let mut skipped = 0usize;

        for outcome in &self.outcomes {
            // The printed verdict reflects the transaction, the recorded
            // status reflects the case; they disagree when failure was
            // expected.
            let color = match outcome.status {
                Status::Fail => "\x1b[31m",
                Status::Success => "\x1b[92m",
                Status::Skipped => "\x1b[33m",
                Status::Ignored => "\x1b[90m",
            };
            let verdict = match outcome.status {
                Status::Skipped => "SKIPPED",
                Status::Ignored => "IGNORED",
                _ if outcome.error.is_some() => "   FAIL",
                _ => "SUCCESS",
            };
            let mismatch = if outcome.mismatch { " (error mismatch)" } else { "" };
            println!("{color}{verdict}\x1b[0m: {}{mismatch}", outcome.label);

            match outcome.status {
                Status::Fail => {
                    if let Some(error) = &outcome.error {
                        let indented = error
                            .lines()
                            .map(|line| format!("{INDENT}{line}"))
                            .collect::<Vec<_>>()
                            .join("\n");
                        println!("\n{indented}\n");
                    } else {
                        println!("{INDENT}Transaction was expected to fail\n");
                    }
                }
                Status::Skipped => skipped += 1,
                _ => successes += 1,
            }

            if let Some(metrics) = &outcome.metrics {
                if let Some(ex_units) = metrics.ex_units {
                    let cpu_ratio = ex_units.cpu as f64 / DEFAULT_MAX_EX_CPU as f64;
                    let mem_ratio = ex_units.mem as f64 / DEFAULT_MAX_EX_MEM as f64;
                    if cpu_ratio >= 1.0 {
                        println!("{INDENT}\x1b[31mTransaction used {cpu_ratio}x cpu budget\x1b[0m");
                    } else if print_metrics {
                        println!("{INDENT}\x1b[34mTransaction used {cpu_ratio}x cpu budget\x1b[0m");
                    }
                    if mem_ratio >= 1.0 {
                        println!("{INDENT}\x1b[31mTransaction used {mem_ratio}x mem budget\x1b[0m");
                    } else if print_metrics {
                        println!("{INDENT}\x1b[34mTransaction used {mem_ratio}x mem budget\x1b[0m");
                    }
                }
                let size_ratio = metrics.size as f64 / DEFAULT_MAX_TX_SIZE as f64;
                if size_ratio >= 1.0 {
                    println!("{INDENT}\x1b[31mTransaction was {size_ratio}x max bytes\x1b[0m");
                } else if print_metrics {
                    println!("{INDENT}\x1b[34mTransaction was {size_ratio}x max bytes\x1b[0m");
                }
            }

            if let Some(extra) = &outcome.extra_log {
                for line in extra().lines() {
                    println!("{INDENT}{line}");
                }
            }
        }

        println!(
            "\n{successes}/{} transactions succeeded, {skipped} skipped\n",
            self.outcomes.len()
        );
    }
}
