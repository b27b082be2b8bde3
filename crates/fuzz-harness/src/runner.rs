//! Property runner
//!
//! Drives proptest strategies outside the `proptest!` macro so a whole
//! campaign of targets runs to completion and each one gets held, falsified
//! and discarded counts. A case is discarded when the property does not apply
//! to the generated input, such as an orbit that decays before the sampled
//! time. Falsifying inputs are shrunk before they are kept.

use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ============================================================================
// Case outcomes
// ============================================================================

/// Why a single case did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The property is false for this input
    Falsified(String),
    /// The property does not apply to this input; the value is a short
    /// reason used to tally discards
    Discarded(String),
}

impl CaseError {
    pub fn discard(reason: impl Into<String>) -> Self {
        CaseError::Discarded(reason.into())
    }
}

impl From<String> for CaseError {
    fn from(message: String) -> Self {
        CaseError::Falsified(message)
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Falsified(message) => write!(f, "falsified: {}", message),
            CaseError::Discarded(reason) => write!(f, "discarded: {}", reason),
        }
    }
}

pub type CaseResult = Result<(), CaseError>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Cases generated per target
    pub cases: u64,
    /// 0 draws a fresh seed from entropy
    pub seed: u64,
    pub max_shrink_iters: u32,
    /// Counterexamples kept per target; later ones are only counted
    pub max_counterexamples: usize,
    /// A target whose discarded share exceeds this is inconclusive
    pub max_discard_ratio: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cases: 10_000,
            seed: 0,
            max_shrink_iters: 1024,
            max_counterexamples: 20,
            max_discard_ratio: 0.5,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(self, cases: u64) -> Self {
        Self { cases, ..self }
    }

    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn max_shrink_iters(self, max_shrink_iters: u32) -> Self {
        Self {
            max_shrink_iters,
            ..self
        }
    }

    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: u32::try_from(self.cases).unwrap_or(u32::MAX),
            max_shrink_iters: self.max_shrink_iters,
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        }
    }

    /// Value source for one target. Every target restarts from the same seed
    /// so a filtered run reproduces the cases of a full one.
    pub fn test_runner(&self) -> TestRunner {
        let config = self.to_proptest_config();
        if self.seed == 0 {
            return TestRunner::new(config);
        }
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&self.seed.to_le_bytes());
        TestRunner::new_with_rng(config, TestRng::from_seed(RngAlgorithm::ChaCha, &key))
    }
}

// ============================================================================
// Target results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Held,
    Falsified,
    /// Too many cases were discarded to trust the held count
    Inconclusive,
}

/// A falsifying input, shrunk where the strategy allows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterexample {
    /// Index of the generated case within the target
    pub case: u64,
    pub message: String,
    pub input: String,
    /// Simplifications that kept the input failing
    pub shrink_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    pub name: String,
    pub cases_run: u64,
    pub held: u64,
    pub falsified: u64,
    pub discarded: u64,
    /// Discard count per reason
    pub discard_reasons: BTreeMap<String, u64>,
    pub duration_ms: f64,
    /// Cases per second
    pub throughput: f64,
    pub counterexamples: Vec<Counterexample>,
    pub verdict: Verdict,
}

impl TargetResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases_run: 0,
            held: 0,
            falsified: 0,
            discarded: 0,
            discard_reasons: BTreeMap::new(),
            duration_ms: 0.0,
            throughput: 0.0,
            counterexamples: Vec::new(),
            verdict: Verdict::Held,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Held
    }

    pub fn record_held(&mut self) {
        self.cases_run += 1;
        self.held += 1;
    }

    pub fn record_discard(&mut self, reason: String) {
        self.cases_run += 1;
        self.discarded += 1;
        *self.discard_reasons.entry(reason).or_insert(0) += 1;
    }

    /// Count a falsified case, keeping the counterexample while under `keep`.
    pub fn record_falsified(&mut self, counterexample: Counterexample, keep: usize) {
        self.cases_run += 1;
        self.falsified += 1;
        if self.counterexamples.len() < keep {
            self.counterexamples.push(counterexample);
        }
    }

    pub fn discard_ratio(&self) -> f64 {
        if self.cases_run == 0 {
            0.0
        } else {
            self.discarded as f64 / self.cases_run as f64
        }
    }

    /// Fix timing and verdict once every case has run.
    pub fn finish(&mut self, elapsed: Duration, max_discard_ratio: f64) {
        let seconds = elapsed.as_secs_f64();
        self.duration_ms = seconds * 1000.0;
        self.throughput = if seconds > 0.0 {
            self.cases_run as f64 / seconds
        } else {
            0.0
        };
        self.verdict = if self.falsified > 0 {
            Verdict::Falsified
        } else if self.discard_ratio() > max_discard_ratio {
            Verdict::Inconclusive
        } else {
            Verdict::Held
        };
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct PropertyRunner {
    config: RunConfig,
    results: Vec<TargetResult>,
}

impl PropertyRunner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Check a property over the case index alone.
    pub fn check<F>(&mut self, name: &str, property: F) -> &TargetResult
    where
        F: Fn(u64) -> CaseResult,
    {
        let mut result = TargetResult::new(name);
        let started = Instant::now();

        for case in 0..self.config.cases {
            match property(case) {
                Ok(()) => result.record_held(),
                Err(CaseError::Discarded(reason)) => result.record_discard(reason),
                Err(CaseError::Falsified(message)) => result.record_falsified(
                    Counterexample {
                        case,
                        message,
                        input: format!("case {}", case),
                        shrink_steps: 0,
                    },
                    self.config.max_counterexamples,
                ),
            }
        }

        self.finish(result, started.elapsed())
    }

    /// Check a property over values drawn from `strategy`.
    pub fn check_strategy<S, F>(&mut self, name: &str, strategy: S, property: F) -> &TargetResult
    where
        S: Strategy,
        F: Fn(&S::Value) -> CaseResult,
    {
        let mut result = TargetResult::new(name);
        let mut source = self.config.test_runner();
        let started = Instant::now();

        for case in 0..self.config.cases {
            let mut tree = match strategy.new_tree(&mut source) {
                Ok(tree) => tree,
                Err(reason) => {
                    result.record_discard(format!("strategy rejected: {}", reason));
                    continue;
                }
            };
            match property(&tree.current()) {
                Ok(()) => result.record_held(),
                Err(CaseError::Discarded(reason)) => result.record_discard(reason),
                Err(CaseError::Falsified(message)) => {
                    let counterexample = self.shrink(case, &mut tree, &property, message);
                    result.record_falsified(counterexample, self.config.max_counterexamples);
                }
            }
        }

        self.finish(result, started.elapsed())
    }

    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TargetResult> {
        self.results
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(TargetResult::passed)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.results)
    }

    fn finish(&mut self, mut result: TargetResult, elapsed: Duration) -> &TargetResult {
        result.finish(elapsed, self.config.max_discard_ratio);
        match result.verdict {
            Verdict::Held => info!(
                property = %result.name,
                held = result.held,
                discarded = result.discarded,
                "Property held"
            ),
            Verdict::Falsified => warn!(
                property = %result.name,
                falsified = result.falsified,
                "Property falsified"
            ),
            Verdict::Inconclusive => warn!(
                property = %result.name,
                discard_ratio = result.discard_ratio(),
                "Property inconclusive"
            ),
        }
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    /// Walk the value tree towards simpler inputs that still falsify the
    /// property. The kept input is always one that was seen to fail; a
    /// discarded simplification counts as passing.
    fn shrink<T, F>(&self, case: u64, tree: &mut T, property: &F, message: String) -> Counterexample
    where
        T: ValueTree,
        T::Value: Debug,
        F: Fn(&T::Value) -> CaseResult,
    {
        let mut counterexample = Counterexample {
            case,
            message,
            input: format!("{:?}", tree.current()),
            shrink_steps: 0,
        };
        let mut budget = self.config.max_shrink_iters;

        'simplify: while budget > 0 && tree.simplify() {
            loop {
                budget -= 1;
                let candidate = tree.current();
                if let Err(CaseError::Falsified(message)) = property(&candidate) {
                    counterexample.message = message;
                    counterexample.input = format!("{:?}", candidate);
                    counterexample.shrink_steps += 1;
                    continue 'simplify;
                }
                if budget == 0 || !tree.complicate() {
                    break 'simplify;
                }
            }
        }

        debug!(
            case,
            steps = counterexample.shrink_steps,
            input = %counterexample.input,
            "Shrunk counterexample"
        );
        counterexample
    }
}
