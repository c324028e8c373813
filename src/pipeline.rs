//! End-to-end mining pipeline: records -> baskets -> itemsets -> rules

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::basket::{build_baskets, TransactionMatrix, TransactionRecord};
use crate::error::{CoreResult, RecommendError};
use crate::itemset::{mine_frequent_itemsets_bounded, validate_min_support, FrequentItemsets};
use crate::recommend::Recommender;
use crate::rules::{generate_rules, AssociationRule, Metric};

/// Thresholds for one mining run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    pub min_support: f64,
    pub metric: Metric,
    pub min_threshold: f64,
    /// Largest itemset size to mine; unbounded when `None`
    pub max_len: Option<usize>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            metric: Metric::Support,
            min_threshold: 0.01,
            max_len: None,
        }
    }
}

impl MiningConfig {
    pub fn validate(&self) -> CoreResult<()> {
        validate_min_support(self.min_support)?;
        self.metric.validate_threshold(self.min_threshold)?;
        if self.max_len == Some(0) {
            return Err(RecommendError::invalid_argument(
                "max_len must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Everything a mining run produces, kept for reporting
#[derive(Debug, Clone)]
pub struct MiningOutcome {
    pub matrix: TransactionMatrix,
    pub itemsets: FrequentItemsets,
    pub rules: Vec<AssociationRule>,
}

impl MiningOutcome {
    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.rules)
    }
}

/// Run basket building, itemset mining and rule generation in order.
///
/// Thresholds are validated before any work is done.
pub fn run_pipeline(records: &[TransactionRecord], config: &MiningConfig) -> CoreResult<MiningOutcome> {
    config.validate()?;

    let matrix = build_baskets(records)?;
    info!(
        records = records.len(),
        baskets = matrix.n_baskets(),
        items = matrix.n_items(),
        "baskets built"
    );

    let itemsets = mine_frequent_itemsets_bounded(&matrix, config.min_support, config.max_len)?;
    let rules = generate_rules(&itemsets, config.metric, config.min_threshold)?;

    Ok(MiningOutcome {
        matrix,
        itemsets,
        rules,
    })
}
