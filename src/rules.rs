//! Association rule generation from frequent itemsets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreResult, RecommendError};
use crate::itemset::{FrequentItemsets, Itemset};

/// Rule quality measure used to filter generated rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Support,
        Metric::Confidence,
        Metric::Lift,
        Metric::Leverage,
        Metric::Conviction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Support => "support",
            Metric::Confidence => "confidence",
            Metric::Lift => "lift",
            Metric::Leverage => "leverage",
            Metric::Conviction => "conviction",
        }
    }

    /// Reject thresholds that cannot be meaningful for this metric.
    ///
    /// Support and confidence are probabilities in (0, 1]; lift and
    /// conviction are non-negative ratios; leverage is a difference of
    /// probabilities in [-1, 1].
    pub fn validate_threshold(self, value: f64) -> CoreResult<()> {
        let valid = value.is_finite()
            && match self {
                Metric::Support | Metric::Confidence => value > 0.0 && value <= 1.0,
                Metric::Lift | Metric::Conviction => value >= 0.0,
                Metric::Leverage => (-1.0..=1.0).contains(&value),
            };
        if valid {
            return Ok(());
        }

        let reason = match self {
            Metric::Support | Metric::Confidence => "must be in (0, 1]",
            Metric::Lift | Metric::Conviction => "must be finite and non-negative",
            Metric::Leverage => "must be in [-1, 1]",
        };
        Err(RecommendError::invalid_threshold(
            "min_threshold",
            value,
            format!("{} threshold {}", self, reason),
        ))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = RecommendError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == wanted)
            .ok_or_else(|| {
                RecommendError::invalid_argument(format!(
                    "unsupported metric `{}` (expected support|confidence|lift|leverage|conviction)",
                    value
                ))
            })
    }
}

/// Directional rule `antecedent -> consequent` with its quality metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of antecedent and consequent together
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `+inf` when confidence is 1
    pub conviction: f64,
}

impl AssociationRule {
    /// Derive all metrics from the three supports.
    ///
    /// Fails when either side has zero support, which would make confidence
    /// or lift undefined.
    pub fn from_supports(
        antecedent: Vec<String>,
        consequent: Vec<String>,
        antecedent_support: f64,
        consequent_support: f64,
        support: f64,
    ) -> CoreResult<Self> {
        if antecedent_support <= 0.0 {
            return Err(RecommendError::degenerate_rule(
                &antecedent,
                &consequent,
                "antecedent support is zero",
            ));
        }
        if consequent_support <= 0.0 {
            return Err(RecommendError::degenerate_rule(
                &antecedent,
                &consequent,
                "consequent support is zero",
            ));
        }

        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Ok(Self {
            antecedent,
            consequent,
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift,
            leverage,
            conviction,
        })
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Support => self.support,
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
            Metric::Leverage => self.leverage,
            Metric::Conviction => self.conviction,
        }
    }

    pub fn antecedent_contains(&self, item: &str) -> bool {
        self.antecedent.iter().any(|candidate| candidate == item)
    }
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} -> {{{}}}",
            self.antecedent.join(", "),
            self.consequent.join(", ")
        )
    }
}

/// Derive every rule whose `metric` reaches `min_threshold`.
///
/// Each frequent itemset of two or more members is split into every
/// non-empty antecedent and its complement. Metrics come from the supports
/// already recorded by mining, so no matrix scan is needed. Output order:
/// itemsets in mining order, antecedent sizes from largest to smallest,
/// antecedents in column order within a size.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    metric: Metric,
    min_threshold: f64,
) -> CoreResult<Vec<AssociationRule>> {
    metric.validate_threshold(min_threshold)?;

    let mut rules = Vec::new();
    let mut considered = 0usize;

    for itemset in itemsets.iter().filter(|itemset| itemset.len() >= 2) {
        for antecedent_size in (1..itemset.len()).rev() {
            for positions in combinations(itemset.len(), antecedent_size) {
                considered += 1;
                let rule = split_rule(itemsets, itemset, &positions)?;
                if rule.metric(metric) >= min_threshold {
                    rules.push(rule);
                }
            }
        }
    }

    info!(
        itemsets = itemsets.len(),
        considered,
        rules = rules.len(),
        %metric,
        min_threshold,
        "association rules generated"
    );

    Ok(rules)
}

fn split_rule(
    itemsets: &FrequentItemsets,
    itemset: &Itemset,
    antecedent_positions: &[usize],
) -> CoreResult<AssociationRule> {
    let mut antecedent = Vec::with_capacity(antecedent_positions.len());
    let mut consequent = Vec::with_capacity(itemset.len() - antecedent_positions.len());
    for (position, item) in itemset.items.iter().enumerate() {
        if antecedent_positions.contains(&position) {
            antecedent.push(item.clone());
        } else {
            consequent.push(item.clone());
        }
    }

    let lookup = |side: &[String], label: &str| {
        itemsets.support_of(side).ok_or_else(|| {
            RecommendError::degenerate_rule(
                &antecedent,
                &consequent,
                format!("{} support is unknown", label),
            )
        })
    };
    let antecedent_support = lookup(&antecedent, "antecedent")?;
    let consequent_support = lookup(&consequent, "consequent")?;

    debug!(
        antecedent = ?antecedent,
        consequent = ?consequent,
        support = itemset.support,
        "rule candidate"
    );

    AssociationRule::from_supports(
        antecedent,
        consequent,
        antecedent_support,
        consequent_support,
        itemset.support,
    )
}

/// All `size`-element position subsets of `0..n`, in lexicographic order
fn combinations(n: usize, size: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, size: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for next in start..n {
            current.push(next);
            extend(next + 1, n, size, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    extend(0, n, size, &mut Vec::with_capacity(size), &mut out);
    out
}
