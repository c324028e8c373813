//! Level-wise (Apriori) frequent itemset mining over a transaction matrix

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::basket::TransactionMatrix;
use crate::error::{CoreResult, RecommendError};

/// A set of item_category keys together with its support.
///
/// Items are kept in matrix column order, which is lexicographic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itemset {
    pub items: Vec<String>,
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|candidate| candidate == item)
    }
}

/// Result of a mining run: every itemset whose support met the threshold.
///
/// Itemsets are ordered by size, then by column order within a size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    index: HashMap<Vec<String>, usize>,
    n_baskets: usize,
    min_support: f64,
}

impl FrequentItemsets {
    /// Wrap already-computed itemsets, e.g. from an earlier mining run.
    ///
    /// Members of each itemset are sorted so lookups are order independent.
    pub fn from_itemsets(mut itemsets: Vec<Itemset>, n_baskets: usize, min_support: f64) -> Self {
        for itemset in &mut itemsets {
            itemset.items.sort();
        }
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(position, itemset)| (itemset.items.clone(), position))
            .collect();
        Self {
            itemsets,
            index,
            n_baskets,
            min_support,
        }
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Itemset> {
        self.itemsets.iter()
    }

    pub fn as_slice(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn n_baskets(&self) -> usize {
        self.n_baskets
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Size of the largest frequent itemset, 0 when nothing is frequent
    pub fn max_len(&self) -> usize {
        self.itemsets.last().map_or(0, Itemset::len)
    }

    /// Look up an itemset by its members, in any order
    pub fn get<S: AsRef<str>>(&self, items: &[S]) -> Option<&Itemset> {
        let mut key: Vec<String> = items.iter().map(|item| item.as_ref().to_string()).collect();
        key.sort();
        self.index.get(&key).map(|&position| &self.itemsets[position])
    }

    pub fn support_of<S: AsRef<str>>(&self, items: &[S]) -> Option<f64> {
        self.get(items).map(|itemset| itemset.support)
    }

    /// All itemsets of exactly `size` members
    pub fn of_size(&self, size: usize) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter().filter(move |itemset| itemset.len() == size)
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a Itemset;
    type IntoIter = std::slice::Iter<'a, Itemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}

/// Check that a minimum support lies in (0, 1]
pub fn validate_min_support(min_support: f64) -> CoreResult<()> {
    if !min_support.is_finite() || min_support <= 0.0 || min_support > 1.0 {
        return Err(RecommendError::invalid_threshold(
            "min_support",
            min_support,
            "must be in (0, 1]",
        ));
    }
    Ok(())
}

/// Find every itemset with support >= `min_support`.
///
/// A threshold above every single item's frequency gives an empty result,
/// not an error.
pub fn mine_frequent_itemsets(
    matrix: &TransactionMatrix,
    min_support: f64,
) -> CoreResult<FrequentItemsets> {
    mine_frequent_itemsets_bounded(matrix, min_support, None)
}

/// Same as [`mine_frequent_itemsets`], stopping after itemsets of `max_len`
/// members when a bound is given.
pub fn mine_frequent_itemsets_bounded(
    matrix: &TransactionMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> CoreResult<FrequentItemsets> {
    validate_min_support(min_support)?;
    if max_len == Some(0) {
        return Err(RecommendError::invalid_argument(
            "max_len must be at least 1",
        ));
    }

    let n_baskets = matrix.n_baskets();
    if n_baskets == 0 {
        return Ok(FrequentItemsets::from_itemsets(Vec::new(), 0, min_support));
    }

    let support = |count: usize| count as f64 / n_baskets as f64;
    let mut found: Vec<(Vec<usize>, f64)> = Vec::new();

    let mut level: Vec<Vec<usize>> = matrix
        .item_counts()
        .into_iter()
        .enumerate()
        .filter_map(|(col, count)| {
            let value = support(count);
            (value >= min_support).then(|| {
                found.push((vec![col], value));
                vec![col]
            })
        })
        .collect();
    debug!(size = 1, frequent = level.len(), "mined itemset level");

    let mut size = 1;
    while !level.is_empty() && max_len.map_or(true, |bound| size < bound) {
        let candidates = generate_candidates(&level);
        if candidates.is_empty() {
            break;
        }

        // Candidates within one level are independent; the collect is the
        // barrier before the next level is generated.
        let counts: Vec<usize> = candidates
            .par_iter()
            .map(|columns| matrix.count_containing(columns))
            .collect();

        size += 1;
        let candidate_count = candidates.len();
        level = candidates
            .into_iter()
            .zip(counts)
            .filter_map(|(columns, count)| {
                let value = support(count);
                (value >= min_support).then(|| {
                    found.push((columns.clone(), value));
                    columns
                })
            })
            .collect();
        debug!(
            size,
            candidates = candidate_count,
            frequent = level.len(),
            "mined itemset level"
        );
    }

    let items = matrix.items();
    let itemsets: Vec<Itemset> = found
        .into_iter()
        .map(|(columns, support)| Itemset {
            items: columns.iter().map(|&col| items[col].clone()).collect(),
            support,
        })
        .collect();

    info!(
        baskets = n_baskets,
        min_support,
        itemsets = itemsets.len(),
        "frequent itemset mining complete"
    );

    Ok(FrequentItemsets::from_itemsets(itemsets, n_baskets, min_support))
}

/// Join frequent k-itemsets sharing their first k-1 columns, then drop any
/// candidate with an infrequent k-subset.
///
/// `level` must be sorted lexicographically with each itemset sorted; the
/// output keeps the same ordering.
fn generate_candidates(level: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let frequent: HashSet<&[usize]> = level.iter().map(Vec::as_slice).collect();
    let mut candidates = Vec::new();

    for (i, left) in level.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in level[i + 1..].iter() {
            if &right[..right.len() - 1] != prefix {
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[right.len() - 1]);

            if all_subsets_frequent(&candidate, &frequent) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn all_subsets_frequent(candidate: &[usize], frequent: &HashSet<&[usize]>) -> bool {
    // Includes the two joined parents.
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    (0..candidate.len()).all(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(position, _)| position != skip)
                .map(|(_, &col)| col),
        );
        frequent.contains(subset.as_slice())
    })
}
