//! RuleForge: service recommendations from association rule mining
//!
//! Transactions are grouped into monthly per-user baskets, frequent itemsets
//! are mined level-wise (Apriori), rules are scored by support, confidence
//! and lift, and recommendations for a seed service are ranked by lift.

pub mod basket;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod itemset;
pub mod logging;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod rules;

// Re-export public items for easier access
pub use basket::{build_baskets, TransactionMatrix, TransactionRecord};
pub use cli::Args;
pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use data::{load_transactions, DatasetSummary};
pub use error::{CoreResult, RecommendError};
pub use itemset::{mine_frequent_itemsets, mine_frequent_itemsets_bounded, FrequentItemsets, Itemset};
pub use pipeline::{run_pipeline, MiningConfig, MiningOutcome};
pub use recommend::{recommend, Recommender};
pub use rules::{generate_rules, AssociationRule, Metric};

/// Common result type for I/O-facing layers (ingestion, reporting, CLI)
pub type Result<T> = anyhow::Result<T>;
