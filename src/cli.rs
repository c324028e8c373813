//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::config::ConfigOverrides;
use crate::logging::LogFormat;
use crate::rules::Metric;

/// Service recommendations from association rules mined over monthly user baskets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (UserId,ServiceId,CategoryId,CreateDate)
    #[arg(short, long, default_value = "armut_data.csv")]
    pub input: String,

    /// TOML configuration file (defaults to ./ruleforge.toml when present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Minimum itemset support, in (0, 1]
    #[arg(short = 's', long)]
    pub min_support: Option<f64>,

    /// Metric used to filter rules: support, confidence, lift, leverage, conviction
    #[arg(short, long)]
    pub metric: Option<Metric>,

    /// Minimum value of the filter metric
    #[arg(short = 't', long)]
    pub min_threshold: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Seed service (item_category, e.g. "2_0"); repeat for several seeds
    #[arg(long = "seed")]
    pub seeds: Vec<String>,

    /// Number of recommendations per seed
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Number of rules shown in the rule table
    #[arg(long, default_value = "10")]
    pub top_rules: usize,

    /// Write an SVG bar chart of the top rules by lift to this path
    #[arg(long)]
    pub chart: Option<String>,

    /// Print recommendations as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Log output format: compact, pretty or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Enable verbose output (debug-level logs and dataset summary)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Settings given on the command line, layered over the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            min_support: self.min_support,
            metric: self.metric,
            min_threshold: self.min_threshold,
            max_len: self.max_len,
            count: self.count,
            log_level: self.verbose.then(|| "debug".to_string()),
            log_format: self.log_format,
        }
    }
}
