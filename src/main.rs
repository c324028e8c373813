//! RuleForge: service recommendations from association rules
//!
//! This is the main entrypoint that orchestrates data loading, rule mining,
//! reporting and recommendation lookups.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use ruleforge::{
    load_transactions, logging, report, run_pipeline, AppConfig, Args, DatasetSummary,
};
use serde_json::json;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref().map(Path::new), args.overrides())?;
    logging::init(&config.logging.level, config.logging.format);

    if args.verbose && !args.json {
        println!("RuleForge - Association Rule Service Recommendations");
        println!("====================================================\n");
    }

    let start_time = Instant::now();

    // Step 1: Load transactions
    let records = load_transactions(&args.input)?;
    if !args.json {
        println!("✓ Data loaded: {} transactions", records.len());
        if args.verbose {
            report::print_dataset_summary(&DatasetSummary::from_records(&records));
        }
    }

    // Step 2: Mine itemsets and rules
    let mining_start = Instant::now();
    let outcome = run_pipeline(&records, &config.mining)?;
    info!(
        elapsed_ms = mining_start.elapsed().as_millis() as u64,
        rules = outcome.rules.len(),
        "mining finished"
    );

    if !args.json {
        println!("✓ Rules mined: {}", outcome.rules.len());
        report::print_basket_statistics(&outcome.matrix, &outcome.itemsets);
        report::print_rule_table(&outcome.rules, args.top_rules);
    }

    if let Some(chart_path) = &args.chart {
        report::create_lift_chart(&outcome.rules, chart_path, args.top_rules)?;
    }

    // Step 3: Recommend
    let recommender = outcome.recommender();
    let mut results = Vec::with_capacity(args.seeds.len());
    for seed in &args.seeds {
        let recommendations = recommender.recommend(seed, config.count)?;
        if !args.json {
            report::print_recommendations(seed, &recommendations);
        }
        results.push(json!({ "seed": seed, "recommendations": recommendations }));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("\n=== Pipeline Complete ===");
        println!(
            "Total processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
