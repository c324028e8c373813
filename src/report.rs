//! Console reports and a Plotters lift chart for mined rules

use plotters::prelude::*;

use crate::basket::TransactionMatrix;
use crate::data::DatasetSummary;
use crate::itemset::FrequentItemsets;
use crate::recommend::Recommender;
use crate::rules::AssociationRule;

/// Bar colors cycled across ranked rules
const RULE_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, CYAN, MAGENTA];

/// Print a short data-understanding report for the loaded records
pub fn print_dataset_summary(summary: &DatasetSummary) {
    println!("\n=== Dataset Summary ===");
    println!("Records: {}", summary.records);
    println!("Users: {}", summary.users);
    println!("Services: {}", summary.services);
    println!("Categories: {}", summary.categories);
    println!("Service/category pairs: {}", summary.item_categories);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Date range: {} .. {}", first, last);
    }
}

/// Print basket and itemset statistics
pub fn print_basket_statistics(matrix: &TransactionMatrix, itemsets: &FrequentItemsets) {
    println!("\n=== Basket Statistics ===");
    println!("Baskets (user x month): {}", matrix.n_baskets());
    println!("Distinct services: {}", matrix.n_items());

    let sizes = matrix.basket_sizes();
    if !sizes.is_empty() {
        let mean = sizes.iter().sum::<usize>() as f64 / sizes.len() as f64;
        let largest = sizes.iter().copied().max().unwrap_or(0);
        println!("Mean basket size: {:.2} (largest {})", mean, largest);
    }

    println!(
        "Frequent itemsets: {} (min support {})",
        itemsets.len(),
        itemsets.min_support()
    );
    for size in 1..=itemsets.max_len() {
        println!("  size {}: {}", size, itemsets.of_size(size).count());
    }
}

/// Print the `top` rules by lift as a table
pub fn print_rule_table(rules: &[AssociationRule], top: usize) {
    println!("\n=== Top Rules by Lift ({} total) ===", rules.len());
    println!(
        "  {:<24} | {:<24} | {:>7} | {:>10} | {:>7}",
        "Antecedent", "Consequent", "Support", "Confidence", "Lift"
    );
    println!("  {}", "-".repeat(84));

    let recommender = Recommender::new(rules);
    for rule in recommender.ranked().iter().take(top) {
        println!(
            "  {:<24} | {:<24} | {:>7.4} | {:>10.4} | {:>7.3}",
            rule.antecedent.join(", "),
            rule.consequent.join(", "),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
}

pub fn print_recommendations(seed: &str, recommendations: &[String]) {
    if recommendations.is_empty() {
        println!("\nNo recommendations for {} (not in any rule antecedent)", seed);
        return;
    }
    println!("\nRecommendations for {}: {}", seed, recommendations.join(", "));
}

/// Bar chart of the `top` rules ranked by lift, written as SVG
pub fn create_lift_chart(rules: &[AssociationRule], output_path: &str, top: usize) -> crate::Result<()> {
    let recommender = Recommender::new(rules);
    let ranked: Vec<&AssociationRule> = recommender.ranked().iter().take(top).copied().collect();
    if ranked.is_empty() {
        anyhow::bail!("No rules to chart");
    }

    let max_lift = ranked.iter().map(|rule| rule.lift).fold(f64::NEG_INFINITY, f64::max);

    let root = SVGBackend::new(output_path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Top Association Rules by Lift", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(ranked.len() as f64), 0f64..(max_lift * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Rule rank")
        .y_desc("Lift")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (rank, rule) in ranked.iter().enumerate() {
        let color = RULE_COLORS[rank % RULE_COLORS.len()];
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(rank as f64 + 0.1, 0.0), (rank as f64 + 0.9, rule.lift)],
                color.filled(),
            )))?
            .label(rule.to_string())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    println!("Lift chart saved to: {}", output_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itemset::mine_frequent_itemsets;
    use crate::rules::{generate_rules, Metric};
    use std::path::Path;
    use tempfile::tempdir;

    fn create_test_rules() -> (TransactionMatrix, FrequentItemsets, Vec<AssociationRule>) {
        let matrix = TransactionMatrix::from_baskets(vec![
            ("1_2017-08", vec!["2_0", "22_0"]),
            ("2_2017-08", vec!["2_0", "22_0", "25_0"]),
            ("3_2017-09", vec!["2_0", "25_0"]),
            ("4_2017-09", vec!["38_4"]),
        ]);
        let itemsets = mine_frequent_itemsets(&matrix, 0.25).unwrap();
        let rules = generate_rules(&itemsets, Metric::Support, 0.25).unwrap();
        (matrix, itemsets, rules)
    }

    #[test]
    fn test_create_lift_chart() {
        let (_matrix, _itemsets, rules) = create_test_rules();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("lift.svg");
        let output_str = output_path.to_str().unwrap();

        let result = create_lift_chart(&rules, output_str, 5);
        assert!(result.is_ok());
        assert!(Path::new(output_str).exists());
    }

    #[test]
    fn test_lift_chart_without_rules() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("empty.svg");

        let result = create_lift_chart(&[], output_path.to_str().unwrap(), 5);
        assert!(result.is_err());
    }

    #[test]
    fn test_print_functions_do_not_panic() {
        let (matrix, itemsets, rules) = create_test_rules();
        print_basket_statistics(&matrix, &itemsets);
        print_rule_table(&rules, 3);
        print_rule_table(&[], 3);
        print_recommendations("2_0", &["22_0".to_string()]);
        print_recommendations("99_9", &[]);
        print_dataset_summary(&DatasetSummary::from_records(&[]));
    }
}
