//! Seed-item recommendations ranked by rule lift

use tracing::debug;

use crate::error::{CoreResult, RecommendError};
use crate::rules::AssociationRule;

/// Rules pre-sorted by descending lift, ready to answer repeated lookups.
///
/// The sort is stable: rules with equal lift keep the order in which they
/// were generated, so results are deterministic for a deterministic rule
/// set.
#[derive(Debug, Clone)]
pub struct Recommender<'a> {
    ranked: Vec<&'a AssociationRule>,
}

impl<'a> Recommender<'a> {
    pub fn new(rules: &'a [AssociationRule]) -> Self {
        let mut ranked: Vec<&AssociationRule> = rules.iter().collect();
        ranked.sort_by(|a, b| b.lift.total_cmp(&a.lift));
        Self { ranked }
    }

    /// Rules in ranking order
    pub fn ranked(&self) -> &[&'a AssociationRule] {
        &self.ranked
    }

    /// Up to `count` items for a user who just acquired `seed`.
    ///
    /// Every rule whose antecedent contains `seed` contributes the first
    /// item of its consequent, in lift order. Items are NOT deduplicated: two
    /// qualifying rules sharing a leading consequent item both contribute.
    pub fn recommend(&self, seed: &str, count: usize) -> CoreResult<Vec<String>> {
        if count == 0 {
            return Err(RecommendError::invalid_argument(
                "recommendation count must be positive",
            ));
        }

        let recommendations: Vec<String> = self
            .ranked
            .iter()
            .filter(|rule| rule.antecedent_contains(seed))
            .filter_map(|rule| rule.consequent.first().cloned())
            .take(count)
            .collect();

        debug!(
            seed,
            count,
            returned = recommendations.len(),
            "recommendations computed"
        );

        Ok(recommendations)
    }
}

/// One-off lookup; sorts `rules` and delegates to [`Recommender::recommend`].
pub fn recommend(rules: &[AssociationRule], seed: &str, count: usize) -> CoreResult<Vec<String>> {
    Recommender::new(rules).recommend(seed, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(antecedent: &[&str], consequent: &[&str], lift: f64) -> AssociationRule {
        AssociationRule {
            antecedent: antecedent.iter().map(|s| s.to_string()).collect(),
            consequent: consequent.iter().map(|s| s.to_string()).collect(),
            antecedent_support: 0.1,
            consequent_support: 0.1,
            support: 0.05,
            confidence: 0.5,
            lift,
            leverage: 0.04,
            conviction: 1.8,
        }
    }

    fn sample_rules() -> Vec<AssociationRule> {
        vec![
            rule(&["2_0"], &["38_4"], 1.2),
            rule(&["15_1"], &["2_0"], 9.0),
            rule(&["2_0"], &["22_0"], 4.5),
            rule(&["2_0", "13_11"], &["25_0"], 3.1),
            rule(&["2_0"], &["15_1", "13_11"], 2.0),
            rule(&["9_4"], &["46_4"], 7.0),
        ]
    }

    #[test]
    fn test_top_recommendation() {
        let rules = sample_rules();
        assert_eq!(recommend(&rules, "2_0", 1).unwrap(), vec!["22_0"]);
    }

    #[test]
    fn test_lift_order_and_truncation() {
        let rules = sample_rules();
        let recommendations = recommend(&rules, "2_0", 5).unwrap();
        assert_eq!(recommendations, vec!["22_0", "25_0", "15_1", "38_4"]);

        let recommendations = recommend(&rules, "2_0", 2).unwrap();
        assert_eq!(recommendations, vec!["22_0", "25_0"]);
    }

    #[test]
    fn test_unknown_seed_is_empty() {
        let rules = sample_rules();
        assert!(recommend(&rules, "99_9", 3).unwrap().is_empty());
        // Appearing only in a consequent does not count.
        assert!(recommend(&rules, "46_4", 3).unwrap().is_empty());
        assert!(recommend(&[], "2_0", 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_count_rejected() {
        let rules = sample_rules();
        assert!(matches!(
            recommend(&rules, "2_0", 0),
            Err(RecommendError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let rules = vec![
            rule(&["2_0"], &["22_0"], 3.0),
            rule(&["2_0", "25_0"], &["22_0"], 2.0),
            rule(&["2_0"], &["25_0"], 1.0),
        ];
        assert_eq!(
            recommend(&rules, "2_0", 3).unwrap(),
            vec!["22_0", "22_0", "25_0"]
        );
    }

    #[test]
    fn test_equal_lift_keeps_generation_order() {
        let rules = vec![
            rule(&["2_0"], &["b"], 2.0),
            rule(&["2_0"], &["a"], 2.0),
            rule(&["2_0"], &["c"], 5.0),
            rule(&["2_0"], &["d"], 2.0),
        ];
        assert_eq!(
            recommend(&rules, "2_0", 4).unwrap(),
            vec!["c", "b", "a", "d"]
        );
    }

    #[test]
    fn test_recommender_reuse() {
        let rules = sample_rules();
        let recommender = Recommender::new(&rules);

        assert_eq!(recommender.ranked()[0].lift, 9.0);
        assert_eq!(recommender.recommend("15_1", 3).unwrap(), vec!["2_0"]);
        assert_eq!(recommender.recommend("9_4", 3).unwrap(), vec!["46_4"]);
        assert_eq!(recommender.recommend("2_0", 1).unwrap(), vec!["22_0"]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: output never exceeds the requested count, and every
            /// item comes from a rule whose antecedent holds the seed.
            #[test]
            fn bounded_and_grounded(
                entries in prop::collection::vec((0u8..4, 0u8..4, 0.0f64..10.0), 0..40),
                seed in 0u8..4,
                count in 1usize..8,
            ) {
                let rules: Vec<AssociationRule> = entries
                    .iter()
                    .map(|(a, c, lift)| {
                        rule(&[a.to_string().as_str()], &[format!("{}x", c).as_str()], *lift)
                    })
                    .collect();
                let seed = seed.to_string();
                let recommendations = recommend(&rules, &seed, count).unwrap();

                prop_assert!(recommendations.len() <= count);
                let qualifying = rules.iter().filter(|r| r.antecedent_contains(&seed)).count();
                prop_assert_eq!(recommendations.len(), qualifying.min(count));
                for item in &recommendations {
                    prop_assert!(rules
                        .iter()
                        .any(|r| r.antecedent_contains(&seed) && &r.consequent[0] == item));
                }
            }
        }
    }
}
