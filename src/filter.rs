//! Business thresholds applied to generated rules

use crate::rules::AssociationRule;

/// Minimum confidence, lift and support a rule needs to be reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessFilter {
    pub min_confidence: f64,
    pub min_lift: f64,
    pub min_support: f64,
}

impl Default for BusinessFilter {
    fn default() -> Self {
        Self {
            min_confidence: 0.4,
            min_lift: 1.5,
            min_support: 0.02,
        }
    }
}

impl BusinessFilter {
    pub fn accepts(&self, rule: &AssociationRule) -> bool {
        rule.confidence >= self.min_confidence
            && rule.lift >= self.min_lift
            && rule.support >= self.min_support
    }

    /// Keep accepted rules, strongest leverage first.
    ///
    /// The sort is stable so rules with equal leverage keep generation order.
    pub fn apply(&self, rules: Vec<AssociationRule>) -> Vec<AssociationRule> {
        let mut kept: Vec<AssociationRule> =
            rules.into_iter().filter(|rule| self.accepts(rule)).collect();
        kept.sort_by(|a, b| b.leverage.total_cmp(&a.leverage));
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleMetrics;

    fn rule(
        name: &str,
        support: f64,
        antecedent_support: f64,
        consequent_support: f64,
    ) -> AssociationRule {
        let metrics = RuleMetrics::compute(support, antecedent_support, consequent_support);
        AssociationRule {
            antecedent: vec![name.to_string()],
            consequent: vec!["x".to_string()],
            antecedent_support,
            consequent_support,
            support: metrics.support,
            confidence: metrics.confidence,
            lift: metrics.lift,
            leverage: metrics.leverage,
            conviction: metrics.conviction,
        }
    }

    #[test]
    fn test_thresholds() {
        let filter = BusinessFilter::default();

        // confidence 0.5, lift 2.5, support 0.05
        assert!(filter.accepts(&rule("ok", 0.05, 0.1, 0.2)));
        // confidence 0.3
        assert!(!filter.accepts(&rule("low_conf", 0.03, 0.1, 0.1)));
        // lift 1.25
        assert!(!filter.accepts(&rule("low_lift", 0.05, 0.1, 0.4)));
        // support 0.01
        assert!(!filter.accepts(&rule("low_support", 0.01, 0.02, 0.1)));
    }

    #[test]
    fn test_orders_by_leverage_descending() {
        let rules = vec![
            rule("small", 0.05, 0.1, 0.2),
            rule("large", 0.2, 0.25, 0.3),
            rule("medium", 0.1, 0.2, 0.2),
        ];

        let kept = BusinessFilter::default().apply(rules);
        let order: Vec<&str> = kept.iter().map(|r| r.antecedent[0].as_str()).collect();

        assert_eq!(order, vec!["large", "medium", "small"]);
    }

    #[test]
    fn test_equal_leverage_keeps_input_order() {
        let rules = vec![rule("first", 0.05, 0.1, 0.2), rule("second", 0.05, 0.1, 0.2)];
        let kept = BusinessFilter::default().apply(rules);

        assert_eq!(kept[0].antecedent[0], "first");
        assert_eq!(kept[1].antecedent[0], "second");
    }

    #[test]
    fn test_perfect_confidence_still_needs_lift_and_support() {
        let filter = BusinessFilter::default();

        // confidence 1, lift 2, support 0.1
        let strong = rule("strong", 0.1, 0.1, 0.5);
        assert!(strong.conviction.is_infinite());
        assert!(filter.accepts(&strong));

        // confidence 1, lift 1.11
        let weak_lift = rule("weak_lift", 0.1, 0.1, 0.9);
        assert!(weak_lift.conviction.is_infinite());
        assert!(!filter.accepts(&weak_lift));

        // confidence 1, support 0.01
        let rare = rule("rare", 0.01, 0.01, 0.1);
        assert!(!filter.accepts(&rare));
    }

    #[test]
    fn test_nothing_survives() {
        let kept = BusinessFilter::default().apply(vec![rule("low_conf", 0.03, 0.1, 0.1)]);
        assert!(kept.is_empty());
    }
}
