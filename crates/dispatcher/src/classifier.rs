//! Severity classifier - pure routing decisions

use contracts::{RoutingDecision, RoutingRules, Severity};

/// Decide which sinks an event of `severity` reaches.
///
/// Pure and stateless; safe to call from any number of threads.
pub fn classify(severity: Severity, rules: &RoutingRules) -> RoutingDecision {
    RoutingDecision {
        persist: severity >= rules.min_severity_for_persist,
        alert: severity >= rules.min_severity_for_alert,
        notify: severity >= rules.min_severity_for_notify,
    }
}

/// Decision for every severity, lowest first
pub fn routing_table(rules: &RoutingRules) -> Vec<(Severity, RoutingDecision)> {
    Severity::ALL
        .iter()
        .map(|&severity| (severity, classify(severity, rules)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RoutingRules::default();

        let info = classify(Severity::Info, &rules);
        assert_eq!(
            info,
            RoutingDecision {
                persist: true,
                alert: false,
                notify: false
            }
        );

        let warning = classify(Severity::Warning, &rules);
        assert!(warning.persist && warning.notify && !warning.alert);

        let error = classify(Severity::Error, &rules);
        assert!(error.persist && error.notify && error.alert);

        let critical = classify(Severity::Critical, &rules);
        assert!(critical.persist && critical.notify && critical.alert);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let rules = RoutingRules {
            min_severity_for_persist: Severity::Success,
            min_severity_for_alert: Severity::Critical,
            min_severity_for_notify: Severity::Error,
            alert_sample_rate: 1.0,
        };

        assert!(classify(Severity::Info, &rules).is_empty());
        assert!(classify(Severity::Success, &rules).persist);
        assert!(!classify(Severity::Error, &rules).alert);
        assert!(classify(Severity::Error, &rules).notify);
        assert!(classify(Severity::Critical, &rules).alert);
    }

    #[test]
    fn test_routing_table_covers_all_severities() {
        let table = routing_table(&RoutingRules::default());
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].0, Severity::Info);
        assert_eq!(table[4].0, Severity::Critical);
        let alerting = table.iter().filter(|(_, d)| d.alert).count();
        assert_eq!(alerting, 2);
    }
}
