//! Economic model — advances every macro metric by one simulated year.
//!
//! Each metric drifts by its historical trend. Every deployed field whose
//! impact table names the metric multiplies that year's drift, so deployed
//! effects compound on top of the trend for as long as they stay deployed.
//!
//! Execution: once per `advance_time`, after the year counter moves.

use crate::{config::SimConfig, state::GameState, types::MetricKey};
use std::collections::BTreeMap;

/// Drift applied to `metric` this year given the current deployments.
pub fn annual_drift(state: &GameState, config: &SimConfig, metric: &str) -> f64 {
    let Some(base) = config.economy.metrics.get(metric) else {
        return 1.0;
    };

    state
        .deployed_fields()
        .filter_map(|field| config.impact_for(field))
        .filter_map(|impact| impact.multipliers.get(metric))
        .fold(base.historical_drift, |drift, multiplier| drift * multiplier)
}

/// Extra wealth growth granted by deployed fields this year.
pub fn annual_wealth_boost(state: &GameState, config: &SimConfig) -> f64 {
    state
        .deployed_fields()
        .filter_map(|field| config.impact_for(field))
        .filter_map(|impact| impact.annual_wealth_boost)
        .sum()
}

/// Apply one year of drift to every metric. Returns the new values.
pub fn step(state: &mut GameState, config: &SimConfig) -> BTreeMap<MetricKey, f64> {
    for (key, metric) in &config.economy.metrics {
        let drift = annual_drift(state, config, key);
        let current = state.economy.entry(key.clone()).or_insert(metric.initial);
        *current *= drift;
    }

    log::debug!(
        "year={} economy: {}",
        state.current_year,
        state
            .economy
            .iter()
            .map(|(k, v)| format!("{k}={v:.3}"))
            .collect::<Vec<_>>()
            .join(" ")
    );

    state.economy.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldId;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn undeployed_metrics_follow_historical_drift() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);

        let values = step(&mut state, &config);

        assert!(close(values["debt_gdp"], 65.0 * 1.025));
        assert!(close(values["gdp_growth"], 2.0 * 0.98));
        assert!(close(values["homelessness_k"], 650.0 * 1.03));
        assert!(close(values["defense_spending_gdp"], 4.0 * 1.005));
    }

    #[test]
    fn deployed_multipliers_compound_across_fields() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.dbe_deployment.insert(FieldId::HolographicEncoding, true);
        state.dbe_deployment.insert(FieldId::TopologicalQComputing, true);
        state.dbe_deployment.insert(FieldId::TimeCrystalSync, true);

        let drift = annual_drift(&state, &config, "gdp_growth");
        assert!(close(drift, 0.98 * 1.15 * 1.05 * 1.02));

        // fusion is not deployed, so defense spending keeps its trend
        assert!(close(annual_drift(&state, &config, "defense_spending_gdp"), 1.005));
    }

    #[test]
    fn deployed_effect_applies_every_year() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.dbe_deployment.insert(FieldId::FusionMhdControl, true);

        step(&mut state, &config);
        step(&mut state, &config);

        let per_year = 1.005 * 0.80;
        assert!(close(state.economy["defense_spending_gdp"], 4.0 * per_year * per_year));
    }

    #[test]
    fn wealth_boost_only_from_deployed_fields() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        assert_eq!(annual_wealth_boost(&state, &config), 0.0);

        state.dbe_deployment.insert(FieldId::FractonMemory, true);
        assert!(close(annual_wealth_boost(&state, &config), 0.01));
    }

    #[test]
    fn unknown_metric_is_neutral() {
        let config = SimConfig::default_test();
        let state = GameState::new(&config);
        assert_eq!(annual_drift(&state, &config, "inflation"), 1.0);
    }
}
