//! Static configuration: rank table, tunables, economic baseline and the
//! question bank. Immutable for the lifetime of a run.
//!
//! `SimConfig::load(data_dir)` reads the JSON files under `data/`.
//! `SimConfig::embedded()` parses the same files compiled into the binary.

use crate::types::{FieldId, MetricKey, PoliticalLevel, Xp, Year};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunables {
    /// Per-field XP required before a deployment vote may be called.
    pub vote_gate_xp: Xp,
    pub xp_per_answer: Xp,
    /// Total XP needed per unlocked quiz level.
    pub xp_per_level: Xp,
    /// Dollars granted per XP, scaled by the rank score.
    pub wealth_per_xp: f64,
    pub required_vote_weight: f64,
    pub max_pass_probability: f64,
    /// Net worth at which the wealth factor reaches 1.0.
    pub trillion_log_base: f64,
    pub max_attempts: u8,
    /// Quiz history entries kept across a year boundary.
    pub history_window: usize,
    pub max_level: u8,
    pub correct_advance_delay_ms: u64,
    pub exhausted_advance_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialStateConfig {
    pub start_year: Year,
    pub max_year: Year,
    pub net_worth: f64,
    pub wealth_growth_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct TunablesFile {
    tunables: Tunables,
    initial_state: InitialStateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankTier {
    pub level: PoliticalLevel,
    pub min_xp: Xp,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RanksFile {
    ranks: Vec<RankTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    pub initial: f64,
    pub unit: String,
    pub historical_drift: f64,
}

/// What deploying one field does to the economy, applied every year it
/// stays deployed. Metrics absent from `multipliers` are unaffected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldImpact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_wealth_boost: Option<f64>,
    #[serde(flatten)]
    pub multipliers: BTreeMap<MetricKey, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicConfig {
    pub metrics: BTreeMap<MetricKey, MetricConfig>,
    pub dbe_impact: BTreeMap<FieldId, FieldImpact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    /// Also the question's identity in the quiz history.
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: [String; 3],
    pub field: FieldId,
    pub level: u8,
    pub hint: String,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionBankFile {
    questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tunables: Tunables,
    pub initial_state: InitialStateConfig,
    /// Sorted ascending by `min_xp`.
    pub ranks: Vec<RankTier>,
    pub economy: EconomicConfig,
    pub questions: Vec<Question>,
}

const EMBEDDED_TUNABLES: &str = include_str!("../../data/game/tunables.json");
const EMBEDDED_RANKS: &str = include_str!("../../data/game/ranks.json");
const EMBEDDED_ECONOMY: &str = include_str!("../../data/economy/economic_model.json");
const EMBEDDED_QUESTIONS: &str = include_str!("../../data/quiz/question_bank.json");

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let read = |rel: &str| -> anyhow::Result<String> {
            let path = format!("{data_dir}/{rel}");
            std::fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))
        };

        Self::from_json(
            &read("game/tunables.json")?,
            &read("game/ranks.json")?,
            &read("economy/economic_model.json")?,
            &read("quiz/question_bank.json")?,
        )
    }

    /// The data files shipped with the crate, compiled in.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(
            EMBEDDED_TUNABLES,
            EMBEDDED_RANKS,
            EMBEDDED_ECONOMY,
            EMBEDDED_QUESTIONS,
        )
    }

    /// Config for unit and integration tests.
    pub fn default_test() -> Self {
        Self::embedded().expect("embedded data files are valid")
    }

    fn from_json(
        tunables: &str,
        ranks: &str,
        economy: &str,
        questions: &str,
    ) -> anyhow::Result<Self> {
        let tunables_file: TunablesFile =
            serde_json::from_str(tunables).context("parsing tunables.json")?;
        let ranks_file: RanksFile = serde_json::from_str(ranks).context("parsing ranks.json")?;
        let economy: EconomicConfig =
            serde_json::from_str(economy).context("parsing economic_model.json")?;
        let bank: QuestionBankFile =
            serde_json::from_str(questions).context("parsing question_bank.json")?;

        let mut ranks = ranks_file.ranks;
        ranks.sort_by_key(|r| r.min_xp);

        let config = Self {
            tunables: tunables_file.tunables,
            initial_state: tunables_file.initial_state,
            ranks,
            economy,
            questions: bank.questions,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let t = &self.tunables;
        if t.vote_gate_xp == 0 || t.xp_per_level == 0 || t.max_attempts == 0 || t.max_level == 0 {
            bail!("vote_gate_xp, xp_per_level, max_attempts and max_level must be positive");
        }
        if t.required_vote_weight <= 0.0 || t.trillion_log_base <= 1.0 {
            bail!("required_vote_weight must be > 0 and trillion_log_base > 1");
        }
        if self.initial_state.start_year > self.initial_state.max_year {
            bail!(
                "start_year {} is after max_year {}",
                self.initial_state.start_year,
                self.initial_state.max_year
            );
        }

        match self.ranks.first() {
            Some(first) if first.min_xp == 0 => {}
            _ => bail!("rank table must start at 0 XP"),
        }
        for pair in self.ranks.windows(2) {
            if pair[1].min_xp <= pair[0].min_xp || pair[1].score <= pair[0].score {
                bail!(
                    "ranks must strictly increase in min_xp and score ({} -> {})",
                    pair[0].level,
                    pair[1].level
                );
            }
        }

        for (field, impact) in &self.economy.dbe_impact {
            for metric in impact.multipliers.keys() {
                if !self.economy.metrics.contains_key(metric) {
                    bail!("impact for {field} names unknown metric '{metric}'");
                }
            }
        }

        let mut seen = HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.text.as_str()) {
                bail!("duplicate question text: {}", q.text);
            }
            if q.level == 0 || q.level > t.max_level {
                bail!("question level {} outside 1..={}: {}", q.level, t.max_level, q.text);
            }
        }
        Ok(())
    }

    /// The highest rank tier.
    pub fn top_rank(&self) -> &RankTier {
        self.ranks.last().expect("validated rank table is non-empty")
    }

    pub fn impact_for(&self, field: FieldId) -> Option<&FieldImpact> {
        self.economy.dbe_impact.get(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_baseline() {
        let config = SimConfig::default_test();

        assert_eq!(config.ranks.len(), 3);
        assert_eq!(config.ranks[1].level, PoliticalLevel::Governor);
        assert_eq!(config.ranks[1].min_xp, 15);
        assert_eq!(config.top_rank().level, PoliticalLevel::President);
        assert_eq!(config.questions.len(), 15);
        assert_eq!(config.tunables.vote_gate_xp, 5);
        assert_eq!(config.initial_state.start_year, 2007);

        let fracton = config.impact_for(FieldId::FractonMemory).unwrap();
        assert_eq!(fracton.annual_wealth_boost, Some(0.01));
        assert_eq!(fracton.multipliers.get("debt_gdp"), Some(&0.95));
        assert!(!fracton.multipliers.contains_key("annual_wealth_boost"));
    }

    #[test]
    fn every_field_has_a_question_at_every_level() {
        let config = SimConfig::default_test();
        for field in FieldId::ALL {
            for level in 1..=config.tunables.max_level {
                assert!(
                    config.questions.iter().any(|q| q.field == field && q.level == level),
                    "no level {level} question for {field}"
                );
            }
        }
    }

    #[test]
    fn rejects_non_increasing_ranks() {
        let ranks = r#"{ "ranks": [
            { "level": "mayor", "min_xp": 0, "score": 1.0 },
            { "level": "governor", "min_xp": 15, "score": 1.0 }
        ] }"#;
        let err = SimConfig::from_json(EMBEDDED_TUNABLES, ranks, EMBEDDED_ECONOMY, EMBEDDED_QUESTIONS)
            .unwrap_err();
        assert!(err.to_string().contains("strictly increase"), "{err}");
    }

    #[test]
    fn rejects_impact_on_unknown_metric() {
        let economy = r#"{
            "metrics": { "debt_gdp": { "initial": 65.0, "unit": "%", "historical_drift": 1.0 } },
            "dbe_impact": { "fracton_memory": { "inflation": 0.9 } }
        }"#;
        let err = SimConfig::from_json(EMBEDDED_TUNABLES, EMBEDDED_RANKS, economy, EMBEDDED_QUESTIONS)
            .unwrap_err();
        assert!(err.to_string().contains("unknown metric"), "{err}");
    }
}
