//! Runs the selected scenarios in registry order and collects a report.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LifecycleError;
use crate::lifecycle::{Scenario, ScenarioSelection, VaultLifecycle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { error: String },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub description: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    pub chain: String,
    pub vault: String,
    pub vault_contract: String,
    pub strategy_contract: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ScenarioResult>,
}

impl LifecycleReport {
    pub fn failed(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }

    pub fn count(&self, wanted: fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| wanted(&r.outcome)).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn to_json(&self) -> Result<String, LifecycleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct LifecycleRunner {
    lifecycle: VaultLifecycle,
    selection: ScenarioSelection,
}

impl LifecycleRunner {
    pub fn new(lifecycle: VaultLifecycle, selection: ScenarioSelection) -> Self {
        Self {
            lifecycle,
            selection,
        }
    }

    pub async fn run(&self) -> LifecycleReport {
        let config = self.lifecycle.config();
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(Scenario::ALL.len());

        for scenario in Scenario::ALL {
            if !self.selection.includes(scenario) {
                tracing::debug!(%scenario, "skipped");
                results.push(ScenarioResult {
                    scenario,
                    description: scenario.description(),
                    outcome: Outcome::Skipped,
                    elapsed_ms: 0,
                });
                continue;
            }

            tracing::info!(%scenario, "{}", scenario.description());
            let start = Instant::now();
            let outcome = match self.run_one(scenario).await {
                Ok(()) => {
                    tracing::info!(%scenario, "passed");
                    Outcome::Passed
                }
                Err(e) => {
                    tracing::error!(%scenario, error = %e, "failed");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(ScenarioResult {
                scenario,
                description: scenario.description(),
                outcome,
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }

        LifecycleReport {
            chain: config.chain.clone(),
            vault: config.vault.to_string(),
            vault_contract: config.vault_contract.clone(),
            strategy_contract: config.strategy_contract.clone(),
            started_at,
            finished_at: Utc::now(),
            results,
        }
    }

    /// Setup and body of one scenario under the configured timeout.
    async fn run_one(&self, scenario: Scenario) -> Result<(), LifecycleError> {
        let timeout = self.lifecycle.config().scenario_timeout;
        let body = async {
            let fixture = self.lifecycle.setup().await?;
            self.lifecycle.run(scenario, &fixture).await
        };
        tokio::time::timeout(timeout, body).await.map_err(|_| {
            LifecycleError::Timeout(format!(
                "{scenario} exceeded {} ms",
                timeout.as_millis()
            ))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(scenario: Scenario, outcome: Outcome) -> ScenarioResult {
        ScenarioResult {
            scenario,
            description: scenario.description(),
            outcome,
            elapsed_ms: 1,
        }
    }

    fn report(results: Vec<ScenarioResult>) -> LifecycleReport {
        LifecycleReport {
            chain: "moonriver".into(),
            vault: "0x36f2f0e069C9Aa9b7B02fa4Fd98Bb54129AD2F6c".into(),
            vault_contract: "BeefyVaultV6".into(),
            strategy_contract: "StrategyMrSushiLP".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results,
        }
    }

    #[test]
    fn test_report_success_and_counts() {
        let r = report(vec![
            result(Scenario::DepositWithdraw, Outcome::Passed),
            result(Scenario::Panic, Outcome::Skipped),
        ]);
        assert!(r.is_success());
        assert_eq!(r.count(|o| *o == Outcome::Passed), 1);
        assert_eq!(r.count(|o| *o == Outcome::Skipped), 1);

        let r = report(vec![result(
            Scenario::Harvest,
            Outcome::Failed {
                error: "boom".into(),
            },
        )]);
        assert!(!r.is_success());
        assert_eq!(r.failed().count(), 1);
    }

    #[test]
    fn test_report_json_shape() {
        let r = report(vec![result(
            Scenario::Harvest,
            Outcome::Failed {
                error: "boom".into(),
            },
        )]);
        let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        let first = &value["results"][0];
        assert_eq!(first["scenario"], "harvest");
        assert_eq!(first["status"], "failed");
        assert_eq!(first["error"], "boom");
        assert_eq!(value["chain"], "moonriver");
    }
}
