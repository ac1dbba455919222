use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};
use crate::scenarios::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Highest day reached over all iterations.
    pub best_day: u32,
    pub battles_won: u32,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self {
            tester: GameTester::new(verbose),
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut best_day = 0;
        let mut battles_won = 0;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.tester.run_plan(&scenario.plan, iteration_seed);
            best_day = best_day.max(summary.days_survived);
            battles_won += summary.victories;

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                let context = summarize_decision_path(&summary);
                failures.push(format!(
                    "Iteration {} (strategy {}, seed {}, steps {}, day {}, {}): {} | {} | final HP {} hunger {:.0} energy {:.0} radiation {:.0}",
                    i + 1,
                    summary.strategy,
                    summary.seed,
                    summary.steps,
                    summary.days_survived,
                    if summary.defeated { "defeated" } else { "alive" },
                    err,
                    context,
                    summary.final_snapshot.vitals.health,
                    summary.final_snapshot.vitals.hunger,
                    summary.final_snapshot.vitals.energy,
                    summary.final_snapshot.vitals.radiation,
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ Seed {} | Decisions: {}", summary.seed, context);
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) day:{} battles:{}/{} strategy:{}",
                        i + 1,
                        iterations,
                        summary.days_survived,
                        summary.victories,
                        summary.battles_started,
                        summary.strategy
                    );
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            best_day,
            battles_won,
            average_duration,
            performance_data,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if let Some(first) = summary.violations.first() {
        return Some(format!(
            "{} invariant violation(s), first: {first}",
            summary.violations.len()
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    if summary.decision_log.is_empty() {
        return "no steps recorded".to_string();
    }

    summary
        .decision_log
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            format!(
                "step {} day {} {:?}: {}{}",
                entry.step,
                entry.day,
                entry.segment,
                entry.label,
                if entry.rejected { " (rejected)" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::get_scenario;

    #[test]
    fn smoke_scenario_passes_for_a_fixed_seed() {
        let scenario = get_scenario("smoke").unwrap();
        let results = LogicTester::new(false).run_scenario(&scenario, &[1337], 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 2);
        assert!(result.best_day >= 1);
    }

    #[test]
    fn failing_expectations_are_reported_with_context() {
        let scenario = TestScenario {
            name: "impossible".to_string(),
            description: "always fails".to_string(),
            plan: SimulationPlan::new(crate::logic::GameplayStrategy::Balanced)
                .with_max_steps(5)
                .with_expectation(|_: &SimulationSummary| -> anyhow::Result<()> {
                    anyhow::bail!("nope")
                }),
        };
        let results = LogicTester::new(false).run_scenario(&scenario, &[1], 1);
        assert!(!results[0].passed);
        assert!(results[0].failures[0].contains("nope"));
        assert!(results[0].failures[0].contains("step"));
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            best_day: 2,
            battles_won: 0,
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["average_duration"], 12);
        let back: ScenarioResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.performance_data, vec![Duration::from_millis(12)]);
    }
}
