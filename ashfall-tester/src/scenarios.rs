use anyhow::{Result, ensure};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

/// A named simulation plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(
        name: impl Into<String>,
        description: impl Into<String>,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            plan,
        }
    }
}

const CATALOG: [(&str, &str); 5] = [
    ("smoke", "Short balanced run; events flow and invariants hold"),
    ("invariants", "Random actions against every command surface"),
    ("determinism", "Same seed twice yields the same event stream"),
    ("combat-gauntlet", "Reckless sweep that must pick fights"),
    ("long-haul", "Cautious multi-day survival run"),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.to_vec()
}

/// Every catalog key, in listing order.
#[must_use]
pub fn all_scenario_names() -> Vec<String> {
    CATALOG.iter().map(|(key, _)| (*key).to_string()).collect()
}

fn describe(key: &str) -> &'static str {
    CATALOG
        .iter()
        .find(|(name, _)| *name == key)
        .map_or("", |(_, description)| description)
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let plan = match name {
        "smoke" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_steps(50)
            .with_expectation(|summary: &SimulationSummary| -> Result<()> {
                ensure!(summary.events_seen > 0, "no events were published");
                ensure!(summary.steps > 0, "simulation never stepped");
                Ok(())
            }),
        "invariants" => SimulationPlan::new(GameplayStrategy::Chaotic)
            .with_max_steps(400)
            .with_expectation(|summary: &SimulationSummary| -> Result<()> {
                ensure!(
                    summary.rejections > 0,
                    "chaotic play never hit a rejected command"
                );
                Ok(())
            }),
        "determinism" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_steps(250)
            .with_replay()
            .with_expectation(|summary: &SimulationSummary| -> Result<()> {
                let replay = summary.replay_digest.as_deref().unwrap_or_default();
                ensure!(
                    replay == summary.event_digest,
                    "replay digest {replay} differs from {}",
                    summary.event_digest
                );
                Ok(())
            }),
        "combat-gauntlet" => SimulationPlan::new(GameplayStrategy::Reckless)
            .with_max_steps(300)
            .with_expectation(|summary: &SimulationSummary| -> Result<()> {
                ensure!(summary.battles_started >= 1, "no battle was started");
                let finished = summary.victories + summary.defeats + summary.escapes;
                ensure!(
                    finished + 1 >= summary.battles_started,
                    "{} battles started but only {finished} ended",
                    summary.battles_started
                );
                Ok(())
            }),
        "long-haul" => SimulationPlan::new(GameplayStrategy::Cautious)
            .with_max_steps(1500)
            .with_expectation(|summary: &SimulationSummary| -> Result<()> {
                if summary.defeated {
                    ensure!(
                        summary.final_snapshot.vitals.health == 0,
                        "defeated with {} health left",
                        summary.final_snapshot.vitals.health
                    );
                } else {
                    ensure!(
                        summary.days_survived >= 3,
                        "only reached day {}",
                        summary.days_survived
                    );
                }
                Ok(())
            }),
        _ => return None,
    };
    Some(TestScenario::simulation(name, describe(name), plan))
}
