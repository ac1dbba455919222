pub mod policy;
pub mod reports;
pub mod simulation;
pub mod tester;

pub use policy::GameplayStrategy;
pub use simulation::{SimulationPlan, SimulationSummary};
pub use tester::*;
