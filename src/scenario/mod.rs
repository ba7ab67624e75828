pub mod catalog;
pub mod executor;
pub mod expect;
pub mod runner;
pub mod schema;
pub mod session;

pub use catalog::Catalog;
pub use executor::ScenarioExecutor;
pub use runner::ScenarioRunner;
pub use schema::{
    CountExpectation, RunStatus, RunSummary, Scenario, ScenarioRun, Step, StepResult,
};
pub use session::{interpolate_step, Session};
