use crate::{
    config::BenchConfig,
    error::BenchError,
    fixture::Fixture,
    pool::WorkerPool,
    run::{self, RunReport},
    task::Operation,
};
use core::fmt;

/// The runs of one operation against every list variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioReport {
    pub operation: Operation,
    pub runs: Vec<RunReport>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            writeln!(f, "{run}")?;
        }

        Ok(())
    }
}

/// Measures `operation` against a fresh list of every variant, in order.
///
/// One pool serves all the runs of the scenario and is drained between them. The first failed
/// run aborts the scenario, so no partial timings are reported.
pub fn run_scenario(
    config: &BenchConfig,
    operation: Operation,
) -> Result<ScenarioReport, BenchError> {
    config.validate()?;

    let _span = tracing::info_span!("scenario", %operation).entered();
    let fixture = Fixture::new(config.dataset_size);
    let pool = WorkerPool::new(config.workers, config.queue_capacity)?;
    let mut runs = Vec::with_capacity(fixture.lists.len());

    tracing::info!(
        workers = config.workers,
        dataset_size = config.dataset_size,
        operations_per_worker = config.operations_per_worker,
        "starting scenario"
    );

    for list in &fixture.lists {
        runs.push(run::run(&pool, list, config, operation)?);
    }

    Ok(ScenarioReport { operation, runs })
}

/// Runs the read, write and traversal scenarios, in that order.
pub fn run_all(config: &BenchConfig) -> Result<Vec<ScenarioReport>, BenchError> {
    Operation::ALL
        .iter()
        .map(|&operation| run_scenario(config, operation))
        .collect()
}
