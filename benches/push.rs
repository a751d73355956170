use list_contention::{logging, run_scenario, BenchConfig, BenchError, Operation};

fn main() -> Result<(), BenchError> {
    logging::init();

    let report = run_scenario(&BenchConfig::default(), Operation::Push)?;
    print!("{report}");

    Ok(())
}
