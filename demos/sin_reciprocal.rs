//! Integrates sin(1/x) over [1, 2] and prints what the pool did.

use gstack_rs::prelude::*;

fn main() -> Result<()> {
    let integrator = Integrator::new(Config::builder().tolerance(1e-6).build()?)?;

    let report = integrator.integrate_with_report(|x: f64| (1.0 / x).sin(), 1.0, 2.0)?;

    println!("integrator result: {}", report.value);
    println!(
        "{} evaluations, {} leaves, {} migrations ({} entries) in {:?}",
        report.evaluations,
        report.leaves,
        report.migrations,
        report.migrated_entries,
        report.elapsed
    );
    for worker in &report.workers {
        println!(
            "  worker {}: {} intervals taken, {} refinements",
            worker.id, worker.global_takes, worker.refinements
        );
    }

    Ok(())
}
