use gstack_rs::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

fn integrator_with(threads: usize) -> Integrator {
    let config = Config::builder().num_threads(threads).build().unwrap();
    Integrator::new(config).unwrap()
}

fn assert_close(value: f64, expected: f64, rel: f64) {
    assert!(
        (value - expected).abs() <= rel * expected.abs(),
        "got {}, expected {} (rel tol {})",
        value,
        expected,
        rel
    );
}

#[test]
fn test_square_for_every_worker_count() {
    for threads in [1, 2, 4, 8] {
        let value = integrator_with(threads)
            .integrate(|x: f64| x * x, 0.0, 1.0)
            .unwrap();
        assert_close(value, 1.0 / 3.0, 1e-3);
    }
}

#[test]
fn test_closed_form_integrals() {
    let integrator = integrator_with(4);

    let sin = integrator.integrate(|x: f64| x.sin(), 0.0, std::f64::consts::PI).unwrap();
    assert_close(sin, 2.0, 1e-3);

    let exp = integrator.integrate(|x: f64| x.exp(), 0.0, 1.0).unwrap();
    assert_close(exp, std::f64::consts::E - 1.0, 1e-3);

    let recip = integrator.integrate(|x: f64| 1.0 / x, 1.0, 10.0).unwrap();
    assert_close(recip, 10.0_f64.ln(), 1e-3);
}

#[test]
fn test_single_worker_is_repeatable() {
    let integrator = integrator_with(1);
    let f = |x: f64| (5.0 * x).sin() * x.exp();

    let first = integrator.integrate(f, 0.0, 3.0).unwrap();
    for _ in 0..5 {
        assert_eq!(integrator.integrate(f, 0.0, 3.0).unwrap(), first);
    }
}

#[test]
fn test_parallel_runs_agree_within_tolerance() {
    let f = |x: f64| (5.0 * x).sin() * x.exp() + 3.0;
    let reference = integrator_with(1).integrate(f, 0.0, 3.0).unwrap();

    let integrator = integrator_with(4);
    for _ in 0..10 {
        let value = integrator.integrate(f, 0.0, 3.0).unwrap();
        assert_close(value, reference, 1e-6);
    }
}

#[test]
fn test_evaluation_count_independent_of_workers() {
    let count_for = |threads: usize| {
        let calls = AtomicU64::new(0);
        let f = |x: f64| {
            calls.fetch_add(1, Ordering::Relaxed);
            (3.0 * x).cos() + x * x
        };
        integrator_with(threads).integrate(f, -2.0, 2.0).unwrap();
        calls.load(Ordering::Relaxed)
    };

    let baseline = count_for(1);
    assert!(baseline > 3);
    for threads in [2, 4, 8] {
        assert_eq!(count_for(threads), baseline, "threads = {}", threads);
    }
}

#[test]
fn test_report_matches_counting_wrapper() {
    let calls = AtomicU64::new(0);
    let f = |x: f64| {
        calls.fetch_add(1, Ordering::Relaxed);
        x.sqrt()
    };

    let report = integrator_with(4).integrate_with_report(f, 1.0, 4.0).unwrap();

    assert_eq!(report.evaluations, calls.load(Ordering::Relaxed));
    assert_close(report.value, 14.0 / 3.0, 1e-3);
}

#[test]
fn test_oversubscribed_pool_terminates() {
    let threads = num_cpus::get() * 4 + 3;
    let value = integrator_with(threads)
        .integrate(|x: f64| x.cos(), 0.0, 1.0)
        .unwrap();
    assert_close(value, 1.0_f64.sin(), 1e-3);
}

#[test]
fn test_thousands_of_workers_accepted() {
    let config = Config::builder()
        .num_threads(2000)
        .stack_size(64 * 1024)
        .build()
        .unwrap();

    let report = Integrator::new(config)
        .unwrap()
        .integrate_with_report(|x: f64| x * x, 0.0, 1.0)
        .unwrap();

    assert_close(report.value, 1.0 / 3.0, 1e-3);
    assert_eq!(report.workers.len(), 2000);
}

#[test]
fn test_more_workers_than_intervals() {
    // converges on the first refinement, most workers never get an interval
    let report = integrator_with(8)
        .integrate_with_report(|x: f64| 2.0 * x, 0.0, 1.0)
        .unwrap();

    assert_eq!(report.value, 1.0);
    assert_eq!(report.global_takes, 1);
    assert_eq!(report.workers.len(), 8);
}

#[test]
fn test_degenerate_interval() {
    let calls = AtomicU64::new(0);
    let f = |x: f64| {
        calls.fetch_add(1, Ordering::Relaxed);
        x
    };

    assert_eq!(integrator_with(4).integrate(f, 3.0, 3.0).unwrap(), 0.0);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_tie_at_tolerance_refines_once_more() {
    // f(0) = 1, f(0.5) = 3, f(1) = 1: coarse = 1, refined = 2, |diff| = 0.5 * |refined|
    let tent = |x: f64| if x <= 0.5 { 1.0 + 4.0 * x } else { 1.0 + 4.0 * (1.0 - x) };
    let config = Config::builder().num_threads(1).tolerance(0.5).build().unwrap();

    let report = Integrator::new(config)
        .unwrap()
        .integrate_with_report(tent, 0.0, 1.0)
        .unwrap();

    assert_eq!(report.value, 2.0);
    // endpoints + top midpoint + one midpoint per linear half
    assert_eq!(report.evaluations, 5);
    assert_eq!(report.refinements, 3);
    assert_eq!(report.leaves, 2);
}

#[test]
fn test_zero_migration_threshold_attempts_every_push() {
    let config = Config::builder()
        .num_threads(4)
        .migration_threshold(0)
        .build()
        .unwrap();

    let report = Integrator::new(config)
        .unwrap()
        .integrate_with_report(|x: f64| (1.0 / x).sin(), 0.1, 2.0)
        .unwrap();

    assert!(report.local_pushes > 0);
    assert_eq!(report.migration_attempts, report.local_pushes);
    assert!(report.migrations > 0);
    assert_eq!(report.global_takes, 1 + report.migrated_entries);
}

#[test]
fn test_min_width_caps_refinement() {
    let wiggle = |x: f64| (1.0 / x).sin();
    let fine = integrator_with(2).integrate_with_report(wiggle, 0.01, 1.0).unwrap();

    let config = Config::builder().num_threads(2).min_width(0.05).build().unwrap();
    let coarse = Integrator::new(config)
        .unwrap()
        .integrate_with_report(wiggle, 0.01, 1.0)
        .unwrap();

    assert!(coarse.evaluations < fine.evaluations);
}

#[test]
fn test_integrate_is_reusable() {
    let integrator = integrator_with(3);
    for hi in [1.0, 2.0, 3.0] {
        let value = integrator.integrate(|x: f64| x * x, 0.0, hi).unwrap();
        assert_close(value, hi * hi * hi / 3.0, 1e-3);
    }
}

#[test]
fn test_invalid_bounds() {
    let err = gstack_rs::integrate(|x: f64| x, 2.0, 1.0, Some(2)).unwrap_err();
    assert_eq!(err, Error::InvalidBounds { lo: 2.0, hi: 1.0 });
}

#[test]
fn test_panicking_integrand_aborts_run() {
    // the endpoints and the first midpoint are fine, 0.75 is not
    let f = |x: f64| {
        if x > 0.7 && x < 0.9 {
            panic!("integrand blew up");
        }
        x * x
    };

    for threads in [1, 4] {
        match integrator_with(threads).integrate(f, 0.0, 1.0) {
            Err(Error::EvaluationFailed { message, .. }) => {
                assert!(message.contains("integrand blew up"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

#[test]
fn test_fallible_integrand_error() {
    let f = Fallible(|x: f64| {
        if x < 0.25 {
            Ok(x)
        } else {
            Err(format!("domain error at {}", x))
        }
    });

    let value = integrator_with(2).integrate(f, 0.0, 0.2).unwrap();
    assert_close(value, 0.02, 1e-3);

    match integrator_with(2).integrate(f, 0.0, 1.0) {
        Err(Error::EvaluationFailed { x, message }) => {
            assert_eq!(message, format!("domain error at {}", x));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_non_finite_inside_interval() {
    // singular at 0.5, which is the first midpoint
    let f = |x: f64| 1.0 / (x - 0.5);
    for threads in [1, 3] {
        assert!(matches!(
            integrator_with(threads).integrate(f, 0.0, 1.0),
            Err(Error::NonFiniteResult { x, .. }) if x == 0.5
        ));
    }
}

#[test]
fn test_values_near_f64_max() {
    let config = Config::builder()
        .num_threads(2)
        .max_intervals(200_000)
        .build()
        .unwrap();

    let value = Integrator::new(config)
        .unwrap()
        .integrate(|_: f64| 1e308, 0.0, 1.0)
        .unwrap();
    assert_eq!(value, 1e308);
}

#[test]
fn test_overflowing_estimate_is_an_error() {
    // 1e307 * 100 is past f64::MAX
    for threads in [1, 4] {
        assert!(matches!(
            integrator_with(threads).integrate(|_: f64| 1e307, 0.0, 1e2),
            Err(Error::NonFiniteResult { .. })
        ));
    }
}

#[test]
fn test_overflowing_sum_is_an_error() {
    // two peaks of height 1.5e308; every interval estimate stays finite,
    // only the total does not
    const PEAK: f64 = 1.5e308;
    let peaks = |x: f64| {
        if x <= 1.0 {
            PEAK * x
        } else if x <= 2.0 {
            PEAK * (2.0 - x) + (x - 1.0)
        } else if x <= 3.0 {
            (3.0 - x) + PEAK * (x - 2.0)
        } else {
            PEAK * (4.0 - x)
        }
    };

    for threads in [1, 4] {
        assert!(matches!(
            integrator_with(threads).integrate(peaks, 0.0, 4.0),
            Err(Error::NonFiniteSum(_))
        ));
    }
}

#[test]
fn test_interval_budget_exhaustion() {
    let config = Config::builder()
        .num_threads(4)
        .max_intervals(50)
        .build()
        .unwrap();

    let result = Integrator::new(config)
        .unwrap()
        .integrate(|x: f64| (1.0 / x).sin(), 0.001, 1.0);

    assert!(matches!(result, Err(Error::ResourceExhausted(_))));
}

#[test]
fn test_cancel_mid_run() {
    let token = CancelToken::new();
    let calls = AtomicU64::new(0);
    let f = |x: f64| {
        if calls.fetch_add(1, Ordering::Relaxed) == 100 {
            token.cancel();
        }
        (1.0 / x).sin()
    };

    let config = Config::builder().num_threads(4).tolerance(1e-9).build().unwrap();
    let integrator = Integrator::new(config).unwrap().with_cancel_token(token.clone());

    assert_eq!(integrator.integrate(f, 1e-4, 1.0).unwrap_err(), Error::Cancelled);
}
