//! Checks that the pure-Rust fallback solver agrees with HiGHS.
#![cfg(feature = "microlp")]
use float_cmp::assert_approx_eq;
use h2dispatch::model::Model;
use h2dispatch::solver::{SolverChain, SolverKind, SolverOptions};
use h2dispatch::window::WindowModel;
use std::path::PathBuf;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

#[test]
fn test_microlp_matches_highs() {
    let model = Model::from_path(get_model_dir()).unwrap();

    // Evening hours, which need diesel or the fuel cell
    let window = model.forecast.window(16, 4).unwrap();
    let window_model = WindowModel::build(
        &model.system,
        window,
        model.parameters.initial_storage,
        model.parameters.grid_exchange,
    )
    .unwrap();

    let solve = |kind| {
        let chain = SolverChain::from_kinds(&[kind], &SolverOptions::default());
        window_model.solve(&chain).unwrap()
    };
    let highs = solve(SolverKind::Highs);
    let microlp = solve(SolverKind::Microlp);
    assert_approx_eq!(
        f64,
        highs.objective.value(),
        microlp.objective.value(),
        epsilon = 0.05
    );
}
