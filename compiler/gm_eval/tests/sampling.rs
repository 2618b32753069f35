//! Forward sampling over whole statement sequences.

use gm_eval::Interpreter;
use gm_ir::{BinaryOp, ScopeKind, Statement, StatementList};
use gm_model::{Datum, ModelError};
use pretty_assertions::assert_eq;

use ScopeKind::{Data, Model};

fn f64_of(interp: &Interpreter, scope: ScopeKind, name: &str) -> f64 {
    interp.datum(scope, name).and_then(Datum::as_f64).unwrap()
}

/// `n = 5; theta ~ Exp(rate=2.0); y = theta + 1.0;`
fn exp_model() -> StatementList {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let five = a.literal("5");
    let rate = a.literal("2.0");
    let theta = a.ident("theta");
    let one = a.literal("1.0");
    let y = a.binary(BinaryOp::Add, theta, one);
    list.data(Statement::assign("n", five));
    list.model(Statement::draw("theta", "Exp", [("rate", rate)]));
    list.model(Statement::assign("y", y));
    list
}

#[test]
fn resampling_keeps_deterministic_relations() {
    let mut interp = Interpreter::builder().seed(11).build();
    interp.process_all(&exp_model()).unwrap();

    let theta0 = f64_of(&interp, Model, "theta");
    assert!(interp.value(Model, "theta").unwrap().is_random_variable());
    assert_eq!(f64_of(&interp, Model, "y"), theta0 + 1.0);

    interp.sample().unwrap();

    let theta1 = f64_of(&interp, Model, "theta");
    assert_ne!(theta0, theta1);
    assert_eq!(f64_of(&interp, Model, "y"), theta1 + 1.0);
    assert_eq!(interp.datum(Data, "n"), Some(&Datum::Int(5)));
}

#[test]
fn sinks_share_one_draw_per_random_variable() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let rate = a.literal("1.0");
    let (t1, t2) = (a.ident("theta"), a.ident("theta"));
    let (one, two) = (a.literal("1.0"), a.literal("2.0"));
    let plus = a.binary(BinaryOp::Add, t1, one);
    let times = a.binary(BinaryOp::Mul, t2, two);
    list.model(Statement::draw("theta", "Exp", [("rate", rate)]));
    list.model(Statement::assign("a", plus));
    list.model(Statement::assign("b", times));

    let mut interp = Interpreter::builder().seed(5).build();
    interp.process_all(&list).unwrap();
    let sinks = interp.sinks(Model);
    assert_eq!(sinks.len(), 2);

    for _ in 0..10 {
        interp.sample().unwrap();
        let theta = f64_of(&interp, Model, "theta");
        assert_eq!(f64_of(&interp, Model, "a"), theta + 1.0);
        assert_eq!(f64_of(&interp, Model, "b"), theta * 2.0);
    }
}

#[test]
fn observed_data_is_never_redrawn() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let three = a.literal("3.0");
    let obs = a.ident("obs");
    let sd = a.literal("1.0");
    let obs_copy = a.ident("obs");
    list.data(Statement::assign("obs", three));
    list.data(Statement::assign("copy", obs_copy));
    list.model(Statement::draw("mu", "Normal", [("mean", obs), ("sd", sd)]));

    let mut interp = Interpreter::builder().seed(2).build();
    interp.process_all(&list).unwrap();
    let data = interp.snapshot(Data);

    for _ in 0..5 {
        interp.sample().unwrap();
    }
    assert_eq!(interp.snapshot(Data), data);
}

#[test]
fn failed_pass_commits_nothing() {
    // `u`'s bounds are valid only while `lo` stays below 5.
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let (zero, ten, five) = (a.literal("0.0"), a.literal("10.0"), a.literal("5.0"));
    let lo = a.ident("lo");
    list.model(Statement::draw("lo", "Uniform", [("lower", zero), ("upper", ten)]));
    list.model(Statement::draw("u", "Uniform", [("lower", lo), ("upper", five)]));

    let mut interp = (0..64)
        .map(|seed| Interpreter::builder().seed(seed).build())
        .find_map(|mut interp| interp.process_all(&list).is_ok().then_some(interp))
        .unwrap();

    for _ in 0..64 {
        let before = interp.snapshot(Model);
        match interp.sample() {
            Ok(()) => continue,
            Err(err) => {
                assert!(matches!(err, ModelError::SamplingFailed { .. }));
                assert_eq!(interp.snapshot(Model), before);
                return;
            }
        }
    }
    panic!("no sampling pass drew lo above 5 in 64 tries");
}

#[test]
fn sample_from_redraws_only_upstream_of_targets() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let (r1, r2) = (a.literal("1.0"), a.literal("1.0"));
    list.model(Statement::draw("p", "Exp", [("rate", r1)]));
    list.model(Statement::draw("q", "Exp", [("rate", r2)]));

    let mut interp = Interpreter::builder().seed(8).build();
    interp.process_all(&list).unwrap();
    let q = f64_of(&interp, Model, "q");
    let p = f64_of(&interp, Model, "p");

    let target = interp.lookup(Model, "p").unwrap();
    interp.sample_from(&[target]).unwrap();

    assert_ne!(f64_of(&interp, Model, "p"), p);
    assert_eq!(f64_of(&interp, Model, "q"), q);
}

#[test]
fn joint_log_density_sums_random_variables() {
    let mut interp = Interpreter::builder().seed(4).build();
    interp.process_all(&exp_model()).unwrap();

    let theta = f64_of(&interp, Model, "theta");
    let density = interp.log_density().unwrap().unwrap();
    assert!((density - (2.0_f64.ln() - 2.0 * theta)).abs() < 1e-9);
}

#[test]
fn seeded_interpreters_reproduce_draws() {
    let draws = |seed| {
        let mut interp = Interpreter::builder().seed(seed).build();
        interp.process_all(&exp_model()).unwrap();
        interp.sample().unwrap();
        f64_of(&interp, Model, "theta")
    };
    assert_eq!(draws(99), draws(99));
}
