//! Sampling behavior of the registered distributions.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::datum::Datum;
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs};
use crate::registry::GeneratorRegistry;
use crate::ModelError;

use super::distributions::{
    CATEGORICAL_COUNT, DIRICHLET, EXP, GAMMA, NORMAL, POISSON, UNIFORM,
};

fn args<'a>(name: &'static str, bound: &'a [(&'a str, Option<&'a Datum>)]) -> ParamArgs<'a> {
    ParamArgs::new(name, bound.iter().copied())
}

#[test]
fn standard_registry_separates_kinds() {
    let registry = GeneratorRegistry::standard();
    assert!(registry.contains(GeneratorKind::Distribution, "Normal"));
    assert!(!registry.contains(GeneratorKind::Function, "Normal"));
    assert!(registry.contains(GeneratorKind::Function, "exp"));
    assert!(!registry.contains(GeneratorKind::Distribution, "exp"));
    assert_eq!(
        registry.candidates(GeneratorKind::Distribution, "Categorical").len(),
        2
    );
}

#[test]
fn exp_draws_are_positive_with_density() {
    let rate = Datum::Float(2.0);
    let bound = [("rate", Some(&rate))];
    let a = args("Exp", &bound);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..100 {
        let x = EXP.generate(&a, &mut rng).unwrap();
        assert!(x.as_f64().unwrap() > 0.0);
    }
    let density = EXP.log_density(&a, &Datum::Float(0.0)).unwrap().unwrap();
    assert!((density - 2.0_f64.ln()).abs() < 1e-12);
}

#[test]
fn same_seed_same_draw() {
    let mean = Datum::Float(0.0);
    let sd = Datum::Float(1.0);
    let bound = [("mean", Some(&mean)), ("sd", Some(&sd))];
    let a = args("Normal", &bound);
    let x = NORMAL.generate(&a, &mut StdRng::seed_from_u64(9)).unwrap();
    let y = NORMAL.generate(&a, &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(x, y);
}

#[test]
fn invalid_parameters_fail_sampling() {
    let lower = Datum::Float(1.0);
    let upper = Datum::Float(0.0);
    let bound = [("lower", Some(&lower)), ("upper", Some(&upper))];
    let err = UNIFORM
        .generate(&args("Uniform", &bound), &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, ModelError::SamplingFailed { ref name, .. } if name == "Uniform"));
}

#[test]
fn gamma_uses_scale() {
    let shape = Datum::Float(2.0);
    let scale = Datum::Float(3.0);
    let bound = [("shape", Some(&shape)), ("scale", Some(&scale))];
    let a = args("Gamma", &bound);
    let mut rng = StdRng::seed_from_u64(3);
    let n = 4000;
    let mean = (0..n)
        .map(|_| GAMMA.generate(&a, &mut rng).unwrap().as_f64().unwrap())
        .sum::<f64>()
        / f64::from(n);
    assert!((mean - 6.0).abs() < 0.5, "mean {mean}");
}

#[test]
fn poisson_respects_offset_and_bounds() {
    let lambda = Datum::Float(3.0);
    let offset = Datum::Int(10);
    let min = Datum::Int(12);
    let max = Datum::Int(14);
    let bound = [
        ("lambda", Some(&lambda)),
        ("offset", Some(&offset)),
        ("min", Some(&min)),
        ("max", Some(&max)),
    ];
    let a = args("Poisson", &bound);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let k = POISSON.generate(&a, &mut rng).unwrap().as_i64().unwrap();
        assert!((12..=14).contains(&k), "draw {k}");
    }
    let outside = POISSON.log_density(&a, &Datum::Int(11)).unwrap().unwrap();
    assert_eq!(outside, f64::NEG_INFINITY);
}

#[test]
fn poisson_without_optionals() {
    let lambda = Datum::Float(1.0);
    let bound = [
        ("lambda", Some(&lambda)),
        ("offset", None),
        ("min", None),
        ("max", None),
    ];
    let draw = POISSON
        .generate(&args("Poisson", &bound), &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert!(draw.as_i64().unwrap() >= 0);
}

#[test]
fn poisson_negative_offset_stays_non_negative() {
    let lambda = Datum::Float(0.5);
    let offset = Datum::Int(-3);
    let bound = [("lambda", Some(&lambda)), ("offset", Some(&offset))];
    let a = args("Poisson", &bound);
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let k = POISSON.generate(&a, &mut rng).unwrap().as_i64().unwrap();
        assert!(k >= 0, "draw {k}");
    }
    let below = POISSON.log_density(&a, &Datum::Int(-1)).unwrap().unwrap();
    assert_eq!(below, f64::NEG_INFINITY);
    let zero = POISSON.log_density(&a, &Datum::Int(0)).unwrap().unwrap();
    assert!(zero.is_finite());
}

#[test]
fn poisson_gives_up_on_impossible_bounds() {
    let lambda = Datum::Float(1.0);
    let min = Datum::Int(5);
    let max = Datum::Int(4);
    let bound = [("lambda", Some(&lambda)), ("min", Some(&min)), ("max", Some(&max))];
    let err = POISSON
        .generate(&args("Poisson", &bound), &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, ModelError::SamplingFailed { .. }));
}

#[test]
fn dirichlet_draws_lie_on_the_simplex() {
    let conc = Datum::float_array([1.0, 2.0, 3.0]);
    let bound = [("conc", Some(&conc))];
    let a = args("Dirichlet", &bound);
    let x = DIRICHLET.generate(&a, &mut StdRng::seed_from_u64(2)).unwrap();
    let parts = x.to_f64_vec().unwrap();
    assert_eq!(parts.len(), 3);
    assert!((parts.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(DIRICHLET.log_density(&a, &x).unwrap().unwrap().is_finite());
}

#[test]
fn categorical_count_is_uniform_support() {
    let n = Datum::Int(4);
    let bound = [("n", Some(&n))];
    let a = args("Categorical", &bound);
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..50 {
        let k = CATEGORICAL_COUNT.generate(&a, &mut rng).unwrap().as_i64().unwrap();
        assert!((0..4).contains(&k));
    }
    let density = CATEGORICAL_COUNT.log_density(&a, &Datum::Int(2)).unwrap().unwrap();
    assert!((density + 4.0_f64.ln()).abs() < 1e-12);
}
