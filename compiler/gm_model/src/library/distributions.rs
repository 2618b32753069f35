//! Built-in generative distributions.
//!
//! The continuous families share one definition type dispatching to the
//! matching `statrs` distribution; the discrete ones each carry their own
//! support handling.

use rand::distributions::Distribution;
use rand::{Rng, RngCore};
use statrs::distribution::{
    Bernoulli, Beta, Categorical, Continuous, Discrete, Exp, Gamma, Geometric, LogNormal, Normal,
    Poisson, Uniform,
};
use statrs::function::gamma::ln_gamma;
use statrs::StatsError;

use crate::datum::{Datum, DatumType};
use crate::errors::{sampling_failed, shape_mismatch, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs, ParamSpec, Signature};
use crate::shape::Shape;

/// Rejection attempts before a conditioned Poisson draw gives up.
pub const MAX_TRIES: usize = 10_000;

/// A constructed univariate continuous distribution.
enum Univariate {
    Normal(Normal),
    LogNormal(LogNormal),
    Exp(Exp),
    Gamma(Gamma),
    Beta(Beta),
    Uniform(Uniform),
}

impl Univariate {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        match self {
            Univariate::Normal(d) => d.sample(rng),
            Univariate::LogNormal(d) => d.sample(rng),
            Univariate::Exp(d) => d.sample(rng),
            Univariate::Gamma(d) => d.sample(rng),
            Univariate::Beta(d) => d.sample(rng),
            Univariate::Uniform(d) => d.sample(rng),
        }
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        match self {
            Univariate::Normal(d) => d.ln_pdf(x),
            Univariate::LogNormal(d) => d.ln_pdf(x),
            Univariate::Exp(d) => d.ln_pdf(x),
            Univariate::Gamma(d) => d.ln_pdf(x),
            Univariate::Beta(d) => d.ln_pdf(x),
            Univariate::Uniform(d) => d.ln_pdf(x),
        }
    }
}

type Build = fn(&ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>>;

/// A continuous distribution producing a `Float`.
pub struct ContinuousDist {
    name: &'static str,
    description: &'static str,
    signatures: &'static [Signature],
    build: Build,
}

impl ContinuousDist {
    fn construct(&self, args: &ParamArgs<'_>) -> ModelResult<Univariate> {
        (self.build)(args)?.map_err(|e| sampling_failed(self.name, e))
    }
}

impl GeneratorDef for ContinuousDist {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        self.signatures
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        Ok(Datum::Float(self.construct(args)?.sample(rng)))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let x = value
            .as_f64()
            .ok_or_else(|| shape_mismatch(self.name, DatumType::Float, value.datum_type()))?;
        Ok(Some(self.construct(args)?.ln_pdf(x)))
    }
}

pub static NORMAL: ContinuousDist = ContinuousDist {
    name: "Normal",
    description: "The normal probability distribution with mean and standard deviation.",
    signatures: &[Signature { params: &[
        ParamSpec::required("mean", Shape::Number, "the mean of the distribution"),
        ParamSpec::required("sd", Shape::Number, "the standard deviation"),
    ] }],
    build: build_normal,
};

pub static LOG_NORMAL: ContinuousDist = ContinuousDist {
    name: "LogNormal",
    description: "The log-normal probability distribution.",
    signatures: &[Signature { params: &[
        ParamSpec::required("meanlog", Shape::Number, "mean of the logarithm"),
        ParamSpec::required("sdlog", Shape::Number, "standard deviation of the logarithm"),
    ] }],
    build: build_log_normal,
};

pub static EXP: ContinuousDist = ContinuousDist {
    name: "Exp",
    description: "The exponential probability distribution.",
    signatures: &[Signature { params: &[ParamSpec::required(
        "rate",
        Shape::Number,
        "the rate of the exponential",
    )] }],
    build: build_exp,
};

pub static GAMMA: ContinuousDist = ContinuousDist {
    name: "Gamma",
    description: "The gamma probability distribution, parameterized by shape and scale.",
    signatures: &[Signature { params: &[
        ParamSpec::required("shape", Shape::Number, "the shape parameter"),
        ParamSpec::required("scale", Shape::Number, "the scale parameter"),
    ] }],
    build: build_gamma,
};

pub static BETA: ContinuousDist = ContinuousDist {
    name: "Beta",
    description: "The beta probability distribution.",
    signatures: &[Signature { params: &[
        ParamSpec::required("alpha", Shape::Number, "the first shape parameter"),
        ParamSpec::required("beta", Shape::Number, "the second shape parameter"),
    ] }],
    build: build_beta,
};

pub static UNIFORM: ContinuousDist = ContinuousDist {
    name: "Uniform",
    description: "The uniform probability distribution on [lower, upper).",
    signatures: &[Signature { params: &[
        ParamSpec::required("lower", Shape::Number, "the lower bound"),
        ParamSpec::required("upper", Shape::Number, "the upper bound"),
    ] }],
    build: build_uniform,
};

fn build_normal(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    Ok(Normal::new(args.f64("mean")?, args.f64("sd")?).map(Univariate::Normal))
}

fn build_log_normal(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    Ok(LogNormal::new(args.f64("meanlog")?, args.f64("sdlog")?).map(Univariate::LogNormal))
}

fn build_exp(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    Ok(Exp::new(args.f64("rate")?).map(Univariate::Exp))
}

/// `statrs` takes a rate; the language exposes a scale.
fn build_gamma(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    let shape = args.f64("shape")?;
    let scale = args.f64("scale")?;
    Ok(Gamma::new(shape, 1.0 / scale).map(Univariate::Gamma))
}

fn build_beta(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    Ok(Beta::new(args.f64("alpha")?, args.f64("beta")?).map(Univariate::Beta))
}

fn build_uniform(args: &ParamArgs<'_>) -> ModelResult<Result<Univariate, StatsError>> {
    Ok(Uniform::new(args.f64("lower")?, args.f64("upper")?).map(Univariate::Uniform))
}

fn int_value(name: &str, value: &Datum) -> ModelResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| shape_mismatch(name, DatumType::Int, value.datum_type()))
}

/// Poisson, optionally shifted by `offset` and conditioned on `[min, max]`.
/// `min` defaults to zero, so a negative offset never yields a negative count.
pub struct PoissonDist;

static POISSON_SIGS: [Signature; 1] = [Signature { params: &[
    ParamSpec::required("lambda", Shape::Number, "the expected number of events"),
    ParamSpec::optional("offset", Shape::Int, "added to every draw"),
    ParamSpec::optional("min", Shape::Int, "smallest value accepted"),
    ParamSpec::optional("max", Shape::Int, "largest value accepted"),
] }];

impl PoissonDist {
    fn parts(args: &ParamArgs<'_>) -> ModelResult<(Poisson, i64, i64, i64)> {
        let poisson = Poisson::new(args.f64("lambda")?).map_err(|e| sampling_failed("Poisson", e))?;
        let offset = args.opt_i64("offset")?.unwrap_or(0);
        let min = args.opt_i64("min")?.unwrap_or(0);
        let max = args.opt_i64("max")?.unwrap_or(i64::MAX);
        Ok((poisson, offset, min, max))
    }
}

impl GeneratorDef for PoissonDist {
    fn name(&self) -> &'static str {
        "Poisson"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &POISSON_SIGS
    }

    fn description(&self) -> &'static str {
        "The probability distribution of the number of events in a fixed interval."
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        let (poisson, offset, min, max) = Self::parts(args)?;
        for _ in 0..MAX_TRIES {
            let k = poisson.sample(rng) as i64 + offset;
            if (min..=max).contains(&k) {
                return Ok(Datum::Int(k));
            }
        }
        Err(sampling_failed(
            "Poisson",
            format!("no draw within [{min}, {max}] after {MAX_TRIES} tries"),
        ))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let (poisson, offset, min, max) = Self::parts(args)?;
        let k = int_value("Poisson", value)?;
        if !(min..=max).contains(&k) || k < offset {
            return Ok(Some(f64::NEG_INFINITY));
        }
        Ok(Some(poisson.ln_pmf((k - offset) as u64)))
    }
}

pub struct BernoulliDist;

static BERNOULLI_SIGS: [Signature; 1] = [Signature { params: &[ParamSpec::required(
    "p",
    Shape::Number,
    "probability of true",
)] }];

impl BernoulliDist {
    fn build(args: &ParamArgs<'_>) -> ModelResult<Bernoulli> {
        Bernoulli::new(args.f64("p")?).map_err(|e| sampling_failed("Bernoulli", e))
    }
}

impl GeneratorDef for BernoulliDist {
    fn name(&self) -> &'static str {
        "Bernoulli"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &BERNOULLI_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        Ok(Datum::Bool(Self::build(args)?.sample(rng) > 0.5))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let b = value
            .as_bool()
            .ok_or_else(|| shape_mismatch("Bernoulli", DatumType::Bool, value.datum_type()))?;
        Ok(Some(Self::build(args)?.ln_pmf(u64::from(b))))
    }
}

/// Number of trials up to and including the first success.
pub struct GeometricDist;

static GEOMETRIC_SIGS: [Signature; 1] = [Signature { params: &[ParamSpec::required(
    "p",
    Shape::Number,
    "probability of success",
)] }];

impl GeometricDist {
    fn build(args: &ParamArgs<'_>) -> ModelResult<Geometric> {
        Geometric::new(args.f64("p")?).map_err(|e| sampling_failed("Geometric", e))
    }
}

impl GeneratorDef for GeometricDist {
    fn name(&self) -> &'static str {
        "Geometric"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &GEOMETRIC_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        Ok(Datum::Int(Self::build(args)?.sample(rng) as i64))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let k = int_value("Geometric", value)?;
        if k < 1 {
            return Ok(Some(f64::NEG_INFINITY));
        }
        Ok(Some(Self::build(args)?.ln_pmf(k as u64)))
    }
}

/// Categorical over explicit (unnormalized) probabilities.
pub struct CategoricalProbs;

static CATEGORICAL_PROBS_SIGS: [Signature; 1] = [Signature { params: &[ParamSpec::required(
    "probs",
    Shape::Array(&Shape::Number),
    "category weights",
)] }];

impl CategoricalProbs {
    fn build(args: &ParamArgs<'_>) -> ModelResult<Categorical> {
        Categorical::new(&args.f64_array("probs")?).map_err(|e| sampling_failed("Categorical", e))
    }
}

impl GeneratorDef for CategoricalProbs {
    fn name(&self) -> &'static str {
        "Categorical"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &CATEGORICAL_PROBS_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        Ok(Datum::Int(Self::build(args)?.sample(rng) as i64))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let k = int_value("Categorical", value)?;
        if k < 0 {
            return Ok(Some(f64::NEG_INFINITY));
        }
        Ok(Some(Self::build(args)?.ln_pmf(k as u64)))
    }
}

/// Categorical with `n` equally likely categories.
pub struct CategoricalCount;

static CATEGORICAL_COUNT_SIGS: [Signature; 1] = [Signature { params: &[ParamSpec::required(
    "n",
    Shape::Int,
    "number of categories",
)] }];

impl CategoricalCount {
    fn count(args: &ParamArgs<'_>) -> ModelResult<i64> {
        let n = args.i64("n")?;
        if n < 1 {
            return Err(sampling_failed("Categorical", format!("n must be positive, got {n}")));
        }
        Ok(n)
    }
}

impl GeneratorDef for CategoricalCount {
    fn name(&self) -> &'static str {
        "Categorical"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &CATEGORICAL_COUNT_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        let n = Self::count(args)?;
        Ok(Datum::Int(rng.gen_range(0..n)))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let n = Self::count(args)?;
        let k = int_value("Categorical", value)?;
        Ok(Some(if (0..n).contains(&k) {
            -(n as f64).ln()
        } else {
            f64::NEG_INFINITY
        }))
    }
}

pub struct DirichletDist;

static DIRICHLET_SIGS: [Signature; 1] = [Signature { params: &[ParamSpec::required(
    "conc",
    Shape::Array(&Shape::Number),
    "concentration parameters",
)] }];

impl DirichletDist {
    fn concentration(args: &ParamArgs<'_>) -> ModelResult<Vec<f64>> {
        let conc = args.f64_array("conc")?;
        if conc.len() < 2 || conc.iter().any(|a| a.is_nan() || *a <= 0.0) {
            return Err(sampling_failed(
                "Dirichlet",
                "needs at least two positive concentration parameters",
            ));
        }
        Ok(conc)
    }
}

impl GeneratorDef for DirichletDist {
    fn name(&self) -> &'static str {
        "Dirichlet"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Distribution
    }

    fn signatures(&self) -> &'static [Signature] {
        &DIRICHLET_SIGS
    }

    fn description(&self) -> &'static str {
        "The dirichlet probability distribution over the simplex."
    }

    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        let conc = Self::concentration(args)?;
        let mut draws = Vec::with_capacity(conc.len());
        for alpha in &conc {
            let gamma = Gamma::new(*alpha, 1.0).map_err(|e| sampling_failed("Dirichlet", e))?;
            draws.push(gamma.sample(rng));
        }
        let total: f64 = draws.iter().sum();
        Ok(Datum::float_array(draws.into_iter().map(|x| x / total)))
    }

    fn log_density(&self, args: &ParamArgs<'_>, value: &Datum) -> ModelResult<Option<f64>> {
        let conc = Self::concentration(args)?;
        let x = value.to_f64_vec().ok_or_else(|| {
            shape_mismatch("Dirichlet", DatumType::array_of(DatumType::Float), value.datum_type())
        })?;
        if x.len() != conc.len() {
            return Err(shape_mismatch(
                "Dirichlet",
                format!("{} components", conc.len()),
                format!("{} components", x.len()),
            ));
        }
        let norm = ln_gamma(conc.iter().sum()) - conc.iter().map(|a| ln_gamma(*a)).sum::<f64>();
        let kernel: f64 = conc.iter().zip(&x).map(|(a, xi)| (a - 1.0) * xi.ln()).sum();
        Ok(Some(norm + kernel))
    }
}

pub static POISSON: PoissonDist = PoissonDist;
pub static BERNOULLI: BernoulliDist = BernoulliDist;
pub static GEOMETRIC: GeometricDist = GeometricDist;
pub static CATEGORICAL_PROBS: CategoricalProbs = CategoricalProbs;
pub static CATEGORICAL_COUNT: CategoricalCount = CategoricalCount;
pub static DIRICHLET: DirichletDist = DirichletDist;
