//! Expression evaluation over an index vector
//!
//! Evaluation is vectorized numpy-style: scalars broadcast against the
//! index vector, and every builtin maps elementwise. The only stateful
//! piece is the noise source, which draws from a caller-controlled RNG so
//! seeded runs are bit-reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::expr::{self, BinaryOp, Builtin, Expr, ExpressionError};
use super::generators;

/// Intermediate evaluation result: a scalar or a per-index vector
#[derive(Debug, Clone)]
enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Value {
    fn into_vector(self, len: usize) -> Vec<f64> {
        match self {
            Value::Scalar(s) => vec![s; len],
            Value::Vector(v) => v,
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(s) => Value::Scalar(f(s)),
            Value::Vector(v) => Value::Vector(v.into_iter().map(f).collect()),
        }
    }

    fn scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Vector(_) => None,
        }
    }
}

/// Combine two values under a binary operation, broadcasting scalars
fn zip_with(
    lhs: Value,
    rhs: Value,
    f: impl Fn(f64, f64) -> f64,
) -> Value {
    match (lhs, rhs) {
        (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(f(x, y)),
        (Value::Scalar(x), Value::Vector(ys)) => {
            Value::Vector(ys.into_iter().map(|y| f(x, y)).collect())
        }
        (Value::Vector(xs), Value::Scalar(y)) => {
            Value::Vector(xs.into_iter().map(|x| f(x, y)).collect())
        }
        (Value::Vector(xs), Value::Vector(ys)) => {
            Value::Vector(xs.into_iter().zip(ys).map(|(x, y)| f(x, y)).collect())
        }
    }
}

fn contains_zero(value: &Value) -> bool {
    match value {
        Value::Scalar(s) => *s == 0.0,
        Value::Vector(v) => v.iter().any(|&x| x == 0.0),
    }
}

struct EvalContext<'a> {
    n: &'a [f64],
    rng: StdRng,
}

fn eval(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),
        Expr::Index => Ok(Value::Vector(ctx.n.to_vec())),
        Expr::Negate(inner) => Ok(eval(inner, ctx)?.map(|x| -x)),
        Expr::Binary { op, lhs, rhs } => {
            let left = eval(lhs, ctx)?;
            let right = eval(rhs, ctx)?;
            match op {
                BinaryOp::Add => Ok(zip_with(left, right, |x, y| x + y)),
                BinaryOp::Sub => Ok(zip_with(left, right, |x, y| x - y)),
                BinaryOp::Mul => Ok(zip_with(left, right, |x, y| x * y)),
                BinaryOp::Div => {
                    if contains_zero(&right) {
                        return Err(ExpressionError::Eval("division by zero".into()));
                    }
                    Ok(zip_with(left, right, |x, y| x / y))
                }
                BinaryOp::Pow => Ok(zip_with(left, right, f64::powf)),
            }
        }
        Expr::Call { function, args } => eval_call(*function, args, ctx),
    }
}

fn eval_call(
    function: Builtin,
    args: &[Expr],
    ctx: &mut EvalContext<'_>,
) -> Result<Value, ExpressionError> {
    // Elementwise single-argument functions
    let unary = |f: fn(f64) -> f64, ctx: &mut EvalContext<'_>, args: &[Expr]| {
        Ok(eval(&args[0], ctx)?.map(f))
    };

    match function {
        Builtin::Impulse => unary(generators::impulse, ctx, args),
        Builtin::Step => unary(generators::unit_step, ctx, args),
        Builtin::Ramp => unary(generators::ramp, ctx, args),
        Builtin::Sin => unary(f64::sin, ctx, args),
        Builtin::Cos => unary(f64::cos, ctx, args),
        Builtin::Tan => unary(f64::tan, ctx, args),
        Builtin::Exp => unary(f64::exp, ctx, args),
        Builtin::Sqrt => unary(f64::sqrt, ctx, args),
        Builtin::Abs => unary(f64::abs, ctx, args),
        Builtin::Log10 => unary(f64::log10, ctx, args),
        Builtin::Ln => unary(f64::ln, ctx, args),
        Builtin::Sinc => unary(generators::sinc, ctx, args),
        Builtin::Sign => unary(
            |t| {
                if t > 0.0 {
                    1.0
                } else if t < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            },
            ctx,
            args,
        ),
        Builtin::Rect => {
            let t = eval(&args[0], ctx)?;
            let width = require_scalar(eval(&args[1], ctx)?, "rect width")?;
            Ok(t.map(|x| generators::rect(x, width)))
        }
        Builtin::PulseTrain => {
            let start = require_scalar(eval(&args[0], ctx)?, "pt start")?;
            let spacing = require_scalar(eval(&args[1], ctx)?, "pt spacing")?;
            let count = require_scalar(eval(&args[2], ctx)?, "pt count")?;
            if count < 0.0 || count.fract() != 0.0 {
                return Err(ExpressionError::Eval(format!(
                    "pt count must be a non-negative integer, got {count}"
                )));
            }
            let count = count as usize;
            Ok(Value::Vector(
                ctx.n
                    .iter()
                    .map(|&t| generators::pulse_train(t, start, spacing, count))
                    .collect(),
            ))
        }
        Builtin::Noise => {
            let samples = (0..ctx.n.len())
                .map(|_| ctx.rng.sample(StandardNormal))
                .collect();
            Ok(Value::Vector(samples))
        }
    }
}

fn require_scalar(value: Value, what: &str) -> Result<f64, ExpressionError> {
    value
        .scalar()
        .ok_or_else(|| ExpressionError::Eval(format!("{what} must be a scalar")))
}

/// A parsed, re-evaluable signal expression
///
/// Parsing never touches shared state, and evaluation is purely functional
/// over the index vector except for the explicit noise source.
#[derive(Debug, Clone)]
pub struct SignalExpression {
    root: Expr,
    source: String,
}

impl SignalExpression {
    /// Parse an expression; errors carry the byte offset of the problem
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            root: expr::parse(source)?,
            source: source.to_string(),
        })
    }

    /// The original source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate over the given index vector with entropy-seeded noise
    pub fn evaluate(&self, n: &[f64]) -> Result<Vec<f64>, ExpressionError> {
        self.evaluate_with_rng(n, StdRng::from_entropy())
    }

    /// Evaluate with a fixed noise seed (bit-reproducible)
    pub fn evaluate_seeded(&self, n: &[f64], seed: u64) -> Result<Vec<f64>, ExpressionError> {
        self.evaluate_with_rng(n, StdRng::seed_from_u64(seed))
    }

    fn evaluate_with_rng(&self, n: &[f64], rng: StdRng) -> Result<Vec<f64>, ExpressionError> {
        let mut ctx = EvalContext { n, rng };
        let value = eval(&self.root, &mut ctx)?;
        Ok(value.into_vector(n.len()))
    }
}

/// Convenience index vector `start..start+len` as floats
pub fn index_vector(start: i64, len: usize) -> Vec<f64> {
    (0..len).map(|k| (start + k as i64) as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n_range(len: usize) -> Vec<f64> {
        index_vector(0, len)
    }

    #[test]
    fn test_step_difference_window() {
        // u(n) - u(n - 10) over n = 0..19: 1 for n < 10, 0 after
        let expr = SignalExpression::parse("u(n) - u(n - 10)").unwrap();
        let result = expr.evaluate(&n_range(20)).unwrap();

        for (n, &value) in result.iter().enumerate() {
            let expected = if n < 10 { 1.0 } else { 0.0 };
            assert_eq!(value, expected, "at n = {n}");
        }
    }

    #[test]
    fn test_pulse_train_scenario() {
        // pt(0, 10, 3) over n = 0..29: impulses at 0, 10, 20 only
        let expr = SignalExpression::parse("pt(0, 10, 3)").unwrap();
        let result = expr.evaluate(&n_range(30)).unwrap();

        for (n, &value) in result.iter().enumerate() {
            let expected = if n % 10 == 0 { 1.0 } else { 0.0 };
            assert_eq!(value, expected, "at n = {n}");
        }
    }

    #[test]
    fn test_scalar_broadcasts_to_full_length() {
        let expr = SignalExpression::parse("3").unwrap();
        assert_eq!(expr.evaluate(&n_range(5)).unwrap(), vec![3.0; 5]);
    }

    #[test]
    fn test_deterministic_without_noise() {
        let expr = SignalExpression::parse("sin(0.1 * n) * exp(-0.05 * n) + r(n - 3)").unwrap();
        let n = n_range(64);
        assert_eq!(expr.evaluate(&n).unwrap(), expr.evaluate(&n).unwrap());
    }

    #[test]
    fn test_seeded_noise_reproducible() {
        let expr = SignalExpression::parse("noise()").unwrap();
        let n = n_range(32);

        let first = expr.evaluate_seeded(&n, 42).unwrap();
        let second = expr.evaluate_seeded(&n, 42).unwrap();
        assert_eq!(first, second);

        // A different seed draws a different sequence
        let third = expr.evaluate_seeded(&n, 43).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_division_by_zero_is_eval_error() {
        let expr = SignalExpression::parse("1 / (n - 5)").unwrap();
        let err = expr.evaluate(&n_range(10)).unwrap_err();
        assert_eq!(err, ExpressionError::Eval("division by zero".into()));

        // A range that avoids the singularity evaluates fine
        assert!(expr.evaluate(&index_vector(6, 4)).is_ok());
    }

    #[test]
    fn test_vector_width_rejected() {
        let expr = SignalExpression::parse("rect(n, n)").unwrap();
        assert!(matches!(
            expr.evaluate(&n_range(4)).unwrap_err(),
            ExpressionError::Eval(_)
        ));
    }

    #[test]
    fn test_power_and_negate() {
        let expr = SignalExpression::parse("(-0.5) ** n").unwrap();
        let result = expr.evaluate(&n_range(4)).unwrap();
        assert_eq!(result[0], 1.0);
        assert_eq!(result[1], -0.5);
        assert_eq!(result[2], 0.25);
    }

    #[test]
    fn test_delayed_impulse() {
        let expr = SignalExpression::parse("d(n - 3) + 2 * d(n - 7)").unwrap();
        let result = expr.evaluate(&n_range(10)).unwrap();

        let mut expected = vec![0.0; 10];
        expected[3] = 1.0;
        expected[7] = 2.0;
        assert_eq!(result, expected);
    }

    #[test]
    fn test_rect_window() {
        let expr = SignalExpression::parse("rect(n - 2, 3)").unwrap();
        let result = expr.evaluate(&n_range(8)).unwrap();
        assert_eq!(result, vec![0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_negative_index_range() {
        let expr = SignalExpression::parse("u(n)").unwrap();
        let result = expr.evaluate(&index_vector(-3, 6)).unwrap();
        assert_eq!(result, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }
}
