//! Recovers `a·x² + b·x + c` from an expression by sampling, then solves it.

use std::fmt;

use crate::error::{Result, SolveError};
use crate::expr::{fmt_num, Expr};

const NOT_POLYNOMIAL: &str = "only polynomials in x of degree two or less are supported";

/// Points used to confirm the fitted coefficients reproduce the expression.
const CHECK_POINTS: [f64; 4] = [2.0, -3.0, 0.5, 7.0];

/// Relative size below which a fitted coefficient is floating-point noise.
const NOISE: f64 = 1e-12;

/// Largest |a·c| searched for a middle-term split.
const MAX_SPLIT_PRODUCT: u64 = 1_000_000_000_000;

/// Zero `v` when it is noise next to `scale`, the magnitude of the sampled values.
pub(crate) fn snap_noise(v: f64, scale: f64) -> f64 {
    if v.abs() <= NOISE * scale.max(1e-3) {
        0.0
    } else {
        v
    }
}

/// `|actual|` measured against the size of the terms that produced it.
pub(crate) fn relative_residual(actual: f64, scale: f64) -> f64 {
    if scale > 0.0 {
        actual.abs() / scale
    } else {
        actual.abs()
    }
}

/// Signed sum of `coef·power` terms, skipping zeros: `x^2 - 5x + 6`.
pub(crate) fn format_terms(terms: &[(f64, &str)]) -> String {
    let mut out = String::new();
    for &(coef, power) in terms.iter().filter(|(coef, _)| *coef != 0.0) {
        let magnitude = coef.abs();
        match (out.is_empty(), coef < 0.0) {
            (true, true) => out.push('-'),
            (true, false) => {}
            (false, true) => out.push_str(" - "),
            (false, false) => out.push_str(" + "),
        }
        if power.is_empty() || magnitude != 1.0 {
            out.push_str(&fmt_num(magnitude));
        }
        out.push_str(power);
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Roots {
    /// Every real number satisfies `0 = 0`.
    All,
    /// A non-zero constant: no x satisfies it.
    None,
    Real(Vec<f64>),
    Complex { discriminant: f64 },
}

impl Quadratic {
    /// Fit through x = -1, 0, 1 and verify against [`CHECK_POINTS`].
    pub fn fit(expr: &Expr) -> Result<Self> {
        let sample = |x: f64| {
            expr.eval(Some(x))
                .map_err(|_| SolveError::Unsupported(NOT_POLYNOMIAL.to_string()))
        };

        let f_neg = sample(-1.0)?;
        let f_zero = sample(0.0)?;
        let f_pos = sample(1.0)?;

        let scale = f_neg.abs().max(f_zero.abs()).max(f_pos.abs());
        let quad = Quadratic {
            a: snap_noise((f_pos + f_neg) / 2.0 - f_zero, scale),
            b: snap_noise((f_pos - f_neg) / 2.0, scale),
            c: snap_noise(f_zero, scale),
        };

        for x in CHECK_POINTS {
            let actual = sample(x)?;
            let expected = quad.eval(x);
            let tolerance = 1e-7 * (1.0 + actual.abs().max(expected.abs()));
            if (actual - expected).abs() > tolerance {
                return Err(SolveError::Unsupported(NOT_POLYNOMIAL.to_string()));
            }
        }

        Ok(quad)
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }

    pub fn degree(&self) -> usize {
        if self.a != 0.0 {
            2
        } else if self.b != 0.0 {
            1
        } else {
            0
        }
    }

    pub fn discriminant(&self) -> f64 {
        self.b * self.b - 4.0 * self.a * self.c
    }

    /// Size of the individual terms at `x`, the yardstick for residuals.
    pub fn scale_at(&self, x: f64) -> f64 {
        self.a.abs() * x * x + self.b.abs() * x.abs() + self.c.abs()
    }

    pub fn roots(&self) -> Roots {
        match self.degree() {
            0 if self.c == 0.0 => Roots::All,
            0 => Roots::None,
            1 => Roots::Real(vec![-self.c / self.b]),
            _ => {
                let d = self.discriminant();
                let magnitude = (self.b * self.b).max((4.0 * self.a * self.c).abs());
                if d.abs() <= NOISE * magnitude {
                    Roots::Real(vec![-self.b / (2.0 * self.a)])
                } else if d < 0.0 {
                    Roots::Complex { discriminant: d }
                } else {
                    // Avoids cancellation when b² dominates 4ac.
                    let q = -0.5 * (self.b + self.b.signum() * d.sqrt());
                    let mut roots = vec![q / self.a, self.c / q];
                    roots.sort_by(|l, r| l.total_cmp(r));
                    Roots::Real(roots)
                }
            }
        }
    }

    /// Find integers `p + q = b` with `p·q = a·c`, the split used to factor
    /// by grouping. `Ok(None)` when no such pair exists.
    pub fn split_middle(&self) -> Result<Option<MiddleSplit>> {
        let (Some(a), Some(b), Some(c)) = (whole(self.a), whole(self.b), whole(self.c)) else {
            return Err(SolveError::InvalidArguments(
                "split(...) needs whole-number coefficients".to_string(),
            ));
        };
        if a == 0 {
            return Err(SolveError::InvalidArguments(
                "split(...) needs a quadratic ax^2 + bx + c".to_string(),
            ));
        }

        let ac = a
            .checked_mul(c)
            .filter(|ac| ac.unsigned_abs() <= MAX_SPLIT_PRODUCT)
            .ok_or_else(|| {
                SolveError::InvalidArguments("a*c is too large to search for a split".to_string())
            })?;
        if ac == 0 {
            return Ok(Some(MiddleSplit { a, p: b, q: 0, c }));
        }

        let n = ac.unsigned_abs();
        let mut d: u64 = 1;
        while d * d <= n {
            if n % d == 0 {
                let small = d as i64;
                let large = ac / small;
                for (p, q) in [(small, large), (-small, -large)] {
                    if p + q == b {
                        return Ok(Some(MiddleSplit { a, p, q, c }));
                    }
                }
            }
            d += 1;
        }
        Ok(None)
    }
}

fn whole(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && v.abs() < 9e15).then_some(v as i64)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a as i64
}

/// `ax^2 + px + qx + c` with `p·q = a·c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiddleSplit {
    pub a: i64,
    pub p: i64,
    pub q: i64,
    pub c: i64,
}

impl MiddleSplit {
    pub fn product(&self) -> i64 {
        self.a * self.c
    }

    pub fn split_terms(&self) -> String {
        format_terms(&[
            (self.a as f64, "x^2"),
            (self.p as f64, "x"),
            (self.q as f64, "x"),
            (self.c as f64, ""),
        ])
    }

    /// Grouping `(ax^2 + px) + (qx + c)` as `(gx + k)(ux + v)`.
    pub fn factors(&self) -> String {
        let mut g = gcd(self.a, self.p);
        if self.a < 0 {
            g = -g;
        }
        let (u, v) = (self.a / g, self.p / g);
        let k = self.q / u;

        let outer = format_terms(&[(g as f64, "x"), (k as f64, "")]);
        let inner = format_terms(&[(u as f64, "x"), (v as f64, "")]);
        if k == 0 {
            format!("{}({})", outer, inner)
        } else {
            format!("({})({})", outer, inner)
        }
    }
}

impl fmt::Display for Quadratic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_terms(&[(self.a, "x^2"), (self.b, "x"), (self.c, "")]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fit(input: &str) -> Result<Quadratic> {
        Quadratic::fit(&Expr::parse(input).unwrap())
    }

    #[test]
    fn test_fit_quadratic() {
        let q = fit("x^2 - 5x + 6").unwrap();
        assert_eq!(q, Quadratic { a: 1.0, b: -5.0, c: 6.0 });
        assert_eq!(q.roots(), Roots::Real(vec![2.0, 3.0]));
        assert_eq!(q.to_string(), "x^2 - 5x + 6");
    }

    #[test]
    fn test_fit_expanded_forms() {
        let q = fit("(x - 1)(x + 4)").unwrap();
        assert_eq!(q, Quadratic { a: 1.0, b: 3.0, c: -4.0 });
        let lin = fit("2(x + 1)").unwrap();
        assert_eq!(lin.degree(), 1);
        assert_eq!(lin.roots(), Roots::Real(vec![-1.0]));
    }

    #[test]
    fn test_double_root_and_complex() {
        assert_eq!(fit("x^2 - 4x + 4").unwrap().roots(), Roots::Real(vec![2.0]));
        assert!(matches!(fit("x^2 + 1").unwrap().roots(), Roots::Complex { .. }));
    }

    #[test]
    fn test_constant_cases() {
        assert_eq!(fit("x - x").unwrap().roots(), Roots::All);
        assert_eq!(fit("x - x + 3").unwrap().roots(), Roots::None);
    }

    #[test]
    fn test_rejects_higher_degree_and_non_polynomials() {
        assert!(matches!(fit("x^3 - x"), Err(SolveError::Unsupported(_))));
        assert!(matches!(fit("1 / x"), Err(SolveError::Unsupported(_))));
        assert!(matches!(fit("sin(x)"), Err(SolveError::Unsupported(_))));
    }

    #[test]
    fn test_small_coefficients_keep_distinct_roots() {
        let q = fit("0.00001x^2 - 0.000000001").unwrap();
        assert!(q.discriminant() > 0.0);
        let Roots::Real(roots) = q.roots() else {
            panic!("expected real roots, got {:?}", q.roots());
        };
        assert_eq!(roots.len(), 2);
        assert!((roots[0] + 0.01).abs() < 1e-12);
        assert!((roots[1] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_cancelling_terms_are_snapped_to_zero() {
        assert_eq!(fit("0.1x + 0.2x - 0.3x").unwrap().roots(), Roots::All);
        assert!(matches!(fit("(x - 0.1)^2").unwrap().roots(), Roots::Real(r) if r.len() == 1));
    }

    #[test]
    fn test_split_middle_term() {
        let split = fit("x^2 + 5x + 6").unwrap().split_middle().unwrap().unwrap();
        assert_eq!(split, MiddleSplit { a: 1, p: 2, q: 3, c: 6 });
        assert_eq!(split.split_terms(), "x^2 + 2x + 3x + 6");
        assert_eq!(split.factors(), "(x + 3)(x + 2)");

        let split = fit("6x^2 + x - 2").unwrap().split_middle().unwrap().unwrap();
        assert_eq!((split.p, split.q), (-3, 4));
        assert_eq!(split.factors(), "(3x + 2)(2x - 1)");

        let split = fit("-x^2 + 5x - 6").unwrap().split_middle().unwrap().unwrap();
        assert_eq!(split.factors(), "(-x + 3)(x - 2)");

        let split = fit("x^2 + 5x").unwrap().split_middle().unwrap().unwrap();
        assert_eq!(split.factors(), "x(x + 5)");
    }

    #[test]
    fn test_split_middle_term_failures() {
        assert_eq!(fit("x^2 + x + 1").unwrap().split_middle().unwrap(), None);
        assert!(matches!(fit("x + 1").unwrap().split_middle(), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(
            fit("0.5x^2 + x").unwrap().split_middle(),
            Err(SolveError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_display_signs() {
        let q = Quadratic { a: -2.0, b: 1.0, c: -0.5 };
        assert_eq!(q.to_string(), "-2x^2 + x - 0.5");
    }
}
