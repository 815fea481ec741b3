//! Pairs of linear equations in `x` and `y`, solved by Cramer's rule.

use std::fmt;

use crate::error::{Result, SolveError};
use crate::expr::{fmt_num, Bindings, Expr};
use crate::polynomial::{format_terms, snap_noise};

const NOT_LINEAR: &str = "only systems of linear equations in x and y are supported";

const CHECK_POINTS: [(f64, f64); 4] = [(2.0, -3.0), (-0.5, 4.0), (7.0, 1.5), (3.0, 3.0)];

const NOISE: f64 = 1e-12;

/// `a·x + b·y + c`, the left side of `... = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearForm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SystemSolution {
    Unique { x: f64, y: f64 },
    /// The equations describe the same line.
    Infinite,
    Inconsistent,
}

impl LinearForm {
    /// Fit through (0,0), (1,0), (0,1) and verify against [`CHECK_POINTS`].
    pub fn fit(expr: &Expr) -> Result<Self> {
        let sample = |x: f64, y: f64| {
            expr.eval_with(Bindings::xy(x, y))
                .map_err(|_| SolveError::Unsupported(NOT_LINEAR.to_string()))
        };

        let origin = sample(0.0, 0.0)?;
        let along_x = sample(1.0, 0.0)?;
        let along_y = sample(0.0, 1.0)?;

        let scale = origin.abs().max(along_x.abs()).max(along_y.abs());
        let form = LinearForm {
            a: snap_noise(along_x - origin, scale),
            b: snap_noise(along_y - origin, scale),
            c: snap_noise(origin, scale),
        };

        for (x, y) in CHECK_POINTS {
            let actual = sample(x, y)?;
            let expected = form.eval(x, y);
            let tolerance = 1e-7 * (1.0 + actual.abs().max(expected.abs()));
            if (actual - expected).abs() > tolerance {
                return Err(SolveError::Unsupported(NOT_LINEAR.to_string()));
            }
        }

        Ok(form)
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }

    pub fn scale_at(&self, x: f64, y: f64) -> f64 {
        self.a.abs() * x.abs() + self.b.abs() * y.abs() + self.c.abs()
    }

    /// `0 = c` with `c != 0`.
    fn is_contradiction(&self) -> bool {
        self.a == 0.0 && self.b == 0.0 && self.c != 0.0
    }
}

impl fmt::Display for LinearForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lhs = format_terms(&[(self.a, "x"), (self.b, "y")]);
        write!(f, "{} = {}", lhs, fmt_num(-self.c))
    }
}

/// Determinant `a1·b2 - a2·b1` of the coefficient matrix.
pub fn determinant(first: &LinearForm, second: &LinearForm) -> f64 {
    first.a * second.b - second.a * first.b
}

pub fn solve_pair(first: &LinearForm, second: &LinearForm) -> SystemSolution {
    if first.is_contradiction() || second.is_contradiction() {
        return SystemSolution::Inconsistent;
    }

    let det = determinant(first, second);
    let magnitude = (first.a * second.b).abs() + (second.a * first.b).abs();
    if det.abs() > NOISE * magnitude {
        return SystemSolution::Unique {
            x: (first.b * second.c - second.b * first.c) / det,
            y: (second.a * first.c - first.a * second.c) / det,
        };
    }

    // Singular: the lines coincide only when the constants are in the same ratio.
    let near_zero = |l: f64, r: f64| (l - r).abs() <= NOISE * (l.abs() + r.abs());
    let same_line = near_zero(first.a * second.c, second.a * first.c)
        && near_zero(first.b * second.c, second.b * first.c);
    if same_line {
        SystemSolution::Infinite
    } else {
        SystemSolution::Inconsistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form(lhs: &str, rhs: &str) -> LinearForm {
        let expr = Expr::binary(
            crate::expr::BinOp::Sub,
            Expr::parse(lhs).unwrap(),
            Expr::parse(rhs).unwrap(),
        );
        LinearForm::fit(&expr).unwrap()
    }

    #[test]
    fn test_fit_standard_form() {
        let f = form("2x + 3", "y - 1");
        assert_eq!(f, LinearForm { a: 2.0, b: -1.0, c: 4.0 });
        assert_eq!(f.to_string(), "2x - y = -4");
    }

    #[test]
    fn test_unique_solution() {
        let solution = solve_pair(&form("x + y", "5"), &form("x - y", "1"));
        assert_eq!(solution, SystemSolution::Unique { x: 3.0, y: 2.0 });

        let solution = solve_pair(&form("2x + 3y", "12"), &form("x", "y + 1"));
        assert_eq!(solution, SystemSolution::Unique { x: 3.0, y: 2.0 });
    }

    #[test]
    fn test_singular_systems() {
        assert_eq!(
            solve_pair(&form("x + y", "2"), &form("2x + 2y", "4")),
            SystemSolution::Infinite
        );
        assert_eq!(
            solve_pair(&form("x + y", "2"), &form("x + y", "3")),
            SystemSolution::Inconsistent
        );
        assert_eq!(
            solve_pair(&form("x", "x + 5"), &form("x + y", "3")),
            SystemSolution::Inconsistent
        );
    }

    #[test]
    fn test_rejects_non_linear() {
        let expr = Expr::parse("xy - 1").unwrap();
        assert!(matches!(LinearForm::fit(&expr), Err(SolveError::Unsupported(_))));
        let expr = Expr::parse("x^2 + y").unwrap();
        assert!(matches!(LinearForm::fit(&expr), Err(SolveError::Unsupported(_))));
    }
}
