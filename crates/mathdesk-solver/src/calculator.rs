//! Built-in solver: dispatches a question to a command, an equation solver or
//! the expression evaluator.

use std::f64::consts::PI;

use serde_json::{json, Value};
use tracing::debug;

use mathdesk_common::Solution;

use crate::error::{Result, SolveError};
use crate::expr::{fmt_num, number_value, BinOp, Bindings, Expr, Variable};
use crate::linear::{determinant, solve_pair, LinearForm, SystemSolution};
use crate::normalise::{normalise, split_conjunction};
use crate::polynomial::{relative_residual, Quadratic, Roots};
use crate::Solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Power,
    Gcd,
    Circle,
    Triangle,
    Roots,
    Split,
}

const COMMANDS: &[(&str, Command)] = &[
    ("power", Command::Power),
    ("gcd", Command::Gcd),
    ("circle", Command::Circle),
    ("triangle", Command::Triangle),
    ("roots", Command::Roots),
    ("split", Command::Split),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for Calculator {
    fn solve(&self, question: &str) -> Result<Solution> {
        let trimmed = question.trim();
        if let Some((command, args)) = parse_command(trimmed) {
            debug!(?command, args, "Dispatching command");
            return match command {
                Command::Power => power(args),
                Command::Gcd => gcd(args),
                Command::Circle => circle(args),
                Command::Triangle => triangle(args),
                Command::Roots => roots(args),
                Command::Split => split(args),
            };
        }

        let normalised = normalise(trimmed);
        let mut steps = Vec::new();
        if normalised != trimmed {
            steps.push(format!("Rewrote the input as: {}", normalised));
        }

        let parts = split_conjunction(&normalised);
        if parts.len() > 1 {
            system(&parts, steps)
        } else if normalised.contains('=') {
            equation(&normalised, steps)
        } else {
            evaluate(&normalised, steps)
        }
    }
}

/// `name(args)` with a known command name, case-insensitive.
fn parse_command(input: &str) -> Option<(Command, &str)> {
    let open = input.find('(')?;
    let name = input[..open].trim().to_lowercase();
    let (_, command) = COMMANDS.iter().find(|(n, _)| *n == name)?;
    let args = input[open + 1..].trim_end().strip_suffix(')')?;
    Some((*command, args))
}

/// Comma-separated numeric arguments; each may itself be an expression.
fn numeric_args(args: &str) -> Result<Vec<f64>> {
    args.split(',')
        .map(|arg| {
            let arg = normalise(arg);
            if arg.is_empty() {
                return Err(SolveError::InvalidArguments("empty argument".to_string()));
            }
            Expr::parse(&arg)
                .and_then(|e| e.eval(None))
                .map_err(|_| SolveError::InvalidArguments(format!("'{}' is not a number", arg)))
        })
        .collect()
}

fn single_variable_only(exprs: &[&Expr]) -> Result<()> {
    if exprs.iter().any(|e| e.uses(Variable::Y)) {
        return Err(SolveError::Unsupported(
            "y is only solved in a system: join two linear equations with `and`".to_string(),
        ));
    }
    Ok(())
}

fn evaluate(input: &str, mut steps: Vec<String>) -> Result<Solution> {
    let expr = Expr::parse(input)?;
    single_variable_only(&[&expr])?;
    if expr.contains_var() {
        // A bare polynomial in x is read as "find its roots".
        return solve_polynomial(&expr, steps, "Find the roots of");
    }

    let value = expr.eval(None)?;
    steps.push(format!("Parsed expression: {}", expr));
    steps.push(format!("Evaluated: {} = {}", expr, fmt_num(value)));
    Ok(Solution::solved(number_value(value), steps, 1.0))
}

fn equation(input: &str, mut steps: Vec<String>) -> Result<Solution> {
    let sides: Vec<&str> = input.split('=').collect();
    if sides.len() != 2 {
        return Err(SolveError::InvalidArguments(format!(
            "expected exactly one '=' but found {}",
            sides.len() - 1
        )));
    }

    let lhs = Expr::parse(sides[0].trim())?;
    let rhs = Expr::parse(sides[1].trim())?;
    single_variable_only(&[&lhs, &rhs])?;

    if !lhs.contains_var() && !rhs.contains_var() {
        let l = lhs.eval(None)?;
        let r = rhs.eval(None)?;
        let holds = (l - r).abs() <= 1e-9 * (1.0 + l.abs().max(r.abs()));
        steps.push(format!("Left side: {} = {}", lhs, fmt_num(l)));
        steps.push(format!("Right side: {} = {}", rhs, fmt_num(r)));
        steps.push(format!("The equation is {}", if holds { "true" } else { "false" }));
        return Ok(Solution::solved(holds, steps, 1.0));
    }

    steps.push(format!("Equation: {} = {}", lhs, rhs));
    let combined = Expr::binary(BinOp::Sub, lhs, rhs);
    solve_polynomial(&combined, steps, "Move every term to the left")
}

fn solve_polynomial(expr: &Expr, mut steps: Vec<String>, intro: &str) -> Result<Solution> {
    let quad = Quadratic::fit(expr)?;
    steps.push(format!("{}: {} = 0", intro, quad));

    let roots = match quad.roots() {
        Roots::All => {
            steps.push("Both sides are identical, so every real x is a solution".to_string());
            return Ok(Solution::solved("all real numbers", steps, 1.0));
        }
        Roots::None => {
            steps.push(format!("{} = 0 never holds, so there is no solution", fmt_num(quad.c)));
            return Ok(Solution::unsolved(steps));
        }
        Roots::Complex { discriminant } => {
            steps.push(format!("Discriminant b^2 - 4ac = {}", fmt_num(discriminant)));
            steps.push("The discriminant is negative, so there are no real roots".to_string());
            return Ok(Solution::unsolved(steps));
        }
        Roots::Real(roots) => roots,
    };

    match quad.degree() {
        1 => {
            steps.push(format!("Isolate x: x = -({}) / {}", fmt_num(quad.c), fmt_num(quad.b)));
        }
        _ => {
            steps.push(format!(
                "Coefficients: a = {}, b = {}, c = {}",
                fmt_num(quad.a),
                fmt_num(quad.b),
                fmt_num(quad.c)
            ));
            steps.push(format!("Discriminant b^2 - 4ac = {}", fmt_num(quad.discriminant())));
            steps.push("Apply x = (-b ± sqrt(b^2 - 4ac)) / 2a".to_string());
        }
    }

    // Residuals are relative to the size of the terms, so tiny coefficients
    // do not pass off a wrong root as exact.
    let residual = roots
        .iter()
        .map(|root| {
            expr.eval(Some(*root))
                .map(|actual| relative_residual(actual, quad.scale_at(*root)))
                .unwrap_or(f64::INFINITY)
        })
        .fold(0.0_f64, f64::max);

    let listed: Vec<String> = roots.iter().map(|r| format!("x = {}", fmt_num(*r))).collect();
    steps.push(format!("Solution: {}", listed.join(", ")));
    steps.push(format!("Check: substituting back leaves a relative residual of {:.1e}", residual));

    let values: Vec<Value> = roots.into_iter().map(number_value).collect();
    Ok(Solution::solved(values, steps, 1.0 / (1.0 + residual)))
}

/// Two linear equations in x and y joined by `and`.
fn system(parts: &[&str], mut steps: Vec<String>) -> Result<Solution> {
    let [first, second] = parts else {
        return Err(SolveError::InvalidArguments(format!(
            "a system needs exactly two equations joined by 'and' but found {}",
            parts.len()
        )));
    };

    let mut forms = Vec::with_capacity(2);
    let mut originals = Vec::with_capacity(2);
    for (i, text) in [first, second].into_iter().enumerate() {
        let sides: Vec<&str> = text.split('=').collect();
        let [lhs, rhs] = sides[..] else {
            return Err(SolveError::InvalidArguments(format!(
                "equation {} of the system needs exactly one '='",
                i + 1
            )));
        };
        let combined = Expr::binary(BinOp::Sub, Expr::parse(lhs.trim())?, Expr::parse(rhs.trim())?);
        let form = LinearForm::fit(&combined)?;
        steps.push(format!("Equation {} in standard form: {}", i + 1, form));
        forms.push(form);
        originals.push(combined);
    }

    let det = determinant(&forms[0], &forms[1]);
    steps.push(format!("Determinant a1·b2 - a2·b1 = {}", fmt_num(det)));

    match solve_pair(&forms[0], &forms[1]) {
        SystemSolution::Unique { x, y } => {
            steps.push(format!("Cramer's rule: x = {}, y = {}", fmt_num(x), fmt_num(y)));
            let residual = originals
                .iter()
                .zip(&forms)
                .map(|(expr, form)| {
                    expr.eval_with(Bindings::xy(x, y))
                        .map(|actual| relative_residual(actual, form.scale_at(x, y)))
                        .unwrap_or(f64::INFINITY)
                })
                .fold(0.0_f64, f64::max);
            steps.push(format!("Check: substituting back leaves a relative residual of {:.1e}", residual));
            let result = json!({ "x": number_value(x), "y": number_value(y) });
            Ok(Solution::solved(result, steps, 1.0 / (1.0 + residual)))
        }
        SystemSolution::Infinite => {
            steps.push("Both equations describe the same line, so every point on it is a solution".to_string());
            Ok(Solution::solved("infinitely many solutions", steps, 1.0))
        }
        SystemSolution::Inconsistent => {
            steps.push("The equations contradict each other, so there is no solution".to_string());
            Ok(Solution::unsolved(steps))
        }
    }
}

fn power(args: &str) -> Result<Solution> {
    let params = numeric_args(args)?;
    let [base, exponent] = params[..] else {
        return Err(SolveError::InvalidArguments(
            "provide exactly two numbers: base, exponent".to_string(),
        ));
    };

    let value = base.powf(exponent);
    if !value.is_finite() {
        return Err(SolveError::Undefined(format!(
            "{}^{} is not a finite real number",
            fmt_num(base),
            fmt_num(exponent)
        )));
    }

    let steps = vec![format!("{}^{} = {}", fmt_num(base), fmt_num(exponent), fmt_num(value))];
    Ok(Solution::solved(number_value(value), steps, 1.0))
}

fn gcd(args: &str) -> Result<Solution> {
    let params = numeric_args(args)?;
    if params.len() < 2 {
        return Err(SolveError::InvalidArguments(
            "provide at least two numbers separated by commas".to_string(),
        ));
    }

    let mut ints = Vec::with_capacity(params.len());
    for p in params {
        if p.fract() != 0.0 || p.abs() > u64::MAX as f64 {
            return Err(SolveError::InvalidArguments(format!("{} is not an integer", fmt_num(p))));
        }
        ints.push(p.abs() as u64);
    }

    let mut steps = Vec::new();
    let mut acc = ints[0];
    for &n in &ints[1..] {
        let next = euclid(acc, n);
        steps.push(format!("gcd({}, {}) = {}", acc, n, next));
        acc = next;
    }

    Ok(Solution::solved(acc, steps, 1.0))
}

fn euclid(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn circle(args: &str) -> Result<Solution> {
    match numeric_args(args)?[..] {
        [r] => {
            if r <= 0.0 {
                return Err(SolveError::InvalidArguments("radius must be positive".to_string()));
            }
            let circumference = 2.0 * PI * r;
            let area = PI * r * r;
            let steps = vec![
                format!("Diameter = 2r = {}", fmt_num(2.0 * r)),
                format!("Circumference = 2πr = {}", fmt_num(circumference)),
                format!("Area = πr^2 = {}", fmt_num(area)),
            ];
            let result = json!({
                "radius": number_value(r),
                "diameter": number_value(2.0 * r),
                "circumference": number_value(circumference),
                "area": number_value(area),
            });
            Ok(Solution::solved(result, steps, 1.0))
        }
        [x, y] => {
            let equation = format!("(x - {})^2 + (y - {})^2 = r^2", fmt_num(x), fmt_num(y));
            let steps = vec![
                format!("Centre at ({}, {})", fmt_num(x), fmt_num(y)),
                "Radius not given, so the equation keeps r symbolic".to_string(),
            ];
            let result = json!({
                "center": [number_value(x), number_value(y)],
                "equation": equation,
            });
            Ok(Solution::solved(result, steps, 1.0))
        }
        _ => Err(SolveError::InvalidArguments(
            "use circle(radius) or circle(x, y)".to_string(),
        )),
    }
}

fn triangle(args: &str) -> Result<Solution> {
    match numeric_args(args)?[..] {
        [a, b, c] => {
            if a <= 0.0 || b <= 0.0 || c <= 0.0 {
                return Err(SolveError::InvalidArguments("triangle sides must be positive".to_string()));
            }
            if a + b <= c || b + c <= a || a + c <= b {
                return Err(SolveError::InvalidArguments(
                    "sides violate the triangle inequality".to_string(),
                ));
            }
            let perimeter = a + b + c;
            let s = perimeter / 2.0;
            let area = (s * (s - a) * (s - b) * (s - c)).sqrt();
            let steps = vec![
                format!("Perimeter = {} + {} + {} = {}", fmt_num(a), fmt_num(b), fmt_num(c), fmt_num(perimeter)),
                format!("Semi-perimeter s = {}", fmt_num(s)),
                format!("Heron's formula: sqrt(s(s-a)(s-b)(s-c)) = {}", fmt_num(area)),
            ];
            let result = json!({
                "sides": [number_value(a), number_value(b), number_value(c)],
                "perimeter": number_value(perimeter),
                "semi_perimeter": number_value(s),
                "area": number_value(area),
            });
            Ok(Solution::solved(result, steps, 1.0))
        }
        [base, height] => {
            if base <= 0.0 || height <= 0.0 {
                return Err(SolveError::InvalidArguments(
                    "base and height must be positive".to_string(),
                ));
            }
            let area = 0.5 * base * height;
            let steps = vec![format!(
                "Area = 1/2 * {} * {} = {}",
                fmt_num(base),
                fmt_num(height),
                fmt_num(area)
            )];
            let result = json!({
                "base": number_value(base),
                "height": number_value(height),
                "area": number_value(area),
            });
            Ok(Solution::solved(result, steps, 1.0))
        }
        _ => Err(SolveError::InvalidArguments(
            "use triangle(a, b, c) for sides or triangle(base, height)".to_string(),
        )),
    }
}

fn roots(args: &str) -> Result<Solution> {
    let normalised = normalise(args);
    let expr = Expr::parse(&normalised)?;
    if !expr.contains_var() {
        return Err(SolveError::InvalidArguments("roots(...) needs an expression in x".to_string()));
    }
    solve_polynomial(&expr, Vec::new(), "Find the roots of")
}

fn split(args: &str) -> Result<Solution> {
    let normalised = normalise(args);
    let expr = Expr::parse(&normalised)?;
    single_variable_only(&[&expr])?;
    if !expr.contains_var() {
        return Err(SolveError::InvalidArguments("split(...) needs a quadratic in x".to_string()));
    }

    let quad = Quadratic::fit(&expr)?;
    let mut steps = vec![format!("Write as ax^2 + bx + c: {}", quad)];

    let Some(found) = quad.split_middle()? else {
        steps.push(format!(
            "No pair of integers multiplies to a*c = {} and adds to b = {}",
            fmt_num(quad.a * quad.c),
            fmt_num(quad.b)
        ));
        return Ok(Solution::unsolved(steps));
    };

    let (p, q, ac) = (found.p, found.q, found.product());
    steps.push(format!("a*c = {}", ac));
    steps.push(format!("Pick {} and {}: {} * {} = {} and {} + {} = {}", p, q, p, q, ac, p, q, p + q));
    steps.push(format!("Split the middle term: {}", found.split_terms()));
    steps.push(format!("Group and factor: {}", found.factors()));

    let result = json!({
        "original": quad.to_string(),
        "split_terms": found.split_terms(),
        "factors": found.factors(),
        "middle_terms": format!("{}x and {}x (sum = {}x, product = {})", p, q, p + q, ac),
    });
    Ok(Solution::solved(result, steps, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solve(q: &str) -> Solution {
        Calculator::new().solve(q).unwrap()
    }

    #[test]
    fn test_simple_arithmetic() {
        let s = solve("2+2");
        assert_eq!(s.result, Some(json!(4)));
        assert_eq!(s.confidence, 1.0);
        assert!(s.steps.iter().any(|step| step.contains("= 4")));
    }

    #[test]
    fn test_word_problem() {
        let s = solve("What is 3 plus 4 times 2?");
        assert_eq!(s.result, Some(json!(11)));
        assert!(s.steps[0].starts_with("Rewrote the input"));
    }

    #[test]
    fn test_linear_equation() {
        let s = solve("2x + 3 = 7");
        assert_eq!(s.result, Some(json!([2])));
        assert!(s.confidence > 0.99);
        assert!(s.steps.iter().any(|step| step == "Solution: x = 2"));
    }

    #[test]
    fn test_quadratic_equation() {
        let s = solve("x^2 = 5x - 6");
        assert_eq!(s.result, Some(json!([2, 3])));
    }

    #[test]
    fn test_quadratic_without_real_roots_is_unsolved() {
        let s = solve("x^2 + 4 = 0");
        assert_eq!(s.result, None);
        assert!(s.steps.iter().any(|step| step.contains("no real roots")));
    }

    #[test]
    fn test_equation_without_variable() {
        assert_eq!(solve("2 + 2 = 4").result, Some(json!(true)));
        assert_eq!(solve("2 + 2 = 5").result, Some(json!(false)));
    }

    #[test]
    fn test_identity_and_contradiction() {
        assert_eq!(solve("x + 1 = 1 + x").result, Some(json!("all real numbers")));
        assert_eq!(solve("x + 1 = x + 2").result, None);
    }

    #[test]
    fn test_small_coefficients_are_solved_exactly() {
        let s = solve("0.00001x^2 = 0.000000001");
        assert_eq!(s.result, Some(json!([-0.01, 0.01])));
        assert!(s.confidence > 0.99);
        assert!(!s.steps.iter().any(|step| step == "Discriminant b^2 - 4ac = 0"));
    }

    #[test]
    fn test_linear_system() {
        let s = solve("x + y = 5 and x - y = 1");
        assert_eq!(s.result, Some(json!({ "x": 3, "y": 2 })));
        assert!(s.confidence > 0.99);
        assert!(s.steps.iter().any(|step| step == "Equation 1 in standard form: x + y = 5"));

        let s = solve("Solve 2x + 3y = 12 and x = y + 1");
        assert_eq!(s.result, Some(json!({ "x": 3, "y": 2 })));
    }

    #[test]
    fn test_degenerate_systems() {
        assert_eq!(
            solve("x + y = 2 and 2x + 2y = 4").result,
            Some(json!("infinitely many solutions"))
        );
        assert_eq!(solve("x + y = 2 and x + y = 3").result, None);

        let calc = Calculator::new();
        assert!(matches!(calc.solve("x = 1 and y = 2 and x = y"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("x + y and x = 1"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("xy = 1 and x = 1"), Err(SolveError::Unsupported(_))));
    }

    #[test]
    fn test_y_outside_a_system_is_unsupported() {
        let err = Calculator::new().solve("2y = 4").unwrap_err();
        assert!(matches!(err, SolveError::Unsupported(msg) if msg.contains("and")));
    }

    #[test]
    fn test_split_command() {
        let s = solve("split(x^2 + 5x + 6)");
        let result = s.result.unwrap();
        assert_eq!(result["split_terms"], json!("x^2 + 2x + 3x + 6"));
        assert_eq!(result["factors"], json!("(x + 3)(x + 2)"));
        assert_eq!(result["middle_terms"], json!("2x and 3x (sum = 5x, product = 6)"));

        let s = solve("Split(2x^2 + 7x + 3)");
        assert_eq!(s.result.unwrap()["factors"], json!("(x + 3)(2x + 1)"));

        assert_eq!(solve("split(x^2 + x + 1)").result, None);
        assert!(matches!(
            Calculator::new().solve("split(x + 1)"),
            Err(SolveError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_infix_word_operators() {
        assert_eq!(solve("2 power 3").result, Some(json!(8)));
        assert_eq!(solve("6 multiply 7").result, Some(json!(42)));
    }

    #[test]
    fn test_commands() {
        assert_eq!(solve("power(2, 10)").result, Some(json!(1024)));
        assert_eq!(solve("GCD(48, 18, 30)").result, Some(json!(6)));
        assert_eq!(solve("roots(x^2 - 9)").result, Some(json!([-3, 3])));

        let c = solve("circle(1)").result.unwrap();
        assert_eq!(c["diameter"], json!(2));
        assert_eq!(c["area"], number_value(PI));

        let t = solve("triangle(3, 4, 5)").result.unwrap();
        assert_eq!(t["area"], json!(6));
        assert_eq!(t["perimeter"], json!(12));

        let bh = solve("triangle(10, 3)").result.unwrap();
        assert_eq!(bh["area"], json!(15));
    }

    #[test]
    fn test_command_argument_errors() {
        let calc = Calculator::new();
        assert!(matches!(calc.solve("power(2)"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("gcd(4)"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("gcd(4.5, 2)"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("circle(-1)"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("triangle(1, 2, 10)"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("power(a, 2)"), Err(SolveError::InvalidArguments(_))));
    }

    #[test]
    fn test_malformed_input_fails() {
        let calc = Calculator::new();
        assert!(matches!(calc.solve("2 +* 3"), Err(SolveError::Parse(_))));
        assert!(matches!(calc.solve("1 = 2 = 3"), Err(SolveError::InvalidArguments(_))));
        assert!(matches!(calc.solve("1 / 0"), Err(SolveError::Undefined(_))));
        assert!(matches!(calc.solve("x^3 = 8"), Err(SolveError::Unsupported(_))));
    }

    #[test]
    fn test_parse_command_requires_known_name() {
        assert_eq!(parse_command("power(2,3)"), Some((Command::Power, "2,3")));
        assert_eq!(parse_command("split(x^2 - 1)"), Some((Command::Split, "x^2 - 1")));
        assert_eq!(parse_command("sqrt(4)"), None);
        assert_eq!(parse_command("(1 + 2) * 3"), None);
    }
}
