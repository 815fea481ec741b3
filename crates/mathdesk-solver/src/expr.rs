//! Arithmetic expressions in the variables `x` and `y`.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | implicit-mul)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | name | func primary | '(' expr ')'
//! ```
//!
//! Implicit multiplication applies when a factor is followed by a name or an
//! opening parenthesis (`2x`, `3(x + 1)`, `2pi`). Two bare numbers in a row
//! are rejected rather than guessed at.
//!
//! Input size and nesting are capped at parse time: every later pass over the
//! tree (evaluation, printing, drop) recurses, so a parsed [`Expr`] is always
//! shallow enough to walk on a blocking worker's stack.

use std::f64::consts;
use std::fmt;

use serde_json::Value;

use crate::error::{Result, SolveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 3,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Ln,
    Log,
    Exp,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Sqrt => "sqrt",
            Func::Abs  => "abs",
            Func::Sin  => "sin",
            Func::Cos  => "cos",
            Func::Tan  => "tan",
            Func::Ln   => "ln",
            Func::Log  => "log",
            Func::Exp  => "exp",
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sqrt => v.sqrt(),
            Func::Abs  => v.abs(),
            Func::Sin  => v.sin(),
            Func::Cos  => v.cos(),
            Func::Tan  => v.tan(),
            Func::Ln   => v.ln(),
            Func::Log  => v.log10(),
            Func::Exp  => v.exp(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    fn value(self) -> f64 {
        match self {
            Constant::Pi => consts::PI,
            Constant::E  => consts::E,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E  => "e",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    X,
    Y,
}

impl Variable {
    pub fn name(self) -> &'static str {
        match self {
            Variable::X => "x",
            Variable::Y => "y",
        }
    }
}

/// Values for the free variables during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bindings {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Bindings {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y) }
    }

    fn get(&self, var: Variable) -> Result<f64> {
        let value = match var {
            Variable::X => self.x,
            Variable::Y => self.y,
        };
        value.ok_or_else(|| match var {
            Variable::X => SolveError::Unsupported(
                "the expression contains x; write an equation such as `2x + 1 = 5` or use roots(...)"
                    .to_string(),
            ),
            Variable::Y => SolveError::Unsupported(
                "y is only solved in a system: join two linear equations with `and`".to_string(),
            ),
        })
    }
}

/// Tokens accepted in one expression.
const MAX_TOKENS: usize = 1000;

/// Nesting allowed through parentheses, function calls and unary signs.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Const(Constant),
    Var(Variable),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Err(SolveError::Parse("empty expression".to_string()));
        }

        let mut parser = Parser { tokens, pos: 0, depth: 0 };
        let expr = parser.parse_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(SolveError::Parse(format!("unexpected {}", tok))),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn contains_var(&self) -> bool {
        self.uses(Variable::X) || self.uses(Variable::Y)
    }

    pub fn uses(&self, var: Variable) -> bool {
        match self {
            Expr::Var(v) => *v == var,
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.uses(var),
            Expr::Binary(_, lhs, rhs) => lhs.uses(var) || rhs.uses(var),
        }
    }

    /// Evaluate with `x` bound to `x`, or unbound when `None`. `y` stays unbound.
    pub fn eval(&self, x: Option<f64>) -> Result<f64> {
        self.eval_with(Bindings { x, y: None })
    }

    pub fn eval_with(&self, vars: Bindings) -> Result<f64> {
        let value = match self {
            Expr::Num(n) => *n,
            Expr::Const(c) => c.value(),
            Expr::Var(v) => vars.get(*v)?,
            Expr::Neg(inner) => -inner.eval_with(vars)?,
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval_with(vars)?;
                let r = rhs.eval_with(vars)?;
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div if r == 0.0 => {
                        return Err(SolveError::Undefined("division by zero".to_string()));
                    }
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                }
            }
            Expr::Call(func, arg) => {
                let v = arg.eval_with(vars)?;
                let out = func.apply(v);
                if !out.is_finite() {
                    return Err(SolveError::Undefined(format!(
                        "{}({}) is not a real number",
                        func.name(),
                        fmt_num(v)
                    )));
                }
                out
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(SolveError::Undefined(format!("{} is not a finite number", self)))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", fmt_num(*n)),
            Expr::Const(c) => write!(f, "{}", c.name()),
            Expr::Var(v) => write!(f, "{}", v.name()),
            Expr::Neg(inner) => match **inner {
                Expr::Binary(..) => write!(f, "-({})", inner),
                _ => write!(f, "-{}", inner),
            },
            Expr::Binary(op, lhs, rhs) => {
                write_operand(f, lhs, op.precedence(), false)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, rhs, op.precedence(), true)
            }
            Expr::Call(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, parent: u8, right: bool) -> fmt::Result {
    let needs_parens = match e {
        Expr::Binary(op, ..) => {
            let p = op.precedence();
            // ^ is right-associative, the others left-associative
            p < parent || (p == parent && if parent == 3 { !right } else { right })
        }
        Expr::Neg(_) => parent == 3 && !right,
        _ => false,
    };
    if needs_parens {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

// ---------------------------------------------------------------------------
// Numeric presentation
// ---------------------------------------------------------------------------

/// Round to 15 significant digits, dropping magnitudes below 1e-15 and
/// folding `-0.0` into `0.0`.
pub fn round_value(v: f64) -> f64 {
    if !v.is_finite() || v.abs() >= 1e15 {
        return v;
    }
    if v.abs() < 1e-15 {
        return 0.0;
    }
    let r = format!("{:.14e}", v).parse::<f64>().unwrap_or(v);
    if r == 0.0 { 0.0 } else { r }
}

pub fn fmt_num(v: f64) -> String {
    let r = round_value(v);
    if r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{}", r as i64)
    } else {
        format!("{}", r)
    }
}

/// JSON number for a result; integral values serialize without a fraction.
pub fn number_value(v: f64) -> Value {
    let r = round_value(v);
    if r.fract() == 0.0 && r.abs() < 9e15 {
        Value::from(r as i64)
    } else {
        serde_json::Number::from_f64(r)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Name {
    Var(Variable),
    Const(Constant),
    Func(Func),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Name(Name),
    Op(char),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "number {}", fmt_num(*n)),
            Token::Name(Name::Var(v)) => write!(f, "name '{}'", v.name()),
            Token::Name(Name::Const(c)) => write!(f, "name '{}'", c.name()),
            Token::Name(Name::Func(func)) => write!(f, "name '{}'", func.name()),
            Token::Op(c) => write!(f, "operator '{}'", c),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

/// Longest names first so `exp` wins over `e`.
const NAMES: &[(&str, Name)] = &[
    ("sqrt", Name::Func(Func::Sqrt)),
    ("abs",  Name::Func(Func::Abs)),
    ("sin",  Name::Func(Func::Sin)),
    ("cos",  Name::Func(Func::Cos)),
    ("tan",  Name::Func(Func::Tan)),
    ("log",  Name::Func(Func::Log)),
    ("exp",  Name::Func(Func::Exp)),
    ("ln",   Name::Func(Func::Ln)),
    ("pi",   Name::Const(Constant::Pi)),
    ("x",    Name::Var(Variable::X)),
    ("y",    Name::Var(Variable::Y)),
    ("e",    Name::Const(Constant::E)),
];

fn lex(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if tokens.len() > MAX_TOKENS {
            return Err(SolveError::Parse(format!(
                "expression is too long (more than {} tokens)",
                MAX_TOKENS
            )));
        }
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| SolveError::Parse(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                split_names(&word, &mut tokens)?;
            }
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' | '[' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' | ']' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => {
                return Err(SolveError::Parse(format!("unexpected character '{}'", other)));
            }
        }
    }

    if tokens.len() > MAX_TOKENS {
        return Err(SolveError::Parse(format!(
            "expression is too long (more than {} tokens)",
            MAX_TOKENS
        )));
    }
    Ok(tokens)
}

/// Break a run of letters into known names: `pix` -> `pi`, `x`.
fn split_names(word: &str, tokens: &mut Vec<Token>) -> Result<()> {
    let mut rest = word;
    while !rest.is_empty() {
        let (text, name) = NAMES
            .iter()
            .find(|(text, _)| rest.starts_with(text))
            .ok_or_else(|| SolveError::Parse(format!("unknown name '{}'", word)))?;
        tokens.push(Token::Name(*name));
        rest = &rest[text.len()..];
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Runs `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(SolveError::Parse("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let out = parse(self);
        self.depth -= 1;
        out
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => BinOp::Add,
                Some(Token::Op('-')) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Op('*')) | Some(Token::Op('/')) => {
                    let op = if self.advance() == Some(Token::Op('*')) { BinOp::Mul } else { BinOp::Div };
                    let rhs = self.parse_unary()?;
                    lhs = Expr::binary(op, lhs, rhs);
                }
                Some(Token::Name(_)) | Some(Token::LParen) => {
                    let rhs = self.parse_power()?;
                    lhs = Expr::binary(BinOp::Mul, lhs, rhs);
                }
                Some(Token::Num(n)) => {
                    return Err(SolveError::Parse(format!(
                        "missing operator before {}; did you mean '{} * {}' or '{} + {}'?",
                        fmt_num(*n),
                        lhs,
                        fmt_num(*n),
                        lhs,
                        fmt_num(*n)
                    )));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.nested(|p| match p.peek() {
            Some(Token::Op('-')) => {
                p.pos += 1;
                Ok(Expr::Neg(Box::new(p.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                p.pos += 1;
                p.parse_unary()
            }
            _ => p.parse_power(),
        })
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Op('^')) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.nested(Self::parse_atom)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Name(Name::Var(v))) => Ok(Expr::Var(v)),
            Some(Token::Name(Name::Const(c))) => Ok(Expr::Const(c)),
            Some(Token::Name(Name::Func(func))) => {
                let arg = if self.peek() == Some(&Token::LParen) {
                    self.parse_primary()?
                } else {
                    self.parse_power()?
                };
                Ok(Expr::Call(func, Box::new(arg)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(SolveError::Parse("missing closing parenthesis".to_string())),
                }
            }
            Some(tok) => Err(SolveError::Parse(format!("unexpected {}", tok))),
            None => Err(SolveError::Parse("unexpected end of expression".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(input: &str) -> f64 {
        Expr::parse(input).unwrap().eval(None).unwrap()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("2 ^ -1"), 0.5);
    }

    #[test]
    fn test_implicit_multiplication() {
        let e = Expr::parse("2x + 3(x - 1)").unwrap();
        assert_eq!(e.eval(Some(2.0)).unwrap(), 7.0);
        assert!((eval("2pi") - 2.0 * consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(16) + abs(-3)"), 7.0);
        assert_eq!(eval("sqrt 9"), 3.0);
        assert_eq!(eval("log(1000)"), 3.0);
        assert_eq!(eval("exp(0)"), 1.0);
    }

    #[test]
    fn test_missing_operator_between_numbers() {
        let err = Expr::parse("2 3").unwrap_err();
        assert!(matches!(err, SolveError::Parse(msg) if msg.contains("missing operator")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Expr::parse(""), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("(1 + 2"), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("1 + 2)"), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("2 */ 3"), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("foo(2)"), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("1.2.3"), Err(SolveError::Parse(_))));
        assert!(matches!(Expr::parse("2 & 3"), Err(SolveError::Parse(_))));
    }

    #[test]
    fn test_undefined_values() {
        let div = Expr::parse("1 / (2 - 2)").unwrap().eval(None).unwrap_err();
        assert!(matches!(div, SolveError::Undefined(_)));
        let root = Expr::parse("sqrt(-4)").unwrap().eval(None).unwrap_err();
        assert!(matches!(root, SolveError::Undefined(_)));
    }

    #[test]
    fn test_unbound_variable() {
        let err = Expr::parse("x + 1").unwrap().eval(None).unwrap_err();
        assert!(matches!(err, SolveError::Unsupported(_)));
        let err = Expr::parse("y + 1").unwrap().eval(Some(1.0)).unwrap_err();
        assert!(matches!(err, SolveError::Unsupported(msg) if msg.contains("and")));
    }

    #[test]
    fn test_two_variables() {
        let e = Expr::parse("3x - 2y + xy").unwrap();
        assert!(e.uses(Variable::X) && e.uses(Variable::Y));
        assert_eq!(e.eval_with(Bindings::xy(2.0, 1.0)).unwrap(), 6.0);
        assert_eq!(e.to_string(), "3 * x - 2 * y + x * y");
        assert!(!Expr::parse("2x").unwrap().uses(Variable::Y));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = Expr::parse(&parens).unwrap_err();
        assert!(matches!(err, SolveError::Parse(_)));

        let parens = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert!(matches!(Expr::parse(&parens), Err(SolveError::Parse(msg)) if msg.contains("nested")));

        let negations = format!("{}1", "-".repeat(20_000));
        assert!(matches!(Expr::parse(&negations), Err(SolveError::Parse(_))));

        let exponents = format!("2{}", "^2".repeat(400));
        assert!(matches!(Expr::parse(&exponents), Err(SolveError::Parse(msg)) if msg.contains("nested")));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let parens = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&parens), 1.0);
        assert_eq!(eval("--+-3"), -3.0);
    }

    #[test]
    fn test_long_input_is_rejected() {
        let chain = "1+".repeat(5_000) + "1";
        let err = Expr::parse(&chain).unwrap_err();
        assert!(matches!(err, SolveError::Parse(msg) if msg.contains("too long")));
    }

    #[test]
    fn test_display_round_trips_structure() {
        assert_eq!(Expr::parse("(2+3)*4").unwrap().to_string(), "(2 + 3) * 4");
        assert_eq!(Expr::parse("10-(4-3)").unwrap().to_string(), "10 - (4 - 3)");
        assert_eq!(Expr::parse("2x^2").unwrap().to_string(), "2 * x ^ 2");
        assert_eq!(Expr::parse("-(1+2)").unwrap().to_string(), "-(1 + 2)");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt_num(4.0), "4");
        assert_eq!(fmt_num(0.1 + 0.2), "0.3");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(0.1 + 0.2 - 0.3), "0");
        assert_eq!(fmt_num(4e-14), "0.00000000000004");
        assert_eq!(number_value(123_456_789_012_345.0), serde_json::json!(123_456_789_012_345_i64));
        assert_eq!(number_value(2.5), serde_json::json!(2.5));
        assert_eq!(number_value(7.0), serde_json::json!(7));
    }
}
