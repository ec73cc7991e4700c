//! Algebraic conversion formulas.
//!
//! Evaluation is a pluggable capability: [`Mdf`](crate::Mdf) holds a boxed
//! [`FormulaEvaluator`] and hands it the formula text together with the whole
//! raw array. [`SimpleFormulaEvaluator`] covers the common MCD-2 MC subset.

use crate::{Error, Result};

/// Evaluates a formula over a raw sample array.
pub trait FormulaEvaluator {
    /// Returns one physical value per element of `raw`, with the formula's
    /// variable (`X`) bound to that element.
    fn evaluate(&self, formula: &str, raw: &[f64]) -> Result<Vec<f64>>;
}

/// Recursive-descent evaluator for `+ - * / ^ **`, unary minus,
/// parentheses, decimal/scientific numbers and the variable `X` (or `x`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFormulaEvaluator;

impl FormulaEvaluator for SimpleFormulaEvaluator {
    fn evaluate(&self, formula: &str, raw: &[f64]) -> Result<Vec<f64>> {
        let expr = parse(formula)?;
        Ok(raw.iter().map(|&x| expr.eval(x)).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable,
    Neg(Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
}

impl Expr {
    fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Variable => x,
            Expr::Neg(inner) => -inner.eval(x),
            Expr::Binary(lhs, op, rhs) => {
                let (l, r) = (lhs.eval(x), rhs.eval(x));
                match op {
                    Token::Plus => l + r,
                    Token::Minus => l - r,
                    Token::Star => l * r,
                    Token::Slash => l / r,
                    _ => l.powf(r),
                }
            }
        }
    }
}

fn formula_error(formula: &str, what: &str) -> Error {
    Error::FormulaError(format!("{what} in formula {formula:?}"))
}

fn tokenize(formula: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = formula.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '/' | '^' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            'X' | 'x' => {
                chars.next();
                tokens.push(Token::Variable);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        literal.push(ch);
                        chars.next();
                    } else if ch == 'e' || ch == 'E' {
                        literal.push(ch);
                        chars.next();
                        if let Some(&sign) = chars.peek().filter(|s| **s == '+' || **s == '-') {
                            literal.push(sign);
                            chars.next();
                        }
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse()
                    .map_err(|_| formula_error(formula, &format!("invalid number {literal:?}")))?;
                tokens.push(Token::Number(value));
            }
            other => {
                return Err(formula_error(
                    formula,
                    &format!("unexpected character {other:?}"),
                ));
            }
        }
    }
    Ok(tokens)
}

/// Nesting limit for parentheses, unary signs and exponents.
const MAX_DEPTH: usize = 256;
/// Bounds the length of left-leaning operator chains.
const MAX_TOKENS: usize = 4096;

// expr    = term (('+' | '-') term)*
// term    = unary (('*' | '/') unary)*
// unary   = '-' unary | power
// power   = primary ('^' unary)?
// primary = NUMBER | X | '(' expr ')'
struct Parser<'a> {
    formula: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn parse(formula: &str) -> Result<Expr> {
    let tokens = tokenize(formula)?;
    if tokens.len() > MAX_TOKENS {
        return Err(Error::FormulaError(format!(
            "formula has {} tokens, at most {MAX_TOKENS} are supported",
            tokens.len()
        )));
    }
    let mut parser = Parser {
        formula,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(formula_error(formula, "trailing tokens"));
    }
    Ok(expr)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek().cloned() {
            self.pos += 1;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(self.term()?));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek().cloned() {
            self.pos += 1;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(self.unary()?));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::FormulaError(format!(
                "formula nests deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let expr = self.signed();
        self.depth -= 1;
        expr
    }

    fn signed(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.peek() == Some(&Token::Plus) {
            self.pos += 1;
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            // right associative
            let exponent = self.unary()?;
            return Ok(Expr::Binary(Box::new(base), Token::Caret, Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| formula_error(self.formula, "unexpected end"))?;
        self.pos += 1;
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Variable => Ok(Expr::Variable),
            Token::LParen => {
                let inner = self.expr()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(formula_error(self.formula, "missing ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            other => Err(formula_error(
                self.formula,
                &format!("unexpected token {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(formula: &str, x: f64) -> f64 {
        SimpleFormulaEvaluator.evaluate(formula, &[x]).unwrap()[0]
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval("2 + 3 * X", 2.0), 8.0);
        assert_eq!(eval("(2 + 3) * X", 2.0), 10.0);
        assert_eq!(eval("X / 4 - 1", 8.0), 1.0);
    }

    #[test]
    fn power_forms() {
        assert_eq!(eval("X^2", 3.0), 9.0);
        assert_eq!(eval("X**2 + 1", 3.0), 10.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("-X^2", 3.0), -9.0);
    }

    #[test]
    fn scientific_literals_and_lowercase_variable() {
        assert_eq!(eval("1.5e2 + x", 1.0), 151.0);
        assert_eq!(eval("1E-1 * X", 10.0), 1.0);
    }

    #[test]
    fn whole_array_is_evaluated() {
        let out = SimpleFormulaEvaluator
            .evaluate("X * 2", &[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(out, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn nesting_is_bounded() {
        let ok = format!("{}X{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&ok, 4.0), 4.0);

        let deep = format!("{}X{}", "(".repeat(1000), ")".repeat(1000));
        assert!(matches!(
            SimpleFormulaEvaluator.evaluate(&deep, &[1.0]),
            Err(Error::FormulaError(_))
        ));
        let signs = format!("{}X", "-".repeat(1000));
        assert!(matches!(
            SimpleFormulaEvaluator.evaluate(&signs, &[1.0]),
            Err(Error::FormulaError(_))
        ));
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        let chain = vec!["X"; 3000].join(" + ");
        assert!(matches!(
            SimpleFormulaEvaluator.evaluate(&chain, &[1.0]),
            Err(Error::FormulaError(_))
        ));
        let short = vec!["X"; 100].join(" + ");
        assert_eq!(eval(&short, 1.0), 100.0);
    }

    #[test]
    fn malformed_formulas_are_errors() {
        for bad in ["", "X +", "(X", "X $ 2", "X X"] {
            assert!(matches!(
                SimpleFormulaEvaluator.evaluate(bad, &[1.0]),
                Err(Error::FormulaError(_))
            ));
        }
    }
}
