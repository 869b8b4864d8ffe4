//! Number expressions as they appear in gap records.
//!
//! ```text
//! expr     := [m "*"] base [offset] | NUMBER
//! base     := primorial ["/" divisor] | NUMBER "^" NUMBER
//! primorial:= NUMBER "#" | "(" NUMBER "#" ")"
//! divisor  := dterm | "(" dterm "*" dterm ")"
//! dterm    := NUMBER ["#"]
//! offset   := ("+" | "-") NUMBER
//! ```
//!
//! Whitespace is ignored everywhere. Anything else, including a leading
//! sign or a negative result, does not parse.

use std::fmt;

use logos::Logos;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::primes::{is_prime_brute, primorial};

/// Largest accepted primorial base.
pub const MAX_PRIMORIAL: u64 = 10_000_000;

/// Largest value, in bits, a power expression may expand to.
pub const MAX_POWER_BITS: u64 = 1 << 26;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r]+")]
enum Token {
    #[regex("[0-9]+", |lex| lex.slice().to_owned())]
    Number(String),
    #[token("#")]
    Hash,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("^")]
    Caret,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

/// `m * P# / d + a`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StandardForm {
    pub m: BigUint,
    pub p: u64,
    pub d: BigUint,
    pub a: BigInt,
}

impl StandardForm {
    /// `m * (P# / d) + a`; `None` if `d` does not divide `P#` or the result
    /// is negative.
    #[must_use]
    pub fn value(&self) -> Option<BigUint> {
        let p_primorial = primorial(self.p);
        if self.d.is_zero() || !(&p_primorial % &self.d).is_zero() {
            return None;
        }
        let k = p_primorial / &self.d;
        (BigInt::from(&self.m * k) + &self.a).to_biguint()
    }

    /// The same form with `offset` added to `a`.
    #[must_use]
    pub fn shifted(&self, offset: u64) -> Self {
        Self {
            a: &self.a + offset,
            ..self.clone()
        }
    }
}

impl fmt::Display for StandardForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.m.is_one() {
            write!(f, "{} * ", self.m)?;
        }
        write!(f, "{}#", self.p)?;
        if !self.d.is_one() {
            write!(f, " / {}", self.d)?;
        }
        match self.a.sign() {
            Sign::Minus => write!(f, " - {}", self.a.magnitude()),
            Sign::Plus => write!(f, " + {}", self.a),
            Sign::NoSign => Ok(()),
        }
    }
}

/// Parse `text` into its value.
#[must_use]
pub fn parse(text: &str) -> Option<BigUint> {
    match parse_expr(text)? {
        Expr::Primorial(form) => form.value(),
        Expr::Power { m, base, exp, a } => (BigInt::from(m * base.pow(exp)) + a).to_biguint(),
        Expr::Plain(n) => Some(n),
    }
}

/// Parse `text` as `m * P# / d ± a`. Power and plain numbers return `None`.
#[must_use]
pub fn parse_standard_form(text: &str) -> Option<StandardForm> {
    match parse_expr(text)? {
        Expr::Primorial(form) => Some(form),
        Expr::Power { .. } | Expr::Plain(_) => None,
    }
}

enum Expr {
    Primorial(StandardForm),
    Power {
        m: BigUint,
        base: BigUint,
        exp: u32,
        a: BigInt,
    },
    Plain(BigUint),
}

fn parse_expr(text: &str) -> Option<Expr> {
    let tokens: Vec<Token> = Token::lexer(text).collect::<Result<_, _>>().ok()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    parser.at_end().then_some(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn at_end(&self) -> bool {
        self.pos == self.tokens.len()
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Option<BigUint> {
        let Some(Token::Number(digits)) = self.peek() else {
            return None;
        };
        let n = digits.parse().ok()?;
        self.pos += 1;
        Some(n)
    }

    fn small(&mut self) -> Option<u64> {
        self.number()?.to_u64()
    }

    fn expr(&mut self) -> Option<Expr> {
        // A lone number.
        if matches!(self.peek(), Some(Token::Number(_))) && self.tokens.len() == 1 {
            return self.number().map(Expr::Plain);
        }

        let m = if matches!(self.peek(), Some(Token::Number(_))) && self.peek_second() == Some(&Token::Star) {
            let m = self.number()?;
            self.pos += 1;
            m
        } else {
            BigUint::one()
        };

        if self.eat(&Token::LParen) {
            let p = self.small()?;
            if !self.eat(&Token::Hash) || !self.eat(&Token::RParen) {
                return None;
            }
            return self.primorial_tail(m, p);
        }

        match self.peek_second() {
            Some(Token::Hash) => {
                let p = self.small()?;
                self.pos += 1;
                self.primorial_tail(m, p)
            }
            Some(Token::Caret) => {
                let base = self.number()?;
                self.pos += 1;
                let exp = u32::try_from(self.small()?).ok()?;
                if base.bits().saturating_mul(u64::from(exp)) > MAX_POWER_BITS {
                    return None;
                }
                let a = self.offset()?;
                Some(Expr::Power { m, base, exp, a })
            }
            _ => None,
        }
    }

    fn primorial_tail(&mut self, m: BigUint, p: u64) -> Option<Expr> {
        if p > MAX_PRIMORIAL || !is_prime_brute(p) {
            return None;
        }
        let d = if self.eat(&Token::Slash) {
            self.divisor(p)?
        } else {
            BigUint::one()
        };
        let a = self.offset()?;
        Some(Expr::Primorial(StandardForm { m, p, d, a }))
    }

    fn divisor(&mut self, p: u64) -> Option<BigUint> {
        if self.eat(&Token::LParen) {
            let lhs = self.divisor_term(p)?;
            if !self.eat(&Token::Star) {
                return None;
            }
            let rhs = self.divisor_term(p)?;
            return self.eat(&Token::RParen).then(|| lhs * rhs);
        }
        self.divisor_term(p)
    }

    fn divisor_term(&mut self, p: u64) -> Option<BigUint> {
        let n = self.number()?;
        if self.eat(&Token::Hash) {
            let k = n.to_u64().filter(|&k| k <= p)?;
            return Some(primorial(k));
        }
        Some(n)
    }

    /// Optional `± a`; zero when absent.
    fn offset(&mut self) -> Option<BigInt> {
        let sign = if self.eat(&Token::Plus) {
            Sign::Plus
        } else if self.eat(&Token::Minus) {
            Sign::Minus
        } else {
            return Some(BigInt::zero());
        };
        let magnitude = self.number()?;
        Some(BigInt::from_biguint(sign, magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(m: u64, p: u64, d: u64, a: i64) -> StandardForm {
        StandardForm {
            m: BigUint::from(m),
            p,
            d: BigUint::from(d),
            a: BigInt::from(a),
        }
    }

    #[test]
    fn standard_forms() {
        for (text, expected) in [
            ("5 * 7# / 3 - 13", form(5, 7, 3, -13)),
            ("5 * 7# / 3 + 13", form(5, 7, 3, 13)),
            ("5*7# / 3 - 13", form(5, 7, 3, -13)),
            ("5*7# /3-13", form(5, 7, 3, -13)),
            ("5    *7#/ 3 + 13", form(5, 7, 3, 13)),
            ("5 * (7#) / 3 - 13", form(5, 7, 3, -13)),
            ("5 * 11# / 3# - 13", form(5, 11, 6, -13)),
            ("5 * 11# / (3*2) - 13", form(5, 11, 6, -13)),
            ("5 * 11# / (7*5) - 13", form(5, 11, 35, -13)),
            ("5 * 11# / (3# * 7) - 13", form(5, 11, 42, -13)),
            ("5 * 11# / (2# * 5) - 13", form(5, 11, 10, -13)),
            ("11# / 5 - 13", form(1, 11, 5, -13)),
            ("11# / 5 + 17", form(1, 11, 5, 17)),
            ("11# / 5# + 17", form(1, 11, 30, 17)),
            ("(11#) / 5# + 17", form(1, 11, 30, 17)),
            ("31# +1", form(1, 31, 1, 1)),
            ("503# -659", form(1, 503, 1, -659)),
        ] {
            assert_eq!(parse_standard_form(text), Some(expected), "{text}");
        }
    }

    #[test]
    fn rejected_forms() {
        for text in [
            "5 * 7# / 3 + - 13",
            "-5 * 7# / 3 - 13",
            "5 * 8# / 3 - 13",
            "5 * 7# / (3 * ) - 13",
            "5 * 7# / 11# - 13",
            "5 * 7# 3",
            "7#!",
            "",
        ] {
            assert_eq!(parse_standard_form(text), None, "{text}");
        }
    }

    #[test]
    fn values() {
        let ten_700 = BigUint::from(10u32).pow(700);
        for (text, expected) in [
            ("5 * 7# / 3 - 13", Some(BigUint::from(5u32 * 7 * 5 * 2 - 13))),
            ("5 * 11# / (7*5) - 13", Some(BigUint::from(5u32 * 11 * 3 * 2 - 13))),
            ("11# / 5# + 17", Some(BigUint::from(11u32 * 7 + 17))),
            ("10^700 + 7", Some(&ten_700 + 7u32)),
            ("2 * 10^700 - 3", Some(&ten_700 * 2u32 - 3u32)),
            ("360653", Some(BigUint::from(360_653u32))),
            ("-10^700 + 7", None),
            ("123 * 155", None),
            ("250 / 125", None),
            ("2# - 3", None),
        ] {
            assert_eq!(parse(text), expected, "{text}");
        }
    }

    #[test]
    fn divisor_must_divide_primorial() {
        assert_eq!(parse("7# / 4 + 1"), None);
        assert!(parse_standard_form("7# / 4 + 1").is_some());
    }

    #[test]
    fn oversize_power_rejected() {
        assert_eq!(parse("10^100000000 + 1"), None);
    }

    #[test]
    fn display_round_trips_shape() {
        let form = parse_standard_form("5 * 11# / 3# - 13").unwrap();
        assert_eq!(form.to_string(), "5 * 11# / 6 - 13");
        let form = parse_standard_form("31# + 1").unwrap();
        assert_eq!(form.to_string(), "31# + 1");
    }

    #[test]
    fn shifted_moves_offset() {
        let form = parse_standard_form("503# - 659").unwrap();
        assert_eq!(form.shifted(600).to_string(), "503# - 59");
        assert_eq!(form.shifted(659).to_string(), "503#");
        assert_eq!(form.shifted(700).to_string(), "503# + 41");
        assert_eq!(parse(&form.shifted(700).to_string()), parse("503# + 41"));
    }
}
