//! SI units with runtime scale factors.
//!
//! A [`ScaledUnit`] is a scale factor times a product of powers of the seven
//! SI base dimensions. Literals are products and quotients of prefixed
//! symbols with optional integer powers, e.g. `"km/h"`, `"kg*m/s^2"`,
//! `"(m*s)^-1"`. Two units are equal when their scales and exponents agree,
//! regardless of how they were spelled.

use std::fmt;

use super::UnitSystem;
use crate::error::{DimsError, Result};

const BASE_SYMBOLS: [&str; 7] = ["m", "kg", "s", "A", "K", "mol", "cd"];

type Exponents = [i32; 7];

const NONE: Exponents = [0; 7];
const LENGTH: Exponents = [1, 0, 0, 0, 0, 0, 0];
const MASS: Exponents = [0, 1, 0, 0, 0, 0, 0];
const TIME: Exponents = [0, 0, 1, 0, 0, 0, 0];
const CURRENT: Exponents = [0, 0, 0, 1, 0, 0, 0];
const TEMPERATURE: Exponents = [0, 0, 0, 0, 1, 0, 0];
const AMOUNT: Exponents = [0, 0, 0, 0, 0, 1, 0];
const LUMINOSITY: Exponents = [0, 0, 0, 0, 0, 0, 1];

/// Symbols that accept an SI prefix: (symbol, scale, exponents).
const PREFIXABLE: &[(&str, f64, Exponents)] = &[
    ("m", 1.0, LENGTH),
    ("g", 1e-3, MASS),
    ("s", 1.0, TIME),
    ("A", 1.0, CURRENT),
    ("K", 1.0, TEMPERATURE),
    ("mol", 1.0, AMOUNT),
    ("cd", 1.0, LUMINOSITY),
    ("Hz", 1.0, [0, 0, -1, 0, 0, 0, 0]),
    ("N", 1.0, [1, 1, -2, 0, 0, 0, 0]),
    ("J", 1.0, [2, 1, -2, 0, 0, 0, 0]),
    ("W", 1.0, [2, 1, -3, 0, 0, 0, 0]),
];

/// Symbols that never take a prefix.
const PLAIN: &[(&str, f64, Exponents)] = &[
    ("min", 60.0, TIME),
    ("h", 3600.0, TIME),
    ("dimensionless", 1.0, NONE),
];

const PREFIXES: &[(&str, f64)] = &[
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
];

/// A unit with a scale factor relative to the SI base units.
#[derive(Debug, Clone)]
pub struct ScaledUnit {
    scale: f64,
    exponents: Exponents,
    symbol: String,
}

impl ScaledUnit {
    pub fn dimensionless() -> Self {
        Self {
            scale: 1.0,
            exponents: NONE,
            symbol: String::new(),
        }
    }

    /// Returns the factor relative to the SI base units.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the powers of m, kg, s, A, K, mol and cd.
    pub fn exponents(&self) -> &[i32; 7] {
        &self.exponents
    }

    /// Returns the spelling this unit was built from.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents == NONE && scales_equal(self.scale, 1.0)
    }

    fn powi(&self, power: i32) -> Result<Self> {
        let mut exponents = self.exponents;
        for e in exponents.iter_mut() {
            *e = e.checked_mul(power).ok_or_else(|| overflow(&self.symbol))?;
        }
        Ok(Self {
            scale: self.scale.powi(power),
            exponents,
            symbol: format!("{}^{}", wrap(&self.symbol), power),
        })
    }

    fn combine(&self, other: &Self, sign: i32, symbol: String) -> Result<Self> {
        let mut exponents = self.exponents;
        for (e, o) in exponents.iter_mut().zip(other.exponents.iter()) {
            *e = o
                .checked_mul(sign)
                .and_then(|o| e.checked_add(o))
                .ok_or_else(|| overflow(&symbol))?;
        }
        let scale = if sign > 0 {
            self.scale * other.scale
        } else {
            self.scale / other.scale
        };
        Ok(Self {
            scale,
            exponents,
            symbol,
        })
    }
}

impl PartialEq for ScaledUnit {
    fn eq(&self, other: &Self) -> bool {
        self.exponents == other.exponents && scales_equal(self.scale, other.scale)
    }
}

impl fmt::Display for ScaledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            f.write_str("dimensionless")
        } else {
            f.write_str(&self.symbol)
        }
    }
}

/// The SI unit system.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledUnits;

impl UnitSystem for ScaledUnits {
    type Unit = ScaledUnit;

    fn parse(&self, literal: &str) -> Result<ScaledUnit> {
        let text: String = literal.chars().filter(|c| !c.is_whitespace()).collect();
        if text.is_empty() {
            return Ok(ScaledUnit::dimensionless());
        }
        let mut parser = Parser {
            text: &text,
            pos: 0,
        };
        let mut unit = parser.expr()?;
        if parser.pos != text.len() {
            return Err(parse_error(literal));
        }
        unit.symbol = text;
        Ok(unit)
    }

    fn dimensionless(&self) -> ScaledUnit {
        ScaledUnit::dimensionless()
    }

    fn multiply(&self, a: &ScaledUnit, b: &ScaledUnit) -> Result<ScaledUnit> {
        let symbol = match (a.symbol.is_empty(), b.symbol.is_empty()) {
            (_, true) => a.symbol.clone(),
            (true, false) => b.symbol.clone(),
            (false, false) => format!("{}*{}", wrap(&a.symbol), wrap(&b.symbol)),
        };
        a.combine(b, 1, symbol)
    }

    fn divide(&self, a: &ScaledUnit, b: &ScaledUnit) -> Result<ScaledUnit> {
        let symbol = if b.symbol.is_empty() {
            a.symbol.clone()
        } else if a == b {
            String::new()
        } else {
            let numerator = if a.symbol.is_empty() { "1" } else { a.symbol.as_str() };
            format!("{}/{}", wrap(numerator), wrap(&b.symbol))
        };
        a.combine(b, -1, symbol)
    }

    fn get_scale(&self, src: &ScaledUnit, dst: &ScaledUnit) -> Result<f64> {
        if src.exponents != dst.exponents {
            return Err(DimsError::units(format!(
                "Cannot convert from '{}' [{}] to '{}' [{}]",
                src,
                describe(&src.exponents),
                dst,
                describe(&dst.exponents)
            )));
        }
        Ok(src.scale / dst.scale)
    }
}

fn scales_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

fn wrap(symbol: &str) -> String {
    if symbol.contains(['*', '/', '^']) {
        format!("({})", symbol)
    } else {
        symbol.to_string()
    }
}

fn describe(exponents: &Exponents) -> String {
    let parts: Vec<String> = BASE_SYMBOLS
        .iter()
        .zip(exponents.iter())
        .filter(|(_, &e)| e != 0)
        .map(|(s, &e)| if e == 1 { s.to_string() } else { format!("{}^{}", s, e) })
        .collect();
    if parts.is_empty() {
        "1".to_string()
    } else {
        parts.join("*")
    }
}

fn parse_error(literal: &str) -> DimsError {
    DimsError::units(format!("Unrecognized unit '{}'", literal))
}

fn overflow(symbol: &str) -> DimsError {
    DimsError::units(format!("Unit exponent overflow in '{}'", symbol))
}

fn lookup_symbol(symbol: &str) -> Option<ScaledUnit> {
    let make = |scale: f64, exponents: Exponents| ScaledUnit {
        scale,
        exponents,
        symbol: symbol.to_string(),
    };
    for (name, scale, exponents) in PLAIN.iter().chain(PREFIXABLE.iter()) {
        if *name == symbol {
            return Some(make(*scale, *exponents));
        }
    }
    for (prefix, factor) in PREFIXES {
        if let Some(rest) = symbol.strip_prefix(prefix) {
            if let Some((_, scale, exponents)) = PREFIXABLE.iter().find(|(n, _, _)| *n == rest) {
                return Some(make(factor * scale, *exponents));
            }
        }
    }
    None
}

/// Recursive-descent parser over `expr := power (('*' | '/') power)*`,
/// `power := atom ('^' int)?`, `atom := '(' expr ')' | '1' | symbol`.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn expr(&mut self) -> Result<ScaledUnit> {
        let mut unit = self.power()?;
        while let Some(op) = self.peek() {
            if op != '*' && op != '/' {
                break;
            }
            self.bump(op);
            let rhs = self.power()?;
            let sign = if op == '*' { 1 } else { -1 };
            unit = unit.combine(&rhs, sign, self.text.to_string())?;
        }
        Ok(unit)
    }

    fn power(&mut self) -> Result<ScaledUnit> {
        let atom = self.atom()?;
        if self.peek() != Some('^') {
            return Ok(atom);
        }
        self.bump('^');
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump('-');
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let power: i32 = self.text[start..self.pos]
            .parse()
            .map_err(|_| parse_error(self.text))?;
        atom.powi(power)
    }

    fn atom(&mut self) -> Result<ScaledUnit> {
        match self.peek() {
            Some('(') => {
                self.bump('(');
                let inner = self.expr()?;
                if self.peek() != Some(')') {
                    return Err(parse_error(self.text));
                }
                self.bump(')');
                Ok(inner)
            }
            Some('1') => {
                self.bump('1');
                Ok(ScaledUnit::dimensionless())
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_alphabetic() {
                        self.bump(c);
                    } else {
                        break;
                    }
                }
                let symbol = &self.text[start..self.pos];
                lookup_symbol(symbol).ok_or_else(|| parse_error(symbol))
            }
        }
    }
}
