//! Unit expressions
//!
//! Parses expressions such as `mA`, `ml/minute`, `mA/cm^2` or `K/minute` into a
//! dimension vector. Only dimensional compatibility is checked; values keep the
//! unit they were given in.

use std::fmt;

/// Exponents over (length, mass, time, current, temperature, amount, angle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension([i8; 7]);

impl Dimension {
    const LENGTH: usize = 0;
    const MASS: usize = 1;
    const TIME: usize = 2;
    const CURRENT: usize = 3;
    const TEMPERATURE: usize = 4;
    const AMOUNT: usize = 5;
    const ANGLE: usize = 6;

    pub fn dimensionless() -> Self {
        Self::default()
    }

    fn base(axis: usize) -> Self {
        let mut d = [0i8; 7];
        d[axis] = 1;
        Self(d)
    }

    fn of(pairs: &[(usize, i8)]) -> Self {
        let mut d = [0i8; 7];
        for (axis, exp) in pairs {
            d[*axis] += exp;
        }
        Self(d)
    }

    /// `None` when an exponent leaves the `i8` range.
    fn mul(self, other: Self, sign: i8) -> Option<Self> {
        let mut d = self.0;
        for (v, exp) in d.iter_mut().zip(other.0) {
            *v = v.checked_add(exp.checked_mul(sign)?)?;
        }
        Some(Self(d))
    }

    fn pow(self, exp: i8) -> Option<Self> {
        let mut d = self.0;
        for v in d.iter_mut() {
            *v = v.checked_mul(exp)?;
        }
        Some(Self(d))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 7] = ["L", "M", "T", "I", "Θ", "N", "rad"];
        let parts: Vec<String> = self
            .0
            .iter()
            .zip(NAMES)
            .filter(|(exp, _)| **exp != 0)
            .map(|(exp, name)| format!("{}^{}", name, exp))
            .collect();
        if parts.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// Dimension of a named unit without prefix handling.
fn named_unit(symbol: &str) -> Option<Dimension> {
    use Dimension as D;
    let d = match symbol {
        "m" | "meter" | "angstrom" | "Å" => D::base(D::LENGTH),
        "g" | "gram" => D::base(D::MASS),
        "s" | "sec" | "second" | "min" | "minute" | "h" | "hour" | "d" | "day" => {
            D::base(D::TIME)
        }
        "A" | "ampere" => D::base(D::CURRENT),
        "K" | "kelvin" | "°C" | "degC" | "celsius" | "degree_Celsius" => {
            D::base(D::TEMPERATURE)
        }
        "mol" => D::base(D::AMOUNT),
        "degree" | "deg" | "°" | "rad" => D::base(D::ANGLE),
        "rpm" => D::of(&[(D::ANGLE, 1), (D::TIME, -1)]),
        "Hz" => D::of(&[(D::TIME, -1)]),
        "l" | "L" | "liter" => D::of(&[(D::LENGTH, 3)]),
        "M" | "molar" => D::of(&[(D::AMOUNT, 1), (D::LENGTH, -3)]),
        "N" | "newton" => D::of(&[(D::MASS, 1), (D::LENGTH, 1), (D::TIME, -2)]),
        "Pa" | "bar" | "Torr" | "torr" | "atm" => {
            D::of(&[(D::MASS, 1), (D::LENGTH, -1), (D::TIME, -2)])
        }
        "J" | "eV" => D::of(&[(D::MASS, 1), (D::LENGTH, 2), (D::TIME, -2)]),
        "W" => D::of(&[(D::MASS, 1), (D::LENGTH, 2), (D::TIME, -3)]),
        "C" => D::of(&[(D::CURRENT, 1), (D::TIME, 1)]),
        "V" => D::of(&[(D::MASS, 1), (D::LENGTH, 2), (D::TIME, -3), (D::CURRENT, -1)]),
        "ohm" | "Ω" => D::of(&[(D::MASS, 1), (D::LENGTH, 2), (D::TIME, -3), (D::CURRENT, -2)]),
        "%" | "percent" | "dimensionless" => D::dimensionless(),
        _ => return None,
    };
    Some(d)
}

const PREFIXES: [&str; 11] = ["p", "n", "u", "µ", "m", "c", "d", "h", "k", "M", "G"];

/// Dimension of a single unit symbol, allowing one SI prefix.
fn unit_symbol(symbol: &str) -> Option<Dimension> {
    if let Some(d) = named_unit(symbol) {
        return Some(d);
    }
    PREFIXES.iter().find_map(|prefix| {
        symbol
            .strip_prefix(prefix)
            .filter(|rest| !rest.is_empty())
            .and_then(named_unit)
    })
}

fn factor(token: &str) -> Option<Dimension> {
    let token = token.trim();
    let (symbol, exp) = match token.split_once("**").or_else(|| token.split_once('^')) {
        Some((symbol, exp)) => (symbol.trim(), exp.trim().parse::<i8>().ok()?),
        None => (token, 1),
    };
    if symbol == "1" {
        return Some(Dimension::dimensionless());
    }
    unit_symbol(symbol)?.pow(exp)
}

/// Parse a unit expression. Returns `None` for unknown symbols.
pub fn parse(expr: &str) -> Option<Dimension> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }
    let mut result = Dimension::dimensionless();
    let mut sign = 1i8;
    let mut token = String::new();
    let mut chars = expr.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                token.push_str("**");
            }
            '*' | '/' | ' ' => {
                if !token.trim().is_empty() {
                    result = result.mul(factor(&token)?, sign)?;
                }
                token.clear();
                if c == '/' {
                    sign = -1;
                } else if c == '*' {
                    sign = 1;
                }
            }
            _ => token.push(c),
        }
    }
    if token.trim().is_empty() {
        return None;
    }
    result.mul(factor(&token)?, sign)
}

/// Whether two unit expressions measure the same dimension.
pub fn compatible(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}
