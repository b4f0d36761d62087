//! Arithmetic evaluator behind the `calculate` tool.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "//") unary)*
//! unary   := ("+" | "-") unary | power
//! power   := primary ("**" unary)?
//! primary := number | "(" expr ")"
//! ```

/// Characters accepted in an expression.
pub const ALLOWED_CHARS: &str = "0123456789+-*/.() ";

/// Deepest nesting of parentheses, signs and exponents accepted.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("expression contains characters other than digits, operators and parentheses")]
    InvalidCharacters,

    #[error("empty expression")]
    Empty,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("unexpected `{found}` at position {position}")]
    Unexpected { found: char, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression nests deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Evaluate `expression` with the usual precedence rules.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if !expression.chars().all(|c| ALLOWED_CHARS.contains(c)) {
        return Err(CalcError::InvalidCharacters);
    }
    let chars: Vec<char> = expression.chars().collect();
    if chars.iter().all(|c| *c == ' ') {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        chars,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(found) => Err(CalcError::Unexpected {
            found,
            position: parser.pos,
        }),
    }
}

/// Render a result: whole numbers without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        // Normalizes -0 to 0.
        format!("{:.0}", value + 0.0)
    } else {
        format!("{value}")
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Next non-space character.
    fn peek(&mut self) -> Option<char> {
        while self.chars.get(self.pos) == Some(&' ') {
            self.pos += 1;
        }
        self.chars.get(self.pos).copied()
    }

    /// Raw character `offset` places after the cursor.
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == '+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some('*'), Some('*')) => break,
                (Some('*'), _) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                (Some('/'), Some('/')) => {
                    self.pos += 2;
                    let rhs = self.unary()?;
                    value = divide(value, rhs)?.floor();
                }
                (Some('/'), _) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    value = divide(value, rhs)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Every recursive rule passes through here, so `depth` bounds the stack.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth == MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some('+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some('*') && self.peek_at(1) == Some('*') {
            self.pos += 2;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(found) => Err(CalcError::Unexpected {
                        found,
                        position: self.pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(found) => Err(CalcError::Unexpected {
                found,
                position: self.pos,
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while let Some(c) = self.peek_at(0)
            && (c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().map_err(|_| CalcError::InvalidNumber(text))
    }
}

fn divide(lhs: f64, rhs: f64) -> Result<f64, CalcError> {
    if rhs == 0.0 {
        return Err(CalcError::DivisionByZero);
    }
    Ok(lhs / rhs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("100 / 10 / 5").unwrap(), 2.0);
    }

    #[test]
    fn unary_minus_and_nesting() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("-(2 * (3 + 1))").unwrap(), -8.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
    }

    #[test]
    fn power_and_floor_division() {
        assert_eq!(evaluate("2 ** 10").unwrap(), 1024.0);
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
        assert_eq!(evaluate("7 // 2").unwrap(), 3.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("1.5 * 4").unwrap(), 6.0);
        assert_eq!(evaluate(".5 + .25").unwrap(), 0.75);
    }

    #[test]
    fn rejects_foreign_characters() {
        assert_eq!(evaluate("2 + x"), Err(CalcError::InvalidCharacters));
        assert_eq!(evaluate("__import__('os')"), Err(CalcError::InvalidCharacters));
    }

    #[test]
    fn reports_division_by_zero() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 // (2 - 2)"), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn reports_syntax_errors() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("1 +"), Err(CalcError::UnexpectedEnd));
        assert!(matches!(
            evaluate("1 2"),
            Err(CalcError::Unexpected { found: '2', .. })
        ));
        assert!(matches!(evaluate("1..2"), Err(CalcError::InvalidNumber(_))));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(evaluate(&parens), Err(CalcError::TooDeep));
        assert_eq!(evaluate(&format!("{}1", "-".repeat(20_000))), Err(CalcError::TooDeep));
        assert_eq!(evaluate(&format!("{}1", "2**".repeat(5_000))), Err(CalcError::TooDeep));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let parens = format!("{}7{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(evaluate(&parens).unwrap(), 7.0);
        assert_eq!(evaluate("--3").unwrap(), 3.0);
    }

    #[test]
    fn formats_whole_numbers_without_fraction() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-8.0), "-8");
    }
}
