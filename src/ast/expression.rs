use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Arithmetic expression over nodal variables, as written in a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),

    Literal(f64),
    /// A variable ID, written `[ID]` in the source text.
    Input(String),
}

impl Expression {
    /// Collects the variable IDs this expression reads.
    pub fn required_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expression::Input(var) => {
                vars.insert(var.clone());
            }
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r) => {
                l.required_variables(vars);
                r.required_variables(vars);
            }
            Expression::Negate(v) => v.required_variables(vars),
            Expression::Literal(_) => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Sum(l, r) => write!(f, "({l} + {r})"),
            Expression::Subtract(l, r) => write!(f, "({l} - {r})"),
            Expression::Multiply(l, r) => write!(f, "({l} * {r})"),
            Expression::Divide(l, r) => write!(f, "({l} / {r})"),
            Expression::Negate(v) => write!(f, "-{v}"),
            Expression::Literal(v) => write!(f, "{v}"),
            Expression::Input(var) => write!(f, "[{var}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::SmallerThan => "<",
            Comparator::SmallerThanOrEqual => "<=",
        }
    }

    #[inline]
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::GreaterThan => value > threshold,
            Comparator::GreaterThanOrEqual => value >= threshold,
            Comparator::SmallerThan => value < threshold,
            Comparator::SmallerThanOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Comparator::GreaterThan),
            ">=" => Ok(Comparator::GreaterThanOrEqual),
            "<" => Ok(Comparator::SmallerThan),
            "<=" => Ok(Comparator::SmallerThanOrEqual),
            other => Err(format!("unknown comparator '{other}'")),
        }
    }
}
