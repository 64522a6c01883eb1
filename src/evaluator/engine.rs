use crate::ast::Expression;
use crate::error::EvaluationError;
use ahash::AHashMap;

// This macro generates a match arm for an element-wise binary operation.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $op_fn:expr) => {
        $self.eval_binary($l, $r, $op_fn)
    };
}

/// Evaluates one expression over every mesh node of a frame at once.
pub struct FrameEngine<'a> {
    values: &'a AHashMap<String, Vec<f64>>,
    nb_nodes: usize,
}

impl<'a> FrameEngine<'a> {
    pub fn new(values: &'a AHashMap<String, Vec<f64>>, nb_nodes: usize) -> Self {
        Self { values, nb_nodes }
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Vec<f64>, EvaluationError> {
        self.evaluate_recursive(expression)
    }

    fn evaluate_recursive(&self, expr: &Expression) -> Result<Vec<f64>, EvaluationError> {
        match expr {
            Expression::Sum(l, r) => eval_op!(self, l, r, |a, b| a + b),
            Expression::Subtract(l, r) => eval_op!(self, l, r, |a, b| a - b),
            Expression::Multiply(l, r) => eval_op!(self, l, r, |a, b| a * b),
            Expression::Divide(l, r) => eval_op!(self, l, r, |a, b| a / b),
            Expression::Negate(v) => {
                let mut values = self.evaluate_recursive(v)?;
                values.iter_mut().for_each(|x| *x = -*x);
                Ok(values)
            }
            Expression::Literal(v) => Ok(vec![*v; self.nb_nodes]),
            Expression::Input(name) => {
                let values = self
                    .values
                    .get(name)
                    .ok_or_else(|| EvaluationError::InputNotFound(name.clone()))?;
                if values.len() != self.nb_nodes {
                    return Err(EvaluationError::LengthMismatch {
                        name: name.clone(),
                        expected: self.nb_nodes,
                        found: values.len(),
                    });
                }
                Ok(values.clone())
            }
        }
    }

    fn eval_binary<F>(&self, l: &Expression, r: &Expression, f: F) -> Result<Vec<f64>, EvaluationError>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut left = self.evaluate_recursive(l)?;
        let right = self.evaluate_recursive(r)?;
        left.iter_mut().zip(right).for_each(|(a, b)| *a = f(*a, b));
        Ok(left)
    }
}
