//! Named row predicates
//!
//! A predicate is a boolean rule over a single row's field values. Two kinds
//! exist:
//! - comparison: declarative `left <op> right [* factor]`, loadable from JSON
//! - custom: a shared closure registered programmatically
//!
//! Comparisons may scale their right operand by a constant or by a schema
//! parameter whose value comes from the data set being checked.
//!
//! Evaluation never raises. A predicate answers with an explicit
//! [`PredicateOutcome`]; operands that cannot be compared are rejected with
//! a message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::parameters::Parameters;
use crate::data::Cell;

/// Result of evaluating a predicate against one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateOutcome {
    /// The row satisfies the rule
    Accepted,
    /// The row violates the rule, optionally with an explanation
    Rejected { message: Option<String> },
}

impl PredicateOutcome {
    /// Rejection carrying a message
    pub fn rejected(message: impl Into<String>) -> Self {
        PredicateOutcome::Rejected {
            message: Some(message.into()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PredicateOutcome::Accepted)
    }

    /// Returns the rejection message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            PredicateOutcome::Rejected { message } => message.as_deref(),
            PredicateOutcome::Accepted => None,
        }
    }
}

impl From<bool> for PredicateOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            PredicateOutcome::Accepted
        } else {
            PredicateOutcome::Rejected { message: None }
        }
    }
}

/// How failures of a predicate are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureResponse {
    /// Report only the offending rows
    #[default]
    Boolean,
    /// Report each offending row with its rejection message
    ErrorMessage,
}

/// Read-only view of one row, aligned to its table's field order
#[derive(Debug, Clone, Copy)]
pub struct RowView<'r> {
    fields: &'r [String],
    values: &'r [Cell],
    parameters: Option<&'r Parameters>,
}

impl<'r> RowView<'r> {
    /// `fields` and `values` must be the same length.
    pub fn new(fields: &'r [String], values: &'r [Cell]) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self {
            fields,
            values,
            parameters: None,
        }
    }

    /// Makes the data set's resolved parameters visible to predicates
    pub fn with_parameters(mut self, parameters: &'r Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Returns a parameter's resolved value
    pub fn parameter(&self, name: &str) -> Option<&'r Cell> {
        self.parameters.and_then(|p| p.get(name))
    }

    /// Returns a field's value
    pub fn get(&self, field: &str) -> Option<&'r Cell> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| &self.values[i])
    }

    /// Returns a field's numeric value; `None` if absent or not a number
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Cell::as_number)
    }

    /// Returns a field's text value; `None` if absent or not a string
    pub fn text(&self, field: &str) -> Option<&'r str> {
        self.get(field).and_then(Cell::as_text)
    }

    /// Iterates `(field, value)` in table order
    pub fn iter(&self) -> impl Iterator<Item = (&'r str, &'r Cell)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Comparison operators for declarative predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }

    /// True when `x op x` holds for every x
    pub fn is_reflexive(&self) -> bool {
        matches!(self, CompareOp::Le | CompareOp::Ge | CompareOp::Eq)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a comparison: a numeric constant or another field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Constant(#[serde(with = "super::types::bound")] f64),
    Field(String),
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Constant(n)
    }
}

impl From<&str> for Operand {
    fn from(field: &str) -> Self {
        Operand::Field(field.to_string())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(c) => write!(f, "{}", Cell::Number(*c)),
            Operand::Field(name) => write!(f, "{}", name),
        }
    }
}

/// Multiplier applied to the right operand of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Factor {
    Constant(#[serde(with = "super::types::bound")] f64),
    /// The value of a schema parameter, resolved per data set
    Parameter { parameter: String },
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Constant(c) => write!(f, "{}", Cell::Number(*c)),
            Factor::Parameter { parameter } => write!(f, "parameter '{}'", parameter),
        }
    }
}

/// Static classification of a predicate, decided when the schema is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triviality {
    /// Must be evaluated per row
    Evaluated,
    /// Holds for every row; never evaluated or reported
    Tautology,
    /// Can never hold; rejected as a schema error
    Contradiction,
}

/// Declarative `left <op> right * factor` rule over numeric fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: String,
    pub op: CompareOp,
    pub right: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<Factor>,
}

impl Comparison {
    pub fn new(left: impl Into<String>, op: CompareOp, right: impl Into<Operand>) -> Self {
        Self {
            left: left.into(),
            op,
            right: right.into(),
            factor: None,
        }
    }

    /// Multiplies the right operand by `factor` before comparing
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(Factor::Constant(factor));
        self
    }

    /// Multiplies the right operand by the named parameter's value
    pub fn with_parameter_factor(mut self, parameter: impl Into<String>) -> Self {
        self.factor = Some(Factor::Parameter {
            parameter: parameter.into(),
        });
        self
    }

    /// The parameter this comparison reads, if any
    pub fn referenced_parameter(&self) -> Option<&str> {
        match &self.factor {
            Some(Factor::Parameter { parameter }) => Some(parameter),
            _ => None,
        }
    }

    /// Fields this comparison reads
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.left.as_str()];
        if let Operand::Field(f) = &self.right {
            fields.push(f.as_str());
        }
        fields
    }

    pub fn triviality(&self) -> Triviality {
        let unscaled = match &self.factor {
            None => true,
            Some(Factor::Constant(c)) => *c == 1.0,
            Some(Factor::Parameter { .. }) => false,
        };
        match &self.right {
            Operand::Field(f) if *f == self.left && unscaled => {
                if self.op.is_reflexive() {
                    Triviality::Tautology
                } else {
                    Triviality::Contradiction
                }
            }
            _ => Triviality::Evaluated,
        }
    }

    pub fn evaluate(&self, row: &RowView<'_>) -> PredicateOutcome {
        let left = match operand_number(row, &self.left) {
            Ok(n) => n,
            Err(outcome) => return outcome,
        };
        let right = match &self.right {
            Operand::Constant(c) => *c,
            Operand::Field(f) => match operand_number(row, f) {
                Ok(n) => n,
                Err(outcome) => return outcome,
            },
        };
        let factor = match &self.factor {
            None => 1.0,
            Some(Factor::Constant(c)) => *c,
            Some(Factor::Parameter { parameter }) => match row.parameter(parameter) {
                Some(Cell::Number(n)) => *n,
                Some(other) => {
                    return PredicateOutcome::rejected(format!(
                        "parameter '{}' is not numeric (got {} {})",
                        parameter,
                        other.type_name(),
                        other
                    ))
                }
                None => {
                    return PredicateOutcome::rejected(format!(
                        "parameter '{}' is not available",
                        parameter
                    ))
                }
            },
        };
        let right = right * factor;

        if self.op.holds(left, right) {
            PredicateOutcome::Accepted
        } else {
            PredicateOutcome::rejected(format!(
                "{} of {} is not {} {} of {}",
                self.left,
                Cell::Number(left),
                self.op,
                self.right,
                Cell::Number(right)
            ))
        }
    }
}

fn operand_number(row: &RowView<'_>, field: &str) -> Result<f64, PredicateOutcome> {
    match row.get(field) {
        Some(Cell::Number(n)) => Ok(*n),
        Some(other) => Err(PredicateOutcome::rejected(format!(
            "field '{}' is not numeric (got {} {})",
            field,
            other.type_name(),
            other
        ))),
        None => Err(PredicateOutcome::rejected(format!(
            "field '{}' is not present",
            field
        ))),
    }
}

type PredicateFn = dyn Fn(&RowView<'_>) -> PredicateOutcome + Send + Sync;

/// A shared, thread-safe predicate closure
#[derive(Clone)]
pub struct CustomPredicate(Arc<PredicateFn>);

impl CustomPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RowView<'_>) -> PredicateOutcome + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, row: &RowView<'_>) -> PredicateOutcome {
        (self.0)(row)
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPredicate(<fn>)")
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What a predicate checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Comparison(Comparison),
    /// Closures exist only in memory; schemas holding them cannot be saved.
    #[serde(skip)]
    Custom(CustomPredicate),
}

/// A named row-level rule attached to a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPredicate {
    pub name: String,
    pub check: PredicateKind,
    #[serde(default)]
    pub failure_response: FailureResponse,
}

impl RowPredicate {
    /// Declarative comparison predicate
    pub fn comparison(name: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            name: name.into(),
            check: PredicateKind::Comparison(comparison),
            failure_response: FailureResponse::Boolean,
        }
    }

    /// Closure predicate
    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RowView<'_>) -> PredicateOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: PredicateKind::Custom(CustomPredicate::new(f)),
            failure_response: FailureResponse::Boolean,
        }
    }

    /// Report rejection messages alongside offending rows
    pub fn with_error_messages(mut self) -> Self {
        self.failure_response = FailureResponse::ErrorMessage;
        self
    }

    pub fn triviality(&self) -> Triviality {
        match &self.check {
            PredicateKind::Comparison(c) => c.triviality(),
            PredicateKind::Custom(_) => Triviality::Evaluated,
        }
    }

    pub fn evaluate(&self, row: &RowView<'_>) -> PredicateOutcome {
        match &self.check {
            PredicateKind::Comparison(c) => c.evaluate(row),
            PredicateKind::Custom(f) => f.call(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<String> {
        vec!["Name".into(), "Min Nutrition".into(), "Max Nutrition".into()]
    }

    fn min_max() -> Comparison {
        Comparison::new("Max Nutrition", CompareOp::Ge, "Min Nutrition")
    }

    #[test]
    fn test_min_max_comparison() {
        let fields = fields();
        let good = vec![Cell::from("protein"), Cell::from(91), Cell::from(200)];
        let bad = vec![Cell::from("fat"), Cell::from(70), Cell::from(65)];

        assert!(min_max().evaluate(&RowView::new(&fields, &good)).is_accepted());
        let outcome = min_max().evaluate(&RowView::new(&fields, &bad));
        assert!(!outcome.is_accepted());
        assert!(outcome.message().unwrap().contains("65"));
    }

    #[test]
    fn test_factor_scales_right_operand() {
        let fields = fields();
        let values = vec![Cell::from("fat"), Cell::from(70), Cell::from(65)];
        let scaled = min_max().with_factor(0.5);
        assert!(scaled.evaluate(&RowView::new(&fields, &values)).is_accepted());
    }

    #[test]
    fn test_non_numeric_operand_rejected_with_message() {
        let fields = fields();
        let values = vec![Cell::from("fat"), Cell::from(""), Cell::from(65)];
        let outcome = min_max().evaluate(&RowView::new(&fields, &values));
        assert!(outcome.message().unwrap().contains("Min Nutrition"));
    }

    #[test]
    fn test_triviality() {
        assert_eq!(min_max().triviality(), Triviality::Evaluated);
        assert_eq!(
            Comparison::new("x", CompareOp::Ge, "x").triviality(),
            Triviality::Tautology
        );
        assert_eq!(
            Comparison::new("x", CompareOp::Lt, "x").triviality(),
            Triviality::Contradiction
        );
        assert_eq!(
            Comparison::new("x", CompareOp::Ge, "x").with_factor(2.0).triviality(),
            Triviality::Evaluated
        );
        assert_eq!(
            Comparison::new("x", CompareOp::Gt, 0.0).triviality(),
            Triviality::Evaluated
        );
    }

    #[test]
    fn test_custom_predicate() {
        let pred = RowPredicate::custom("Has Name", |row| {
            (row.text("Name").map_or(false, |s| !s.is_empty())).into()
        });
        let fields = fields();
        let values = vec![Cell::from(""), Cell::from(1), Cell::from(2)];
        assert!(!pred.evaluate(&RowView::new(&fields, &values)).is_accepted());
    }

    #[test]
    fn test_comparison_from_json() {
        let pred: RowPredicate = serde_json::from_value(json!({
            "name": "Min Max Check",
            "check": {"comparison": {"left": "Max Nutrition", "op": ">=", "right": "Min Nutrition"}},
            "failure_response": "error_message"
        }))
        .unwrap();
        assert_eq!(pred.failure_response, FailureResponse::ErrorMessage);
        assert_eq!(pred.check, PredicateKind::Comparison(min_max()));

        let constant: Comparison =
            serde_json::from_value(json!({"left": "Cost", "op": "<", "right": 100})).unwrap();
        assert_eq!(constant.right, Operand::Constant(100.0));
    }

    #[test]
    fn test_parameter_factor() {
        let fields = fields();
        let values = vec![Cell::from("fat"), Cell::from(70), Cell::from(65)];
        let scaled = min_max().with_parameter_factor("Adjustment");
        assert_eq!(scaled.triviality(), Triviality::Evaluated);
        assert_eq!(scaled.referenced_parameter(), Some("Adjustment"));

        let half = Parameters::from_iter([("Adjustment", Cell::from(0.5))]);
        let view = RowView::new(&fields, &values).with_parameters(&half);
        assert!(scaled.evaluate(&view).is_accepted());

        let missing = scaled.evaluate(&RowView::new(&fields, &values));
        assert!(missing.message().unwrap().contains("not available"));

        let text = Parameters::from_iter([("Adjustment", Cell::from("half"))]);
        let view = RowView::new(&fields, &values).with_parameters(&text);
        assert!(scaled.evaluate(&view).message().unwrap().contains("not numeric"));
    }

    #[test]
    fn test_infinite_constants_survive_json() {
        let cmp = Comparison::new("Cost", CompareOp::Lt, f64::INFINITY).with_factor(f64::INFINITY);
        let value = serde_json::to_value(&cmp).unwrap();
        assert_eq!(value["right"], json!("inf"));
        let back: Comparison = serde_json::from_value(value).unwrap();
        assert_eq!(back, cmp);

        let param: Comparison = serde_json::from_value(json!({
            "left": "Max Nutrition", "op": ">=", "right": "Min Nutrition",
            "factor": {"parameter": "Adjustment"}
        }))
        .unwrap();
        assert_eq!(param.referenced_parameter(), Some("Adjustment"));
    }

    #[test]
    fn test_custom_predicate_is_not_serializable() {
        let pred = RowPredicate::custom("any", |_| PredicateOutcome::Accepted);
        assert!(serde_json::to_string(&pred).is_err());
    }
}
