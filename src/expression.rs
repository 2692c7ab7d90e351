//! Comparison and boolean expression trees.
//!
//! An [`Expression`] is an immutable value; compile it with a
//! [`Compiler`](crate::compiler::Compiler) to get SQL.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::DbalError;
use crate::types::RowValues;

/// The comparison operators understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `~=`, substring match
    Contains,
    /// `=~`, prefix match
    StartsWith,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Contains,
        Operator::StartsWith,
        Operator::Ge,
        Operator::Le,
        Operator::Gt,
        Operator::Lt,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Contains => "~=",
            Operator::StartsWith => "=~",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = DbalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DbalError::UnsupportedOperator(s.to_string()))
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(RowValues),
    List(Vec<RowValues>),
}

macro_rules! impl_operand_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Value(value.into())
                }
            }

            impl From<Vec<$ty>> for Operand {
                fn from(values: Vec<$ty>) -> Self {
                    Operand::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_operand_from!(
    RowValues,
    i64,
    i32,
    f64,
    bool,
    &str,
    String,
    chrono::NaiveDateTime,
);

/// An expression node: a single comparison or a boolean composite.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `operator` is kept as written; it is validated when the tree is compiled.
    Compare {
        operator: String,
        field: String,
        value: Operand,
    },
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Build a comparison from an operator token such as `"=="` or `"~="`.
    pub fn compare(
        operator: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        Expression::Compare {
            operator: operator.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn with_operator(
        op: Operator,
        field: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        Self::compare(op.as_str(), field, value)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Eq, field, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Ne, field, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Contains, field, value)
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::StartsWith, field, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Ge, field, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Le, field, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Gt, field, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::with_operator(Operator::Lt, field, value)
    }

    #[must_use]
    pub fn and(children: Vec<Expression>) -> Self {
        Expression::And(children)
    }

    #[must_use]
    pub fn or(children: Vec<Expression>) -> Self {
        Expression::Or(children)
    }

    #[must_use]
    pub fn not(child: Expression) -> Self {
        Expression::Not(Box::new(child))
    }

    /// Parse a condition tree in the `{"&&": [...]}` / `{"==": {"field": value}}` form.
    ///
    /// ```rust
    /// use sql_dbal::prelude::*;
    /// use serde_json::json;
    ///
    /// let expr = Expression::from_json(&json!({
    ///     "&&": [
    ///         {"==": {"status": "active"}},
    ///         {">=": {"stock": 1}}
    ///     ]
    /// }))?;
    /// assert!(matches!(expr, Expression::And(ref children) if children.len() == 2));
    /// # Ok::<(), DbalError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `DbalError::InvalidExpression` if the JSON does not describe a condition tree.
    pub fn from_json(value: &JsonValue) -> Result<Self, DbalError> {
        let JsonValue::Object(map) = value else {
            return Err(DbalError::InvalidExpression(format!(
                "expected an object, got {value}"
            )));
        };
        let mut entries = map.iter();
        let (Some((key, body)), None) = (entries.next(), entries.next()) else {
            return Err(DbalError::InvalidExpression(
                "condition objects must have exactly one key".into(),
            ));
        };

        match key.as_str() {
            "&&" => Ok(Expression::And(parse_children(key, body)?)),
            "||" => Ok(Expression::Or(parse_children(key, body)?)),
            "!" => Ok(Expression::not(Expression::from_json(body)?)),
            _ => parse_compare(key, body),
        }
    }

    /// Number of comparison leaves in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Expression::Compare { .. } => 1,
            Expression::And(children) | Expression::Or(children) => {
                children.iter().map(Expression::leaf_count).sum()
            }
            Expression::Not(child) => child.leaf_count(),
        }
    }
}

fn parse_children(key: &str, body: &JsonValue) -> Result<Vec<Expression>, DbalError> {
    let JsonValue::Array(items) = body else {
        return Err(DbalError::InvalidExpression(format!(
            "\"{key}\" expects a list of conditions"
        )));
    };
    items.iter().map(Expression::from_json).collect()
}

fn parse_compare(operator: &str, body: &JsonValue) -> Result<Expression, DbalError> {
    let JsonValue::Object(pair) = body else {
        return Err(DbalError::InvalidExpression(format!(
            "\"{operator}\" expects a {{field: value}} object"
        )));
    };
    let mut entries = pair.iter();
    let (Some((field, value)), None) = (entries.next(), entries.next()) else {
        return Err(DbalError::InvalidExpression(format!(
            "\"{operator}\" expects exactly one field"
        )));
    };

    let operand = match value {
        JsonValue::Array(items) => Operand::List(items.iter().map(RowValues::from_json).collect()),
        scalar => Operand::Value(RowValues::from_json(scalar)),
    };
    Ok(Expression::compare(operator, field.as_str(), operand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operator_tokens_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert!(matches!(
            "<>".parse::<Operator>(),
            Err(DbalError::UnsupportedOperator(token)) if token == "<>"
        ));
    }

    #[test]
    fn unknown_operator_survives_construction() {
        let expr = Expression::compare("<=>", "a", 1);
        assert!(matches!(expr, Expression::Compare { ref operator, .. } if operator == "<=>"));
    }

    #[test]
    fn parses_nested_condition_tree() {
        let expr = Expression::from_json(&json!({
            "||": [
                {"==": {"status": ["active", "pending"]}},
                {"!": {"~=": {"label": "demo"}}}
            ]
        }))
        .unwrap();

        assert_eq!(
            expr,
            Expression::or(vec![
                Expression::eq("status", vec!["active", "pending"]),
                Expression::not(Expression::contains("label", "demo")),
            ])
        );
        assert_eq!(expr.leaf_count(), 2);
    }

    #[test]
    fn rejects_malformed_trees() {
        for bad in [
            json!([1, 2]),
            json!({}),
            json!({"&&": {"a": 1}}),
            json!({"==": "status"}),
            json!({"==": {"a": 1, "b": 2}}),
            json!({"&&": [], "||": []}),
        ] {
            assert!(
                matches!(Expression::from_json(&bad), Err(DbalError::InvalidExpression(_))),
                "accepted {bad}"
            );
        }
    }
}
