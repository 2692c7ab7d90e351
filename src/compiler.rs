//! Expression → SQL predicate compilation.
//!
//! The operator table and the depth-first walk are shared by every dialect; the
//! [`Dialect`] supplies quoting, wildcard escaping and constant predicates.
//!
//! ```rust
//! use sql_dbal::prelude::*;
//!
//! let compiler = Compiler::new(&Postgres);
//! let compiled = compiler.compile(&Expression::eq("status", vec!["active", "pending"]))?;
//! assert_eq!(compiled.sql, "status IN (?,?)");
//! assert_eq!(compiled.params.len(), compiled.placeholder_count());
//! # Ok::<(), DbalError>(())
//! ```

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::DbalError;
use crate::expression::{Expression, Operand, Operator};
use crate::translation::count_placeholders;
use crate::types::RowValues;

lazy_static! {
    static ref SAFE_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*){0,2}$")
            .expect("identifier pattern is valid");
}

/// Whether `name` is a plain (optionally `schema.table.column` dotted) identifier.
#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    SAFE_IDENTIFIER.is_match(name)
}

/// Translation from logical field names to column names.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    columns: HashMap<String, String>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.insert(name, column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: impl Into<String>) {
        self.columns.insert(name.into(), column.into());
    }

    /// The mapped column, or the name itself when it has no mapping.
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.columns.get(name).map_or(name, String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// SQL predicate with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub sql: String,
    pub params: Vec<RowValues>,
}

impl CompiledPredicate {
    /// Placeholders in `sql`; always equal to `params.len()`.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<RowValues>) {
        (self.sql, self.params)
    }
}

pub struct Compiler<'d> {
    dialect: &'d dyn Dialect,
    fields: FieldMap,
    quote_identifiers: bool,
}

impl<'d> Compiler<'d> {
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            fields: FieldMap::default(),
            quote_identifiers: false,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    /// Quote every column with the dialect's identifier quotes.
    #[must_use]
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Compile an expression tree.
    ///
    /// Parameters are collected in left-to-right, depth-first order.
    ///
    /// # Errors
    /// `UnsupportedOperator` for an unknown operator token, `InvalidField` for a field that
    /// does not resolve to a safe identifier, `InvalidValue` for a value the operator
    /// cannot compare against. Nothing is returned on error.
    pub fn compile(&self, expr: &Expression) -> Result<CompiledPredicate, DbalError> {
        let mut out = CompiledPredicate {
            sql: String::new(),
            params: Vec::new(),
        };
        self.render(expr, &mut out)?;
        tracing::trace!(
            dialect = self.dialect.name(),
            sql = %out.sql,
            params = out.params.len(),
            "compiled predicate"
        );
        Ok(out)
    }

    fn render(&self, expr: &Expression, out: &mut CompiledPredicate) -> Result<(), DbalError> {
        match expr {
            Expression::Compare {
                operator,
                field,
                value,
            } => {
                let op: Operator = operator.parse()?;
                let column = self.column(field)?;
                match op {
                    Operator::Eq | Operator::Ne => {
                        self.render_equality(&column, op == Operator::Ne, value, out);
                        Ok(())
                    }
                    Operator::Contains | Operator::StartsWith => {
                        self.render_like(&column, op, value, out)
                    }
                    Operator::Ge | Operator::Le | Operator::Gt | Operator::Lt => {
                        render_ordering(&column, op, value, out)
                    }
                }
            }
            Expression::And(children) => self.render_joined(children, "AND", true, out),
            Expression::Or(children) => self.render_joined(children, "OR", false, out),
            Expression::Not(child) => {
                let mark = out.sql.len();
                self.render(child, out)?;
                let inner = out.sql.split_off(mark);
                if inner.starts_with('(') {
                    out.sql.push_str("NOT ");
                    out.sql.push_str(&inner);
                } else {
                    out.sql.push_str("NOT (");
                    out.sql.push_str(&inner);
                    out.sql.push(')');
                }
                Ok(())
            }
        }
    }

    fn render_joined(
        &self,
        children: &[Expression],
        joiner: &str,
        empty_value: bool,
        out: &mut CompiledPredicate,
    ) -> Result<(), DbalError> {
        if children.is_empty() {
            out.sql.push_str(self.dialect.bool_literal(empty_value));
            return Ok(());
        }
        out.sql.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.sql.push(' ');
                out.sql.push_str(joiner);
                out.sql.push(' ');
            }
            self.render(child, out)?;
        }
        out.sql.push(')');
        Ok(())
    }

    fn column(&self, field: &str) -> Result<String, DbalError> {
        let resolved = self.fields.resolve(field);
        if !is_safe_identifier(resolved) {
            return Err(DbalError::InvalidField(field.to_string()));
        }
        if self.quote_identifiers {
            Ok(self.dialect.quote_identifier(resolved))
        } else {
            Ok(resolved.to_string())
        }
    }

    fn null_check(&self, column: &str, negated: bool) -> String {
        let not = if negated { "NOT " } else { "" };
        format!("{column} IS {not}{}", self.dialect.null_literal())
    }

    fn render_equality(
        &self,
        column: &str,
        negated: bool,
        value: &Operand,
        out: &mut CompiledPredicate,
    ) {
        match value {
            Operand::Value(RowValues::Null) => out.sql.push_str(&self.null_check(column, negated)),
            Operand::Value(v) => {
                out.sql.push_str(column);
                out.sql.push_str(if negated { " <> ?" } else { " = ?" });
                out.params.push(v.clone());
            }
            Operand::List(items) => {
                let has_null = items.iter().any(RowValues::is_null);
                let values: Vec<&RowValues> = items.iter().filter(|v| !v.is_null()).collect();

                if values.is_empty() {
                    if has_null {
                        out.sql.push_str(&self.null_check(column, negated));
                    } else {
                        // x IN () never matches, x NOT IN () always does
                        out.sql.push_str(self.dialect.bool_literal(negated));
                    }
                    return;
                }

                let markers = vec!["?"; values.len()].join(",");
                let keyword = if negated { "NOT IN" } else { "IN" };
                let list_clause = format!("{column} {keyword} ({markers})");
                if has_null {
                    let joiner = if negated { "AND" } else { "OR" };
                    out.sql.push_str(&format!(
                        "({list_clause} {joiner} {})",
                        self.null_check(column, negated)
                    ));
                } else {
                    out.sql.push_str(&list_clause);
                }
                out.params.extend(values.into_iter().cloned());
            }
        }
    }

    fn render_like(
        &self,
        column: &str,
        op: Operator,
        value: &Operand,
        out: &mut CompiledPredicate,
    ) -> Result<(), DbalError> {
        let items: Vec<&RowValues> = match value {
            Operand::Value(v) => vec![v],
            Operand::List(items) => items.iter().collect(),
        };
        if items.is_empty() {
            out.sql.push_str(self.dialect.bool_literal(false));
            return Ok(());
        }

        let mut patterns = Vec::with_capacity(items.len());
        for item in items {
            let escaped = self.dialect.escape_like(&like_text(op, item)?);
            patterns.push(match op {
                Operator::Contains => format!("%{escaped}%"),
                _ => format!("{escaped}%"),
            });
        }

        let clause = match self.dialect.like_escape_clause() {
            Some(escape) => format!("{column} LIKE ? {escape}"),
            None => format!("{column} LIKE ?"),
        };
        if patterns.len() == 1 {
            out.sql.push_str(&clause);
        } else {
            let joined = vec![clause.as_str(); patterns.len()].join(" OR ");
            out.sql.push('(');
            out.sql.push_str(&joined);
            out.sql.push(')');
        }
        out.params.extend(patterns.into_iter().map(RowValues::Text));
        Ok(())
    }
}

fn like_text(op: Operator, value: &RowValues) -> Result<String, DbalError> {
    match value {
        RowValues::Text(s) => Ok(s.clone()),
        RowValues::Int(i) => Ok(i.to_string()),
        RowValues::Float(f) => Ok(f.to_string()),
        RowValues::Null => Err(DbalError::InvalidValue(format!(
            "operator {op} cannot match NULL"
        ))),
        other => Err(DbalError::InvalidValue(format!(
            "operator {op} needs text, got {other:?}"
        ))),
    }
}

fn render_ordering(
    column: &str,
    op: Operator,
    value: &Operand,
    out: &mut CompiledPredicate,
) -> Result<(), DbalError> {
    match value {
        Operand::Value(RowValues::Null) => Err(DbalError::InvalidValue(format!(
            "operator {op} cannot compare against NULL"
        ))),
        Operand::List(_) => Err(DbalError::InvalidValue(format!(
            "operator {op} cannot compare against a list"
        ))),
        Operand::Value(v) => {
            out.sql.push_str(&format!("{column} {op} ?"));
            out.params.push(v.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Mssql, Mysql, Postgres, Sqlite};

    fn pg(expr: &Expression) -> CompiledPredicate {
        Compiler::new(&Postgres).compile(expr).unwrap()
    }

    fn text(s: &str) -> RowValues {
        RowValues::Text(s.to_string())
    }

    #[test]
    fn equality_scalar_and_list() {
        let scalar = pg(&Expression::compare("==", "status", "active"));
        assert_eq!(scalar.sql, "status = ?");
        assert_eq!(scalar.params, vec![text("active")]);

        let list = pg(&Expression::compare("==", "status", vec!["active", "pending"]));
        assert_eq!(list.sql, "status IN (?,?)");
        assert_eq!(list.params, vec![text("active"), text("pending")]);
    }

    #[test]
    fn inequality_scalar_and_list() {
        assert_eq!(pg(&Expression::ne("status", "gone")).sql, "status <> ?");
        let list = pg(&Expression::ne("id", vec![1, 2, 3]));
        assert_eq!(list.sql, "id NOT IN (?,?,?)");
        assert_eq!(list.params.len(), 3);
    }

    #[test]
    fn like_operators_wrap_values() {
        let contains = pg(&Expression::compare("~=", "label", "50%"));
        assert_eq!(contains.sql, "label LIKE ?");
        assert_eq!(contains.params, vec![text("%50\\%%")]);

        let prefix = pg(&Expression::compare("=~", "code", "ab_"));
        assert_eq!(prefix.sql, "code LIKE ?");
        assert_eq!(prefix.params, vec![text("ab\\_%")]);
    }

    #[test]
    fn ordering_operators() {
        for (token, shape) in [
            (">=", "pos >= ?"),
            ("<=", "pos <= ?"),
            (">", "pos > ?"),
            ("<", "pos < ?"),
        ] {
            let compiled = pg(&Expression::compare(token, "pos", 5));
            assert_eq!(compiled.sql, shape);
            assert_eq!(compiled.params, vec![RowValues::Int(5)]);
        }
    }

    #[test]
    fn null_comparisons_render_is_null() {
        assert_eq!(pg(&Expression::eq("deleted", RowValues::Null)).sql, "deleted IS NULL");
        assert_eq!(
            pg(&Expression::ne("deleted", RowValues::Null)).sql,
            "deleted IS NOT NULL"
        );

        let mixed = pg(&Expression::eq("status", vec![text("a"), RowValues::Null]));
        assert_eq!(mixed.sql, "(status IN (?) OR status IS NULL)");
        assert_eq!(mixed.params, vec![text("a")]);

        let mixed_ne = pg(&Expression::ne("status", vec![text("a"), RowValues::Null]));
        assert_eq!(mixed_ne.sql, "(status NOT IN (?) AND status IS NOT NULL)");
    }

    #[test]
    fn empty_lists_become_constant_predicates() {
        let empty: Vec<RowValues> = Vec::new();
        assert_eq!(pg(&Expression::eq("id", empty.clone())).sql, "FALSE");
        assert_eq!(pg(&Expression::ne("id", empty.clone())).sql, "TRUE");
        let sqlite = Compiler::new(&Sqlite)
            .compile(&Expression::contains("id", empty))
            .unwrap();
        assert_eq!(sqlite.sql, "1 = 0");
        assert!(sqlite.params.is_empty());
    }

    #[test]
    fn composites_are_parenthesized_in_order() {
        let expr = Expression::and(vec![
            Expression::eq("a", 1),
            Expression::or(vec![Expression::gt("b", 2), Expression::lt("c", 3)]),
            Expression::not(Expression::eq("d", 4)),
        ]);
        let compiled = pg(&expr);
        assert_eq!(compiled.sql, "(a = ? AND (b > ? OR c < ?) AND NOT (d = ?))");
        assert_eq!(
            compiled.params,
            vec![
                RowValues::Int(1),
                RowValues::Int(2),
                RowValues::Int(3),
                RowValues::Int(4)
            ]
        );
    }

    #[test]
    fn not_of_composite_keeps_single_parens() {
        let expr = Expression::not(Expression::or(vec![
            Expression::eq("a", 1),
            Expression::eq("b", 2),
        ]));
        assert_eq!(pg(&expr).sql, "NOT (a = ? OR b = ?)");
    }

    #[test]
    fn empty_composites_use_dialect_literals() {
        assert_eq!(pg(&Expression::and(vec![])).sql, "TRUE");
        assert_eq!(pg(&Expression::or(vec![])).sql, "FALSE");
        let mssql = Compiler::new(&Mssql)
            .compile(&Expression::and(vec![]))
            .unwrap();
        assert_eq!(mssql.sql, "1 = 1");
    }

    #[test]
    fn unsupported_operator_fails_without_output() {
        let expr = Expression::and(vec![
            Expression::eq("a", 1),
            Expression::compare("<>", "b", 2),
        ]);
        let err = Compiler::new(&Postgres).compile(&expr).unwrap_err();
        assert!(matches!(err, DbalError::UnsupportedOperator(ref op) if op == "<>"));
    }

    #[test]
    fn rejects_unsafe_fields() {
        for field in ["", "1abc", "a; DROP TABLE t", "a b", "\"a\"", "a.b.c.d", "a--"] {
            let err = Compiler::new(&Postgres)
                .compile(&Expression::eq(field, 1))
                .unwrap_err();
            assert!(matches!(err, DbalError::InvalidField(_)), "accepted {field:?}");
        }
        assert!(is_safe_identifier("mord.status"));
        assert!(is_safe_identifier("shop.mord._status2"));
    }

    #[test]
    fn resolves_logical_names_through_field_map() {
        let fields = FieldMap::new()
            .with("order.status", "mord.status")
            .with("order.bad", "status) OR (1=1");
        let compiler = Compiler::new(&Postgres).with_fields(fields);

        let compiled = compiler
            .compile(&Expression::eq("order.status", "paid"))
            .unwrap();
        assert_eq!(compiled.sql, "mord.status = ?");

        let err = compiler.compile(&Expression::eq("order.bad", 1)).unwrap_err();
        assert!(matches!(err, DbalError::InvalidField(ref f) if f == "order.bad"));
    }

    #[test]
    fn quoting_follows_dialect() {
        let expr = Expression::eq("mord.status", "paid");
        let mysql = Compiler::new(&Mysql)
            .quote_identifiers(true)
            .compile(&expr)
            .unwrap();
        assert_eq!(mysql.sql, "`mord`.`status` = ?");
        let mssql = Compiler::new(&Mssql)
            .quote_identifiers(true)
            .compile(&expr)
            .unwrap();
        assert_eq!(mssql.sql, "[mord].[status] = ?");
    }

    #[test]
    fn like_escaping_follows_dialect() {
        let expr = Expression::contains("label", "5%_");
        let sqlite = Compiler::new(&Sqlite).compile(&expr).unwrap();
        assert_eq!(sqlite.sql, "label LIKE ? ESCAPE '\\'");
        assert_eq!(sqlite.params, vec![text("%5\\%\\_%")]);
        assert_eq!(sqlite.placeholder_count(), 1);

        let mssql = Compiler::new(&Mssql).compile(&expr).unwrap();
        assert_eq!(mssql.sql, "label LIKE ?");
        assert_eq!(mssql.params, vec![text("%5[%][_]%")]);
    }

    #[test]
    fn like_list_is_or_joined() {
        let compiled = pg(&Expression::starts_with("code", vec!["a", "b"]));
        assert_eq!(compiled.sql, "(code LIKE ? OR code LIKE ?)");
        assert_eq!(compiled.params, vec![text("a%"), text("b%")]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let compiler = Compiler::new(&Postgres);
        for expr in [
            Expression::gt("a", RowValues::Null),
            Expression::le("a", vec![1, 2]),
            Expression::contains("a", RowValues::Null),
            Expression::starts_with("a", true),
        ] {
            assert!(matches!(compiler.compile(&expr), Err(DbalError::InvalidValue(_))));
        }
    }

    #[test]
    fn numbers_are_matched_as_text() {
        let compiled = pg(&Expression::contains("sku", 42));
        assert_eq!(compiled.params, vec![text("%42%")]);
    }
}
