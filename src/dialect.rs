//! SQL dialect rendering hooks.
//!
//! The operator table and the tree walk live in the compiler; a [`Dialect`] only decides
//! how identifiers are quoted, how LIKE wildcards are escaped and how constant
//! predicates are written.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Rendering hooks that vary between SQL variants.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char);

    /// Quote a (possibly dotted) identifier, doubling embedded closing quotes.
    fn quote_identifier(&self, ident: &str) -> String {
        let (open, close) = self.quote_chars();
        let doubled: String = [close, close].iter().collect();
        ident
            .split('.')
            .map(|part| {
                let escaped = part.replace(close, &doubled);
                format!("{open}{escaped}{close}")
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Escape LIKE wildcards so the value matches literally.
    fn escape_like(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            if matches!(ch, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    /// Appended after `LIKE ?` when the escape character is not the server default.
    fn like_escape_clause(&self) -> Option<&'static str> {
        None
    }

    /// A predicate that is constantly true or false.
    fn bool_literal(&self, value: bool) -> &'static str;

    fn null_literal(&self) -> &'static str {
        "NULL"
    }
}

/// `SQLite`: double-quote quoting, backslash LIKE escape declared explicitly.
///
/// `~=` and `=~` compile to `LIKE`, which `SQLite` evaluates case-insensitively for
/// ASCII letters unless the link runs `PRAGMA case_sensitive_like = ON` (a bootstrap
/// statement is the usual place). Postgres and SQL Server collations decide case
/// sensitivity on their side, so the same predicate can match differently per backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn like_escape_clause(&self) -> Option<&'static str> {
        Some("ESCAPE '\\'")
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1 = 1" } else { "1 = 0" }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Dialect for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }
}

/// SQL Server: bracket quoting, and LIKE wildcards escaped as character classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mssql;

impl Dialect for Mssql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn escape_like(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '%' | '_' | '[' => {
                    out.push('[');
                    out.push(ch);
                    out.push(']');
                }
                _ => out.push(ch),
            }
        }
        out
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1 = 1" } else { "1 = 0" }
    }
}

/// Selects one of the built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Sqlite,
    Postgres,
    Mysql,
    Mssql,
}

impl DialectKind {
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Sqlite => &Sqlite,
            DialectKind::Postgres => &Postgres,
            DialectKind::Mysql => &Mysql,
            DialectKind::Mssql => &Mssql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_each_dotted_part() {
        assert_eq!(Postgres.quote_identifier("mord.status"), "\"mord\".\"status\"");
        assert_eq!(Mysql.quote_identifier("status"), "`status`");
        assert_eq!(Mssql.quote_identifier("dbo.orders"), "[dbo].[orders]");
    }

    #[test]
    fn doubles_embedded_closing_quote() {
        assert_eq!(Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Mssql.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn escapes_like_wildcards_per_dialect() {
        assert_eq!(Sqlite.escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(Mssql.escape_like("50%_[x]"), "50[%][_][[]x]");
    }

    #[test]
    fn dialect_kind_selects_dialect() {
        for (kind, name) in [
            (DialectKind::Sqlite, "sqlite"),
            (DialectKind::Postgres, "postgres"),
            (DialectKind::Mysql, "mysql"),
            (DialectKind::Mssql, "mssql"),
        ] {
            assert_eq!(kind.dialect().name(), name);
        }
        assert_eq!(DialectKind::Postgres.dialect().bool_literal(false), "FALSE");
    }
}
