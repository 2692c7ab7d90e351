//! Compile a JSON condition into a dialect's WHERE fragment and print the SQL plus
//! its parameters.
//!
//! ```text
//! dbal-compile --dialect postgres --field status=p.status '{"==": {"status": [1, 2]}}'
//! ```

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Value as JsonValue, json};
use sql_dbal::prelude::*;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile JSON criteria into a parameterized SQL predicate")]
struct Args {
    #[arg(long, value_enum, default_value = "sqlite")]
    dialect: DialectKind,
    /// Quote identifiers with the dialect's quote characters.
    #[arg(long)]
    quote: bool,
    /// Map a logical field name to a column, as `name=column`. Repeatable.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
    /// Condition as JSON; read from stdin when omitted.
    condition: Option<String>,
    #[arg(long, short)]
    verbose: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, column)) if !name.is_empty() && !column.is_empty() => {
            Ok((name.to_string(), column.to_string()))
        }
        _ => Err(format!("expected name=column, got `{raw}`")),
    }
}

fn run(args: Args) -> Result<JsonValue, String> {
    let source = match args.condition {
        Some(text) => text,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            text
        }
    };
    let condition: JsonValue =
        serde_json::from_str(&source).map_err(|e| format!("condition is not JSON: {e}"))?;
    let expr = Expression::from_json(&condition).map_err(|e| e.to_string())?;

    let fields: FieldMap = args.fields.into_iter().collect();
    let compiled = Compiler::new(args.dialect.dialect())
        .with_fields(fields)
        .quote_identifiers(args.quote)
        .compile(&expr)
        .map_err(|e| e.to_string())?;
    tracing::debug!(leaves = expr.leaf_count(), "condition compiled");

    let (sql, params) = compiled.into_parts();
    Ok(json!({
        "sql": sql,
        "params": params.iter().map(RowValues::to_json).collect::<Vec<_>>(),
    }))
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::TRACE } else { Level::WARN })
        .init();

    match run(args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
