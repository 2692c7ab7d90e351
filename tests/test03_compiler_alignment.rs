use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sql_dbal::prelude::*;

const FIELDS: [&str; 4] = ["status", "label", "p.price", "stock"];

fn random_value(rng: &mut ChaCha8Rng, allow_null: bool) -> RowValues {
    match rng.random_range(0..4) {
        0 if allow_null => RowValues::Null,
        0 | 1 => RowValues::Int(rng.random_range(-50..50)),
        // literal markers inside values never reach the SQL text
        2 => RowValues::Text(format!("it's ?{}", rng.random_range(0..9))),
        _ => RowValues::Text("50%_off".into()),
    }
}

fn random_leaf(rng: &mut ChaCha8Rng) -> Expression {
    let field = FIELDS[rng.random_range(0..FIELDS.len())];
    let op = Operator::ALL[rng.random_range(0..Operator::ALL.len())];
    let ordering = matches!(op, Operator::Ge | Operator::Le | Operator::Gt | Operator::Lt);
    let like = matches!(op, Operator::Contains | Operator::StartsWith);

    let value = if !ordering && rng.random_bool(0.4) {
        let len = rng.random_range(0..4);
        Operand::List((0..len).map(|_| random_value(rng, !like)).collect())
    } else {
        Operand::Value(random_value(rng, !ordering && !like))
    };
    Expression::with_operator(op, field, value)
}

fn random_tree(rng: &mut ChaCha8Rng, depth: usize) -> Expression {
    if depth == 0 || rng.random_bool(0.3) {
        return random_leaf(rng);
    }
    let kind = rng.random_range(0..3);
    if kind == 2 {
        return Expression::not(random_tree(rng, depth - 1));
    }
    let width = rng.random_range(0..4);
    let children = (0..width).map(|_| random_tree(rng, depth - 1)).collect();
    if kind == 0 {
        Expression::and(children)
    } else {
        Expression::or(children)
    }
}

#[test]
fn placeholders_always_match_parameters() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let dialects = [
        DialectKind::Sqlite,
        DialectKind::Postgres,
        DialectKind::Mysql,
        DialectKind::Mssql,
    ];

    for _ in 0..500 {
        let expr = random_tree(&mut rng, 4);
        for kind in dialects {
            for quote in [false, true] {
                let compiled = Compiler::new(kind.dialect())
                    .quote_identifiers(quote)
                    .compile(&expr)
                    .unwrap_or_else(|e| panic!("{expr:?} failed on {kind:?}: {e}"));

                assert_eq!(
                    count_placeholders(&compiled.sql),
                    compiled.params.len(),
                    "{kind:?} produced {}",
                    compiled.sql
                );
                assert!(!compiled.params.iter().any(RowValues::is_null), "{}", compiled.sql);
            }
        }
    }
}

#[test]
fn postgres_translation_numbers_every_parameter() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..200 {
        let expr = random_tree(&mut rng, 3);
        let compiled = Compiler::new(&Postgres).compile(&expr).unwrap();
        let translated = translate_placeholders(&compiled.sql, PlaceholderStyle::Postgres);

        let count = compiled.params.len();
        assert_eq!(has_placeholders(&translated), count > 0);
        assert_eq!(count_placeholders(&translated), count, "{translated}");
        if count > 0 {
            assert!(translated.contains(&format!("${count}")), "{translated}");
            assert!(!translated.contains(&format!("${}", count + 1)), "{translated}");
        }
    }
}

#[test]
fn unsafe_fields_are_rejected_everywhere() {
    for field in ["status; DROP TABLE items", "a b", "1abc", "x\"y", ""] {
        for kind in [DialectKind::Sqlite, DialectKind::Mssql] {
            let err = Compiler::new(kind.dialect())
                .compile(&Expression::eq(field, 1_i64))
                .unwrap_err();
            assert!(matches!(err, DbalError::InvalidField(_)), "{field}");
        }
    }
}
