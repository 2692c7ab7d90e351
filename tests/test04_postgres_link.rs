#![cfg(feature = "postgres")]

use std::env;

use sql_dbal::prelude::*;

// Runs against a live server only when `DBAL_TEST_POSTGRES_URL` is set,
// e.g. `host=localhost user=testuser dbname=testing`.
fn live_config() -> Option<ConnectionConfig> {
    let url = env::var("DBAL_TEST_POSTGRES_URL").ok()?;
    Some(
        ConnectionConfig::builder()
            .param("url", url)
            .bootstrap("SET TIME ZONE 'UTC'")
            .finish(),
    )
}

#[test]
fn postgres_predicates_and_nested_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = live_config() else {
        return Ok(());
    };
    let mut conn = Connection::open(PostgresDriver, config)?;
    conn.create("CREATE TEMP TABLE dbal_items (id BIGINT, label TEXT)")?
        .execute()?
        .finish();

    conn.begin()?;
    conn.begin()?;
    for (id, label) in [(1_i64, "https://example.com/?1=a"), (2, "plain")] {
        let mut stmt = conn.create("INSERT INTO dbal_items (id, label) VALUES (?, ?)")?;
        stmt.bind(1, id)?.bind(2, label)?;
        stmt.execute()?.finish();
    }
    conn.commit()?;
    assert!(conn.in_transaction());
    conn.commit()?;

    let compiled = Compiler::new(&Postgres)
        .compile(&Expression::contains("label", "/?1="))?;
    let sql = format!("SELECT id FROM dbal_items WHERE {} AND label <> '?'", compiled.sql);
    let mut stmt = conn.create(&sql)?;
    stmt.bind_predicate(&compiled)?;
    let rows = stmt.execute()?;
    assert_eq!(rows.rows().len(), 1);
    assert_eq!(rows.rows()[0].get("id"), Some(&RowValues::Int(1)));

    let err = conn.create("SELEC 1 WHERE ? = 1").err();
    assert!(matches!(err, Some(DbalError::Statement(ref e)) if e.code.as_deref() == Some("42601")));
    conn.close()?;
    Ok(())
}
