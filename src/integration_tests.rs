/// # Integration Tests Module
///
/// End-to-end CRUD behavior against an in-memory SQLite database: statement
/// building, session management, execution and row mapping together.

#[cfg(test)]
mod tests {
    use crate::core::db::session::SessionState;
    use crate::core::Result;
    use crate::test_utils::error_testing;
    use crate::test_utils::{run, DatabaseFixture};
    use crate::{ColumnValues, Columns, Filter, Limit, Row, Value};

    fn first_row(fixture: &mut DatabaseFixture, columns: &str) -> Option<Row> {
        fixture
            .db
            .select(None, columns, None, None)
            .unwrap()
            .next()
            .map(|row| row.unwrap())
    }

    /// The full insert / select / replace / update / delete walk-through
    #[test]
    fn test_crud_scenario() {
        let mut fixture = DatabaseFixture::new().unwrap();

        let id = fixture
            .db
            .insert(Some("test"), ColumnValues::new().with("name", "binux").with("age", 23))
            .unwrap();
        assert_eq!(id, 1);

        assert_eq!(
            first_row(&mut fixture, "name, age"),
            Some(vec![Value::from("binux"), Value::from(23)])
        );

        let records = fixture.db.select_as_mapping(Some("test"), "name, age", None, None).unwrap();
        assert_eq!(records[0]["name"], Value::from("binux"));
        assert_eq!(records[0]["age"], Value::from(23));

        fixture
            .db
            .replace(Some("test"), ColumnValues::new().with("id", 1).with("age", 24))
            .unwrap();
        assert_eq!(
            first_row(&mut fixture, "name, age"),
            Some(vec![Value::Null, Value::from(24)])
        );

        fixture
            .db
            .update(Some("test"), Some(Filter::new("id = 1")), ColumnValues::new().with("age", 16))
            .unwrap();
        assert_eq!(
            first_row(&mut fixture, "name, age"),
            Some(vec![Value::Null, Value::from(16)])
        );

        fixture.db.delete(Some("test"), Some(Filter::new("id = 1"))).unwrap();
        let remaining: Vec<Row> = fixture
            .db
            .select(Some("test"), Columns::All, None, None)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_update_and_delete_without_filter_touch_nothing() {
        let mut fixture = DatabaseFixture::new().unwrap();
        for age in [1, 2, 3] {
            fixture.db.insert(None, ColumnValues::new().with("age", age)).unwrap();
        }

        fixture.db.update(None, None, ColumnValues::new().with("age", 99)).unwrap();
        fixture.db.delete(None, None).unwrap();
        fixture.db.delete(None, Some(Filter::new("   "))).unwrap();

        assert_eq!(fixture.count("test").unwrap(), 3);
        let ages: Vec<Row> = fixture
            .db
            .select(None, ["age"].as_slice(), None, None)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(ages, vec![vec![Value::from(1)], vec![Value::from(2)], vec![Value::from(3)]]);
    }

    #[test]
    fn test_filters_affect_exactly_matching_rows() {
        let mut fixture = DatabaseFixture::new().unwrap();
        for (name, age) in [("a", 10), ("b", 20), ("c", 30)] {
            fixture
                .db
                .insert(None, ColumnValues::new().with("name", name).with("age", age))
                .unwrap();
        }

        fixture
            .db
            .update(None, Some(Filter::new("age > ?").bind(15)), ColumnValues::new().with("name", "old"))
            .unwrap();
        fixture
            .db
            .update(None, Some(Filter::new("age > ?").bind(1000)), ColumnValues::new().with("name", "none"))
            .unwrap();
        let old = fixture
            .db
            .select_as_mapping(None, Columns::All, Some(Filter::new("name = ?").bind("old")), None)
            .unwrap();
        assert_eq!(old.len(), 2);

        fixture.db.delete(None, Some(Filter::new("name = ?").bind("old"))).unwrap();
        assert_eq!(fixture.count("test").unwrap(), 1);
    }

    #[test]
    fn test_select_and_mapping_are_value_equivalent() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();

        let rows: Vec<Row> = fixture
            .db
            .select(Some("users"), Columns::All, None, Some(Limit::new(1, 2)))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let records = fixture
            .db
            .select_as_mapping(Some("users"), Columns::All, None, Some(Limit::new(1, 2)))
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(records.into_iter().map(|r| r.into_row()).collect::<Vec<_>>(), rows);
        assert_eq!(rows[0][1], Value::from("bob"));
    }

    #[test]
    fn test_utf8_blobs_come_back_as_text() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();
        fixture
            .db
            .insert(
                Some("users"),
                ColumnValues::new().with("username", "dave").with("avatar", vec![0xffu8, 0x00]),
            )
            .unwrap();

        let avatars: Vec<Row> = fixture
            .db
            .select(Some("users"), vec!["avatar"], None, None)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(avatars[0], vec![Value::from("alice")]);
        assert_eq!(avatars[3], vec![Value::Blob(vec![0xff, 0x00])]);
    }

    #[test]
    fn test_insert_default_row() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();
        let id = fixture.db.insert(Some("test"), ColumnValues::new()).unwrap();
        assert_eq!(id, 1);

        let records = fixture.db.select_as_mapping(Some("test"), Columns::All, None, None).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0]["name"].is_null());
    }

    #[test]
    fn test_abandoned_stream_is_drained_on_next_call() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();
        {
            let mut rows = fixture.db.select(Some("users"), Columns::All, None, None).unwrap();
            assert!(rows.next().is_some());
        }
        assert_eq!(fixture.db.state(), SessionState::PendingResult);

        assert_eq!(fixture.count("users").unwrap(), 3);
        assert_eq!(fixture.db.state(), SessionState::Connected);
    }

    #[test]
    fn test_rows_are_produced_as_they_are_read() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();
        let sql = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5) \
                   SELECT CASE WHEN x < 3 THEN x ELSE abs(x - 3 - 9223372036854775807 - 1) END FROM n";
        {
            let mut rows = fixture.db.execute(&crate::Statement::new(sql, Vec::new())).unwrap();
            assert_eq!(rows.next().unwrap().unwrap(), vec![Value::from(1)]);
            assert_eq!(rows.next().unwrap().unwrap(), vec![Value::from(2)]);
            error_testing::assert_error_mentions(&rows.next().unwrap(), "integer overflow");
            assert!(rows.is_closed());
        }
        assert_eq!(fixture.db.state(), SessionState::Connected);
        assert_eq!(fixture.count("users").unwrap(), 3);
    }

    #[test]
    fn test_dropped_session_is_reconnected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reconnect.db");
        let config = crate::DbConfig::new(path.to_string_lossy().to_string());

        let mut db = crate::Database::open(&config).unwrap().with_default_table("test");
        run(&mut db, "CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
        db.insert(None, ColumnValues::new().with("name", "kept")).unwrap();

        db.session_mut().disconnect();
        assert_eq!(db.state(), SessionState::Disconnected);

        let records = db.select_as_mapping(None, vec!["name"], None, None).unwrap();
        assert_eq!(records[0]["name"], Value::from("kept"));
        assert_eq!(db.state(), SessionState::Connected);
        db.close().unwrap();
    }

    #[test]
    fn test_engine_errors_surface_unchanged() {
        let mut fixture = DatabaseFixture::with_sample_data().unwrap();

        let duplicate = fixture
            .db
            .insert(Some("users"), ColumnValues::new().with("username", "alice"));
        error_testing::assert_error_mentions(&duplicate, "UNIQUE constraint failed");

        let missing = fixture.db.select_as_mapping(Some("nope"), Columns::All, None, None);
        error_testing::assert_error_mentions(&missing, "no such table");

        // The session is still usable afterwards
        assert_eq!(fixture.count("users").unwrap(), 3);
    }
}
