#[cfg(test)]
mod tests {
    use analytica::config::{StoreBackend, StoreSettings};
    use analytica::model::{
        Cardinality, Column, CrossFilter, DataModel, DataType, Measure, MeasureFormat, Table,
    };
    use analytica::store::{open_store, FileStore, ModelStore, SqliteStore, StoreError};
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_model(id: &str, owner: &str) -> DataModel {
        let mut model = DataModel::with_id(id, "Retail", owner);
        model
            .add_table(
                Table::new("Sales")
                    .with_column(Column::new("id", DataType::Number).key())
                    .with_column(
                        Column::new("customer_id", DataType::Number).references("Customers.id"),
                    )
                    .with_column(Column::new("Amount", DataType::Number))
                    .with_row_count(1_204),
            )
            .unwrap();
        model
            .add_table(
                Table::new("Customers")
                    .with_column(Column::new("id", DataType::Number).key())
                    .with_column(Column::new("name", DataType::String)),
            )
            .unwrap();
        model
            .create_relationship(
                ("Sales", "customer_id"),
                ("Customers", "id"),
                Cardinality::ManyToOne,
                CrossFilter::Both,
            )
            .unwrap();
        model
            .create_measure(
                Measure::new("Revenue", "SUM(Sales[Amount])").with_format(MeasureFormat::Currency),
            )
            .unwrap();
        model
    }

    fn stores() -> Vec<(TempDir, Box<dyn ModelStore>)> {
        let file_dir = TempDir::new().unwrap();
        let file_store = FileStore::open(file_dir.path().join("models")).unwrap();
        let sqlite_dir = TempDir::new().unwrap();
        let sqlite_store = SqliteStore::open_in_memory().unwrap();
        vec![
            (file_dir, Box::new(file_store) as Box<dyn ModelStore>),
            (sqlite_dir, Box::new(sqlite_store)),
        ]
    }

    #[test]
    fn test_round_trip() {
        for (_dir, store) in stores() {
            let model = sample_model("retail-1", "alice");
            store.save(&model).unwrap();
            assert_eq!(store.load("retail-1").unwrap(), Some(model));
        }
    }

    #[test]
    fn test_load_missing() {
        for (_dir, store) in stores() {
            assert_eq!(store.load("nope").unwrap(), None);
            assert!(matches!(
                store.load_required("nope"),
                Err(StoreError::NotFound(id)) if id == "nope"
            ));
        }
    }

    #[test]
    fn test_invalid_id_rejected() {
        for (_dir, store) in stores() {
            assert!(matches!(store.load("../x"), Err(StoreError::InvalidId(_))));
            let model = DataModel::with_id("a/b", "Bad", "alice");
            assert!(matches!(store.save(&model), Err(StoreError::InvalidId(_))));
        }
    }

    #[test]
    fn test_save_overwrites() {
        for (_dir, store) in stores() {
            let mut model = sample_model("retail-1", "alice");
            store.save(&model).unwrap();

            model.remove_table("Customers").unwrap();
            store.save(&model).unwrap();

            let loaded = store.load_required("retail-1").unwrap();
            assert_eq!(loaded.tables.len(), 1);
            assert!(loaded.relationships.is_empty());
            assert_eq!(store.list(None).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_list_order_and_owner_filter() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        for (_dir, store) in stores() {
            let mut a = DataModel::with_id("a", "A", "alice");
            a.updated_at = base;
            let mut b = DataModel::with_id("b", "B", "bob");
            b.updated_at = base + Duration::hours(1);
            let mut c = DataModel::with_id("c", "C", "alice");
            c.updated_at = base;

            for m in [&a, &b, &c] {
                store.save(m).unwrap();
            }

            let ids: Vec<String> = store.list(None).unwrap().into_iter().map(|s| s.id).collect();
            assert_eq!(ids, vec!["b", "a", "c"]);

            let alice: Vec<String> = store
                .list(Some("alice"))
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect();
            assert_eq!(alice, vec!["a", "c"]);

            assert!(store.list(Some("carol")).unwrap().is_empty());
        }
    }

    #[test]
    fn test_summary_contents() {
        for (_dir, store) in stores() {
            let model = sample_model("retail-1", "alice");
            store.save(&model).unwrap();

            let summaries = store.list(None).unwrap();
            assert_eq!(summaries, vec![model.summary()]);
            assert_eq!(summaries[0].table_count, 2);
        }
    }

    #[test]
    fn test_delete() {
        for (_dir, store) in stores() {
            store.save(&sample_model("retail-1", "alice")).unwrap();
            assert!(store.delete("retail-1").unwrap());
            assert!(!store.delete("retail-1").unwrap());
            assert_eq!(store.load("retail-1").unwrap(), None);
        }
    }

    #[test]
    fn test_updated_at_advances_across_saves() {
        for (_dir, store) in stores() {
            let mut model = sample_model("retail-1", "alice");
            // A clock far ahead of now must not be undone by the next change.
            model.updated_at = Utc::now() + Duration::days(1);
            store.save(&model).unwrap();
            let first = store.load_required("retail-1").unwrap().updated_at;

            let mut reloaded = store.load_required("retail-1").unwrap();
            reloaded
                .add_table(Table::new("Regions").with_column(Column::new("name", DataType::String)))
                .unwrap();
            store.save(&reloaded).unwrap();

            let second = store.load_required("retail-1").unwrap().updated_at;
            assert!(second > first);
        }
    }

    #[test]
    fn test_sqlite_compare_and_swap() {
        let store = SqliteStore::open_in_memory().unwrap();
        let model = sample_model("retail-1", "alice");

        let first = store.save_if_unchanged(&model, None).unwrap();
        assert_eq!(store.fingerprint("retail-1").unwrap().as_deref(), Some(first.as_str()));
        assert!(matches!(
            store.save_if_unchanged(&model, None),
            Err(StoreError::Conflict { .. })
        ));

        let mut writer_a = store.load_required("retail-1").unwrap();
        let mut writer_b = writer_a.clone();

        writer_a
            .add_table(Table::new("Regions").with_column(Column::new("name", DataType::String)))
            .unwrap();
        store.save_if_unchanged(&writer_a, Some(&first)).unwrap();

        writer_b
            .add_table(Table::new("Stores").with_column(Column::new("name", DataType::String)))
            .unwrap();
        assert!(matches!(
            store.save_if_unchanged(&writer_b, Some(&first)),
            Err(StoreError::Conflict { id }) if id == "retail-1"
        ));

        let stored = store.load_required("retail-1").unwrap();
        assert!(stored.get_table("Regions").is_ok());
        assert!(stored.get_table("Stores").is_err());
    }

    #[test]
    fn test_sqlite_reopen_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("models.db");
        let model = sample_model("retail-1", "alice");

        SqliteStore::open(&path).unwrap().save(&model).unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load("retail-1").unwrap(), Some(model));
    }

    #[test]
    fn test_open_store_from_settings() {
        for backend in [StoreBackend::File, StoreBackend::Sqlite] {
            let dir = TempDir::new().unwrap();
            let settings = StoreSettings {
                backend,
                path: Some(dir.path().join("store").display().to_string()),
            };

            let store = open_store(&settings).unwrap();
            let model = sample_model("retail-1", "bob");
            store.save(&model).unwrap();
            assert_eq!(store.load("retail-1").unwrap(), Some(model));
        }
    }
}
