#[cfg(test)]
mod tests {
    use analytica::model::{
        Cardinality, Column, CrossFilter, DataModel, DataType, ModelError, Relationship, Table,
    };
    use analytica::semantic::inference::infer;

    fn retail() -> DataModel {
        let mut model = DataModel::new("Retail", "alice");
        model
            .add_table(
                Table::new("Orders")
                    .with_column(Column::new("id", DataType::Number).key())
                    .with_column(Column::new("customers_id", DataType::Number))
                    .with_column(Column::new("amount", DataType::Number)),
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
    }

    #[test]
    fn test_duplicate_relationship_leaves_edge_count() {
        let mut model = retail();
        model
            .add_relationship(Relationship::new("r1", ("Orders", "customers_id"), ("Customers", "id")))
            .unwrap();
        assert_eq!(model.relationship_count(), 1);
        let stamp = model.updated_at;

        // Same endpoints, different cardinality and id.
        let err = model
            .add_relationship(
                Relationship::new("r2", ("Orders", "customers_id"), ("Customers", "id"))
                    .with_cardinality(Cardinality::OneToOne),
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateRelationship { .. }));
        assert_eq!(model.relationship_count(), 1);
        assert_eq!(model.updated_at, stamp);
    }

    #[test]
    fn test_reverse_direction_is_a_different_edge() {
        let mut model = retail();
        model
            .create_relationship(("Orders", "customers_id"), ("Customers", "id"), Cardinality::ManyToOne, CrossFilter::Single)
            .unwrap();
        model
            .create_relationship(("Customers", "id"), ("Orders", "customers_id"), Cardinality::OneToMany, CrossFilter::Both)
            .unwrap();
        assert_eq!(model.relationship_count(), 2);
        assert_eq!(model.cycles(), vec![vec!["Customers".to_string(), "Orders".to_string()]]);
        assert!(!model.is_acyclic());
    }

    #[test]
    fn test_unknown_endpoints() {
        let mut model = retail();

        let err = model
            .add_relationship(Relationship::new("r1", ("Orders", "customers_id"), ("Clients", "id")))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownEndpoint {
                table: "Clients".into(),
                column: "id".into()
            }
        );

        let err = model
            .add_relationship(Relationship::new("r1", ("Orders", "customer"), ("Customers", "id")))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownEndpoint { ref column, .. } if column == "customer"));
        assert_eq!(model.relationship_count(), 0);
    }

    #[test]
    fn test_create_relationship_defaults() {
        let mut model = retail();
        let id = model
            .create_relationship(
                ("Orders", "customers_id"),
                ("Customers", "id"),
                Cardinality::default(),
                CrossFilter::default(),
            )
            .unwrap();

        let rel = model.get_relationship(&id).unwrap();
        assert_eq!(rel.cardinality, Cardinality::ManyToOne);
        assert_eq!(rel.cross_filter, CrossFilter::Single);
        assert_eq!(id.len(), 8);
        assert!(model.is_acyclic());
    }

    #[test]
    fn test_accept_suggestion_commits() {
        let mut model = retail();
        let suggestions = infer(&model.tables);
        let fk = suggestions
            .iter()
            .find(|s| s.rule == "foreign_key_pattern")
            .unwrap();

        // Inference alone never commits.
        assert_eq!(model.relationship_count(), 0);

        let id = model
            .accept_suggestion(fk, Cardinality::ManyToOne, CrossFilter::Single)
            .unwrap();
        let rel = model.get_relationship(&id).unwrap();
        assert_eq!(rel.to_string(), "Orders.customers_id -> Customers.id (N:1, single)");

        assert!(matches!(
            model.accept_suggestion(fk, Cardinality::ManyToOne, CrossFilter::Single),
            Err(ModelError::DuplicateRelationship { .. })
        ));
    }

    #[test]
    fn test_remove_table_cascades() {
        let mut model = retail();
        model
            .create_relationship(("Orders", "customers_id"), ("Customers", "id"), Cardinality::ManyToOne, CrossFilter::Single)
            .unwrap();

        model.remove_table("Customers").unwrap();
        assert_eq!(model.relationship_count(), 0);
        assert!(model.get_table("Orders").is_ok());
    }

    #[test]
    fn test_remove_relationship() {
        let mut model = retail();
        let id = model
            .create_relationship(("Orders", "customers_id"), ("Customers", "id"), Cardinality::ManyToOne, CrossFilter::Single)
            .unwrap();

        let removed = model.remove_relationship(&id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(model.relationship_count(), 0);
        assert!(matches!(
            model.remove_relationship(&id),
            Err(ModelError::NotFound { .. })
        ));
    }
}
