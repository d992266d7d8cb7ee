#[cfg(test)]
mod tests {
    use analytica::formula::{CellValue, FormulaError, FormulaErrorKind, InMemoryProvider, Validator};
    use analytica::model::{
        Column, DataModel, DataType, Measure, MeasureFormat, ModelError, QuickMeasure, Table,
    };

    fn sales_model() -> DataModel {
        let mut model = DataModel::new("Retail", "alice");
        model
            .add_table(
                Table::new("Sales")
                    .with_column(Column::new("Amount", DataType::Number))
                    .with_column(Column::new("Tax", DataType::Number))
                    .with_column(Column::new("Region", DataType::String)),
            )
            .unwrap();
        model
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_column("Sales", "Amount", [100.0, 250.0, 50.0])
            .with_column("Sales", "Tax", [10.0, 25.0, 5.0])
            .with_column("Sales", "Region", ["N", "S", "N"])
    }

    #[test]
    fn test_create_and_evaluate() {
        let mut model = sales_model();
        let report = model
            .create_measure(
                Measure::new("Gross", "SUM(Sales[Amount]) + SUM(Sales[Tax])")
                    .with_format(MeasureFormat::Currency)
                    .with_description("Amount plus tax"),
            )
            .unwrap();
        assert!(report.valid);
        assert!(report.warnings.is_empty());

        assert_eq!(model.evaluate_measure("Gross", &provider()).unwrap(), 440.0);
        assert_eq!(model.get_measure("Gross").unwrap().format, MeasureFormat::Currency);
    }

    #[test]
    fn test_invalid_expression_is_not_stored() {
        let mut model = sales_model();
        let stamp = model.updated_at;

        let err = model
            .create_measure(Measure::new("Broken", "SUM(Sales[Amount]"))
            .unwrap_err();
        match err {
            ModelError::InvalidMeasure { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("Unbalanced parentheses"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(model.measures.is_empty());
        assert_eq!(model.updated_at, stamp);
    }

    #[test]
    fn test_unclosed_quote_is_not_stored() {
        let mut model = sales_model();
        let err = model
            .create_measure(Measure::new("Broken", "Customer's SUM(Sales[Amount]"))
            .unwrap_err();
        match err {
            ModelError::InvalidMeasure { errors } => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("Unbalanced parentheses"));
                assert!(errors[1].starts_with("Unclosed quote"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(model.measures.is_empty());
    }

    #[test]
    fn test_warnings_do_not_block_creation() {
        let mut model = sales_model();
        let report = model.create_measure(Measure::new("Constant", "1 + 2")).unwrap();
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(model.evaluate_measure("Constant", &provider()).unwrap(), 3.0);
    }

    #[test]
    fn test_strict_validator_rejects_parse_errors() {
        let mut model = sales_model();
        // Balanced, but not a formula.
        let measure = Measure::new("Odd", "SUM(Sales[Amount]) SUM(Sales[Tax])");

        assert!(model
            .create_measure_with(measure.clone(), &Validator::strict())
            .is_err());
        assert!(model.create_measure(measure).is_ok());
        assert!(matches!(
            model.evaluate_measure("Odd", &provider()),
            Err(ModelError::Formula(FormulaError::Syntax { .. }))
        ));
    }

    #[test]
    fn test_duplicate_measure() {
        let mut model = sales_model();
        model
            .create_measure(Measure::new("Revenue", "SUM(Sales[Amount])"))
            .unwrap();
        assert_eq!(
            model
                .create_measure(Measure::new("Revenue", "SUM(Sales[Tax])"))
                .unwrap_err(),
            ModelError::DuplicateMeasure("Revenue".into())
        );
    }

    #[test]
    fn test_remove_measure() {
        let mut model = sales_model();
        model
            .add_quick_measure("Regions", QuickMeasure::DistinctCount, "Sales", "Region")
            .unwrap();
        assert_eq!(model.evaluate_measure("Regions", &provider()).unwrap(), 2.0);

        let removed = model.remove_measure("Regions").unwrap();
        assert_eq!(removed.expression, "DISTINCTCOUNT(Sales[Region])");
        assert!(matches!(
            model.evaluate_measure("Regions", &provider()),
            Err(ModelError::NotFound { .. })
        ));
    }

    #[test]
    fn test_evaluation_errors_keep_their_kind() {
        let mut model = sales_model();
        model
            .create_measure(Measure::new("RegionTotal", "SUM(Sales[Region])"))
            .unwrap();
        model
            .create_measure(Measure::new("Missing", "SUM(Returns[Amount])"))
            .unwrap();

        let kind = |name: &str| match model.evaluate_measure(name, &provider()) {
            Err(ModelError::Formula(e)) => e.kind(),
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(kind("RegionTotal"), FormulaErrorKind::TypeMismatch);
        assert_eq!(kind("Missing"), FormulaErrorKind::UnknownReference);
    }

    #[test]
    fn test_average_of_empty_column_through_model() {
        let mut model = sales_model();
        model
            .add_quick_measure("AvgAmount", QuickMeasure::Average, "Sales", "Amount")
            .unwrap();
        let empty = InMemoryProvider::new().with_column("Sales", "Amount", Vec::<CellValue>::new());
        assert!(matches!(
            model.evaluate_measure("AvgAmount", &empty),
            Err(ModelError::Formula(FormulaError::DivisionByZero { .. }))
        ));
    }
}
