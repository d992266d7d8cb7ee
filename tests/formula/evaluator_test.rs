#[cfg(test)]
mod tests {
    use analytica::formula::{
        evaluate, CellValue, DataProvider, Formula, FormulaError, FormulaErrorKind, InMemoryProvider,
        ProviderError,
    };
    use std::cell::Cell;

    fn sales(amount: &[f64], tax: &[f64]) -> InMemoryProvider {
        InMemoryProvider::new()
            .with_column("Sales", "Amount", amount.iter().copied())
            .with_column("Sales", "Tax", tax.iter().copied())
    }

    #[test]
    fn test_average_of_empty_column_is_division_by_zero() {
        let provider = sales(&[], &[]);
        let err = evaluate("AVERAGE(Sales[Amount])", &provider).unwrap_err();
        assert_eq!(err.kind(), FormulaErrorKind::DivisionByZero);
    }

    #[test]
    fn test_sum_plus_sum_equals_separate_sums() {
        let cases: [(&[f64], &[f64]); 4] = [
            (&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3]),
            (&[1e10, -1e10, 0.5], &[3.25]),
            (&[], &[7.0, 8.0]),
            (&[-4.5, 2.25, 1e-3, 9.75], &[-1.0, -2.0]),
        ];

        for (amount, tax) in cases {
            let provider = sales(amount, tax);
            let combined = evaluate("SUM(Sales[Amount]) + SUM(Sales[Tax])", &provider).unwrap();
            let separate = evaluate("SUM(Sales[Amount])", &provider).unwrap()
                + evaluate("SUM(Sales[Tax])", &provider).unwrap();
            assert!((combined - separate).abs() <= 1e-9 * separate.abs().max(1.0));

            let reversed = evaluate("SUM(Sales[Tax]) + SUM(Sales[Amount])", &provider).unwrap();
            assert!((combined - reversed).abs() <= 1e-9 * combined.abs().max(1.0));
        }
    }

    #[test]
    fn test_distinct_count() {
        let provider = InMemoryProvider::new().with_column("Sales", "Region", ["N", "S", "N", "E"]);
        assert_eq!(evaluate("DISTINCTCOUNT(Sales[Region])", &provider).unwrap(), 3.0);
    }

    #[test]
    fn test_distinct_count_compares_canonical_text() {
        let provider = InMemoryProvider::new().with_column(
            "Sales",
            "Code",
            [CellValue::from(1.0), CellValue::from("1"), CellValue::from(1i64), CellValue::from(2.5)],
        );
        assert_eq!(evaluate("DISTINCTCOUNT(Sales[Code])", &provider).unwrap(), 2.0);
    }

    #[test]
    fn test_count_includes_non_numeric() {
        let provider = InMemoryProvider::new().with_column(
            "Sales",
            "Mixed",
            [CellValue::from(1.0), CellValue::from("abc"), CellValue::Null, CellValue::from(true)],
        );
        assert_eq!(evaluate("COUNT(Sales[Mixed])", &provider).unwrap(), 4.0);
        assert_eq!(
            evaluate("SUM(Sales[Mixed])", &provider).unwrap_err().kind(),
            FormulaErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_numeric_text_is_coerced() {
        let provider = InMemoryProvider::new().with_column("Sales", "Amount", [" 10 ", "2.5", "-0.5"]);
        assert_eq!(evaluate("SUM(Sales[Amount])", &provider).unwrap(), 12.0);
        assert_eq!(evaluate("MAX(Sales[Amount])", &provider).unwrap(), 10.0);
    }

    #[test]
    fn test_type_mismatch_message() {
        let provider = InMemoryProvider::new().with_column("Sales", "Amount", ["10", "n/a"]);
        let err = evaluate("AVERAGE(Sales[Amount])", &provider).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Type mismatch in AVERAGE(Sales[Amount]): value 'n/a' is not numeric"
        );
    }

    #[test]
    fn test_precedence_and_associativity() {
        let provider = sales(&[10.0, 20.0], &[4.0]);
        assert_eq!(evaluate("SUM(Sales[Amount]) - SUM(Sales[Tax]) * 2", &provider).unwrap(), 22.0);
        assert_eq!(evaluate("(SUM(Sales[Amount]) - SUM(Sales[Tax])) * 2", &provider).unwrap(), 52.0);
        assert_eq!(evaluate("SUM(Sales[Amount]) / 5 / 2", &provider).unwrap(), 3.0);
        assert_eq!(evaluate("100 - 10 - 1", &provider).unwrap(), 89.0);
    }

    #[test]
    fn test_explicit_division_by_zero() {
        let provider = sales(&[1.0], &[]);
        let err = evaluate("SUM(Sales[Amount]) / SUM(Sales[Tax])", &provider).unwrap_err();
        assert!(matches!(err, FormulaError::DivisionByZero { .. }));
        assert_eq!(evaluate("1 / 0", &provider).unwrap_err().kind(), FormulaErrorKind::DivisionByZero);
    }

    #[test]
    fn test_min_max_of_empty_column() {
        let provider = sales(&[], &[]);
        assert_eq!(
            evaluate("MIN(Sales[Amount])", &provider).unwrap_err().kind(),
            FormulaErrorKind::EmptyAggregate
        );
        assert_eq!(evaluate("SUM(Sales[Amount])", &provider).unwrap(), 0.0);
        assert_eq!(evaluate("COUNT(Sales[Amount])", &provider).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_function_and_references() {
        let provider = sales(&[1.0], &[1.0]);
        let kinds: Vec<FormulaErrorKind> = [
            "MEDIAN(Sales[Amount])",
            "SUM(Returns[Amount])",
            "SUM(Sales[Discount])",
        ]
        .iter()
        .map(|src| evaluate(src, &provider).unwrap_err().kind())
        .collect();
        assert!(kinds.iter().all(|k| *k == FormulaErrorKind::UnknownReference));
    }

    /// Counts calls and fails on one table, to observe resolution order.
    struct CountingProvider {
        inner: InMemoryProvider,
        calls: Cell<usize>,
    }

    impl DataProvider for CountingProvider {
        fn get_column(&self, table: &str, column: &str) -> Result<Vec<CellValue>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.get_column(table, column)
        }
    }

    #[test]
    fn test_unknown_reference_before_arithmetic() {
        // Arithmetic on the left would divide by zero if it ran first.
        let provider = CountingProvider {
            inner: sales(&[1.0], &[]),
            calls: Cell::new(0),
        };
        let err = evaluate("SUM(Sales[Amount]) / SUM(Sales[Tax]) + SUM(Returns[Amount])", &provider)
            .unwrap_err();
        assert_eq!(err.kind(), FormulaErrorKind::UnknownReference);
        assert_eq!(provider.calls.get(), 3);
    }

    #[test]
    fn test_repeated_reference_fetched_once() {
        let provider = CountingProvider {
            inner: sales(&[2.0, 4.0], &[]),
            calls: Cell::new(0),
        };
        let formula = Formula::parse("SUM(Sales[Amount]) / COUNT(Sales[Amount])").unwrap();
        assert_eq!(formula.evaluate(&provider).unwrap(), 3.0);
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn test_load_provider_from_json() {
        let provider = InMemoryProvider::from_json_str(
            r#"{"Sales": {"Amount": [10, 20.5, "4"], "Region": ["N", null, true]}}"#,
        )
        .unwrap();
        assert_eq!(evaluate("SUM(Sales[Amount])", &provider).unwrap(), 34.5);
        assert_eq!(evaluate("COUNT(Sales[Region])", &provider).unwrap(), 3.0);
    }

    #[test]
    fn test_out_of_range_literal_is_rejected_at_parse() {
        let source = format!("SUM(Sales[Amount]) * {}", "1".repeat(400));
        let err = Formula::parse(&source).unwrap_err();
        assert_eq!(err.kind(), FormulaErrorKind::Syntax);
    }

    #[test]
    fn test_overflowing_results_are_errors() {
        let provider = sales(&[1e308, 1e308], &[1e200]);
        let kind = |src: &str| evaluate(src, &provider).unwrap_err().kind();

        assert_eq!(kind("SUM(Sales[Amount])"), FormulaErrorKind::NonFinite);
        assert_eq!(kind("SUM(Sales[Amount]) - SUM(Sales[Amount])"), FormulaErrorKind::NonFinite);
        assert_eq!(kind("SUM(Sales[Tax]) * SUM(Sales[Tax])"), FormulaErrorKind::NonFinite);
        assert_eq!(kind("MAX(Sales[Amount]) * 10"), FormulaErrorKind::NonFinite);
    }

    #[test]
    fn test_average_near_float_limit() {
        let provider = sales(&[1e308, 1e308], &[f64::MAX, f64::MAX, f64::MAX]);
        assert_eq!(evaluate("AVERAGE(Sales[Amount])", &provider).unwrap(), 1e308);
        assert_eq!(evaluate("AVERAGE(Sales[Tax])", &provider).unwrap(), f64::MAX);
    }

    #[test]
    fn test_many_distinct_references_fetched_once_each() {
        let columns = 300;
        let inner = (0..columns).fold(InMemoryProvider::new(), |p, i| {
            p.with_column("Wide", format!("C{i}"), [1.0])
        });
        let provider = CountingProvider {
            inner,
            calls: Cell::new(0),
        };
        let terms: Vec<String> = (0..columns)
            .flat_map(|i| [format!("SUM(Wide[C{i}])"), format!("COUNT(Wide[C{i}])")])
            .collect();
        let formula = Formula::parse(&terms.join(" + ")).unwrap();

        assert_eq!(formula.references().len(), columns);
        assert_eq!(formula.evaluate(&provider).unwrap(), 600.0);
        assert_eq!(provider.calls.get(), columns);
    }
}
