#[cfg(test)]
mod tests {
    use analytica::formula::{validate, Formula, FormulaError, ParseOptions, Validator};

    #[test]
    fn test_unbalanced_parenthesis_is_invalid() {
        let report = validate("SUM(Sales[Amount]");
        assert!(!report.valid);
        assert!(!report.errors.is_empty());
    }

    #[test]
    fn test_both_balance_checks_report() {
        let report = validate("SUM(Sales[Amount");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Unbalanced parentheses"));
        assert!(report.errors[1].starts_with("Unbalanced brackets"));
    }

    #[test]
    fn test_report_serializes_for_callers() {
        let report = validate("1 + 2");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_column_reference_alone_suppresses_warning() {
        let report = validate("Sales[Amount]");
        assert!(report.valid);
        assert!(report.warnings.is_empty());
        // Still not evaluable: a bare column is not an aggregate.
        assert!(Formula::parse("Sales[Amount]").is_err());
    }

    #[test]
    fn test_function_names_ignore_case() {
        let formula = Formula::parse("sum(Sales[Amount]) / Count(Sales[Amount])").unwrap();
        assert_eq!(formula.references().len(), 1);
        assert!(validate("sum(Sales[Amount])").warnings.is_empty());
    }

    #[test]
    fn test_quoted_table_names() {
        let formula = Formula::parse("SUM('Sales Data'[Net Amount])").unwrap();
        let reference = formula.references()[0];
        assert_eq!(reference.table, "Sales Data");
        assert_eq!(reference.column, "Net Amount");
        assert_eq!(reference.to_string(), "'Sales Data'[Net Amount]");
    }

    #[test]
    fn test_syntax_error_span_points_at_end() {
        let err = Formula::parse("SUM(Sales[Amount]) +").unwrap_err();
        match err {
            FormulaError::Syntax { span, .. } => assert_eq!(span, 20..20),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        let options = ParseOptions { max_depth: 4 };
        assert!(Formula::parse(&shallow).is_ok());
        assert!(matches!(
            Formula::parse_with(&shallow, &options),
            Err(FormulaError::Syntax { .. })
        ));

        let strict = Validator::strict().with_parse_options(options);
        assert!(!strict.validate(&shallow).valid);
        assert!(Validator::default().with_parse_options(options).validate(&shallow).valid);
    }

    #[test]
    fn test_unclosed_quote_is_invalid() {
        let cases = [
            ("SUM(Sales[Amount]) + ' (", "Unbalanced parentheses"),
            ("' )", "Unbalanced parentheses"),
            ("SUM(Sales[Amount]) ' [", "Unbalanced brackets"),
            ("Customer's SUM(Sales[Amount]", "Unbalanced parentheses"),
        ];
        for (expression, delimiter_error) in cases {
            let report = validate(expression);
            assert!(!report.valid, "{expression}");
            assert!(
                report.errors.iter().any(|e| e.starts_with(delimiter_error)),
                "{expression}: {:?}",
                report.errors
            );
            assert!(
                report.errors.iter().any(|e| e.starts_with("Unclosed quote")),
                "{expression}: {:?}",
                report.errors
            );
        }
    }

    #[test]
    fn test_lone_unclosed_quote() {
        let report = validate("SUM(Sales[Amount]) + 'Sales");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Unclosed quote"));
    }
}
