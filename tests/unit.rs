//! Unit tests for core Annai functionality.
mod common;
use annai::compiler::parsing::{OperatorTable, builtin_operator};
use annai::graph::{
    Combinator, Condition, DisplayItem, InputType, Operator, Predicate, ValidationFailure,
    ValidationSpec, format_number, parse_number,
};
use annai::prelude::*;
use annai::source::is_amount_like;
use common::*;
use std::collections::BTreeMap;

#[test]
fn test_value_display() {
    assert_eq!(format!("{}", Value::Number(42.0)), "42");
    assert_eq!(format!("{}", Value::Number(1.5)), "1.5");
    assert_eq!(format!("{}", Value::from("deposit")), "deposit");
    assert_eq!(Value::Number(5000.0).as_text(), "5000");
    assert_eq!(Value::from(" 12 ").as_number(), Some(12.0));
    assert_eq!(format_number(-3.0), "-3");
}

#[test]
fn test_parse_number_is_strict() {
    assert_eq!(parse_number("1000"), Some(1000.0));
    assert_eq!(parse_number(" 2.5 "), Some(2.5));
    assert_eq!(parse_number("-7"), Some(-7.0));
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number("NaN"), None);
    assert_eq!(parse_number("1,000"), None);
    assert_eq!(parse_number(""), None);
}

#[test]
fn test_operator_coercion() {
    // Numeric when both sides parse.
    assert!(Operator::Greater.apply("10", "9"));
    assert!(Operator::Equals.apply("5000", "5000.0"));
    assert!(Operator::LessEquals.apply("200000", "200000"));
    assert!(!Operator::Greater.apply("200000", "200000"));
    // Lexical otherwise.
    assert!(Operator::Less.apply("apple", "banana"));
    assert!(Operator::Less.apply("10", "9a"));
    assert!(Operator::NotEquals.apply("deposit", "payment"));
    assert!(Operator::GreaterEquals.apply("b", "b"));

    assert!(Operator::Contains.apply("transferAmount", "Amount"));
    assert!(!Operator::Contains.apply("deposit", "Amount"));
    assert!(!Operator::Unknown("LIKE".to_string()).apply("a", "a"));
}

#[test]
fn test_operator_names() {
    assert_eq!(Operator::parse("GREATER_EQUALS"), Operator::GreaterEquals);
    assert_eq!(
        Operator::parse("EQUALS_LESS_THAN"),
        Operator::Unknown("EQUALS_LESS_THAN".to_string())
    );
    assert_eq!(Operator::LessEquals.to_string(), "LESS_EQUALS");

    assert_eq!(builtin_operator("EQUALS_LESS_THAN"), Some(Operator::LessEquals));
    assert_eq!(builtin_operator("EQUALS_GREATER_THAN"), Some(Operator::GreaterEquals));
    assert_eq!(builtin_operator("BETWEEN"), None);

    let mut table = OperatorTable::default();
    assert!(table.alias("GE", "GREATER_EQUALS"));
    assert!(!table.alias("XX", "NOT_A_COMPARATOR"));
    assert_eq!(table.normalize("n", "GE"), Operator::GreaterEquals);
    assert_eq!(table.normalize("n", "XX"), Operator::Equals);
}

#[test]
fn test_predicate_display() {
    let predicate = Predicate::new("transactionType", Operator::Equals, "deposit");
    assert_eq!(predicate.to_string(), "$transactionType == deposit");
    assert_eq!(
        Predicate::on_input(Operator::Greater, "200000").to_string(),
        "$input > 200000"
    );
}

#[test]
fn test_condition_evaluation() {
    let mut variables = BTreeMap::new();
    variables.insert("amount".to_string(), Value::Number(300.0));
    variables.insert("kind".to_string(), Value::from("payment"));

    let condition = Condition {
        combinator: Combinator::And,
        predicates: vec![
            Predicate::new("amount", Operator::GreaterEquals, "300"),
            Predicate::new("kind", Operator::Equals, "payment"),
        ],
    };
    assert!(condition.evaluate(&variables));

    let condition = Condition {
        combinator: Combinator::Or,
        predicates: vec![
            Predicate::new("amount", Operator::Less, "100"),
            Predicate::new("missing", Operator::NotEquals, ""),
        ],
    };
    assert!(!condition.evaluate(&variables));
}

#[test]
fn test_currency_formatting() {
    assert_eq!(PromptFormatter::format_currency(&Value::Number(5000.0)), "￥5,000");
    assert_eq!(PromptFormatter::format_currency(&Value::Number(999.0)), "￥999");
    assert_eq!(PromptFormatter::format_currency(&Value::Number(0.0)), "￥0");
    assert_eq!(
        PromptFormatter::format_currency(&Value::Number(10_000_000.0)),
        "￥10,000,000"
    );
    assert_eq!(PromptFormatter::format_currency(&Value::from("123456")), "￥123,456");
    assert_eq!(PromptFormatter::format_currency(&Value::Number(-1234.0)), "-￥1,234");
    assert_eq!(PromptFormatter::format_currency(&Value::from("未定")), "未定");
}

#[test]
fn test_display_item_formatting() {
    let graph = compile_atm();
    let mut variables = BTreeMap::new();
    variables.insert("transactionType".to_string(), Value::from("deposit"));
    variables.insert("depositAmount".to_string(), Value::Number(12345.0));

    let items = [
        DisplayItem {
            label: "取引種別".to_string(),
            field: "transactionType".to_string(),
            format: DisplayFormat::Code("transactionType".to_string()),
        },
        DisplayItem {
            label: "預入金額".to_string(),
            field: "depositAmount".to_string(),
            format: DisplayFormat::Currency,
        },
        DisplayItem {
            label: "口座番号".to_string(),
            field: "accountNumber".to_string(),
            format: DisplayFormat::Text,
        },
    ];
    let lines = PromptFormatter::format_items(&graph, &items, &variables);
    assert_eq!(lines, vec!["取引種別: 預入", "預入金額: ￥12,345", "口座番号: "]);

    assert_eq!(
        PromptFormatter::compose("確認してください", &lines[..1]),
        "確認してください\n\n取引種別: 預入"
    );
    assert_eq!(PromptFormatter::compose("こんにちは", &[]), "こんにちは");
}

#[test]
fn test_display_format_parsing() {
    assert_eq!(
        DisplayFormat::try_from("currency".to_string()),
        Ok(DisplayFormat::Currency)
    );
    assert_eq!(
        DisplayFormat::try_from("code:language".to_string()),
        Ok(DisplayFormat::Code("language".to_string()))
    );
    assert!(DisplayFormat::try_from("code:".to_string()).is_err());
    assert!(DisplayFormat::try_from("bold".to_string()).is_err());
    assert_eq!(DisplayFormat::Code("x".to_string()).to_string(), "code:x");
}

#[test]
fn test_validation_rules() {
    let number = ValidationSpec::number(1.0, 100.0);
    assert_eq!(number.input_type, InputType::Number);
    assert_eq!(number.validate("50", None), Ok(Value::Number(50.0)));
    assert_eq!(number.validate("", None), Err(ValidationFailure::Required));
    assert_eq!(
        number.validate("x", None),
        Err(ValidationFailure::NotANumber("x".to_string()))
    );
    assert_eq!(
        number.validate("0.5", None),
        Err(ValidationFailure::BelowMinimum { min: "1".to_string() })
    );
    assert_eq!(
        number.validate("101", None),
        Err(ValidationFailure::AboveMaximum { max: "100".to_string() })
    );

    let text = ValidationSpec {
        min_length: Some(3),
        ..ValidationSpec::text()
    };
    assert_eq!(text.validate("abc", None), Ok(Value::from("abc")));
    assert_eq!(
        text.validate("ab", None),
        Err(ValidationFailure::TooShort { min_length: 3 })
    );

    let pattern = regex::Regex::new("^[0-9]+$").unwrap();
    assert_eq!(
        ValidationSpec::text().validate("12a", Some(&pattern)),
        Err(ValidationFailure::PatternMismatch)
    );
}

#[test]
fn test_validation_messages() {
    let mut spec = ValidationSpec::number(1.0, 10.0);
    let failure = ValidationFailure::AboveMaximum { max: "10".to_string() };
    assert_eq!(spec.message_for(&failure), "The value must be at most 10");

    spec.error_message = Some("1から10で入力してください".to_string());
    assert_eq!(spec.message_for(&failure), "1から10で入力してください");
}

#[test]
fn test_amount_like_names() {
    assert!(is_amount_like("depositAmount"));
    assert!(is_amount_like("amount"));
    assert!(is_amount_like("transfer_amount"));
    assert!(!is_amount_like("accountNumber"));
    assert!(InputField::new("payoutAmount").is_amount());
    assert!(
        !InputField {
            amount: Some(false),
            ..InputField::new("payoutAmount")
        }
        .is_amount()
    );
}

#[test]
fn test_routing_table() {
    let routes = RoutingTable::default()
        .route("others", "search")
        .otherwise("branch");
    assert_eq!(routes.target_for("others"), Some("search"));
    assert_eq!(routes.target_for("mizuho"), Some("branch"));
    assert!(RoutingTable::default().target_for("x").is_none());
    assert!(RoutingTable::default().is_empty());
}

#[test]
fn test_error_display() {
    let err = CompileError::BranchCountMismatch {
        node_id: "transactionSwitch".to_string(),
        conditions: 3,
        branches: 2,
    };
    assert!(err.to_string().contains("transactionSwitch"));
    assert!(err.to_string().contains('3'));

    let integrity = IntegrityError::UncoveredChoice {
        screen: 4,
        label: "振込".to_string(),
    };
    assert_eq!(integrity.screen(), Some(4));
    assert!(integrity.to_string().contains("振込"));

    let dialogue = DialogueError::ScreenNotFound(999);
    assert!(dialogue.to_string().contains("999"));
}
