//! Diet Scenario Tests
//!
//! A small diet model exercising every check:
//! - foods(Name | Cost)
//! - categories(Name | Min Nutrition, Max Nutrition) with "Min Max Check"
//! - nutrition_quantities(Food, Category | Quantity) linked to both
//! - parameter "Minimum Nutrition Adjustment Factor" (default 0, min 0)

use serde_json::json;
use tabcheck::checker::{CheckKind, CheckOptions, IntegrityChecker, Verbosity};
use tabcheck::data::{Cell, DataSet, RowId};
use tabcheck::key;
use tabcheck::schema::{
    CompareOp, Comparison, DataType, ForeignKey, NumberRange, Parameter, RowPredicate, Schema,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn diet_schema() -> Schema {
    Schema::builder()
        .description("diet")
        .table("foods", &["Name"], &["Cost"])
        .table("categories", &["Name"], &["Min Nutrition", "Max Nutrition"])
        .table("nutrition_quantities", &["Food", "Category"], &["Quantity"])
        .data_type("foods", "Cost", DataType::number())
        .data_type(
            "nutrition_quantities",
            "Quantity",
            DataType::numeric(NumberRange::unbounded()),
        )
        .default_value("categories", "Max Nutrition", Cell::Number(f64::INFINITY))
        .predicate(
            "categories",
            RowPredicate::comparison(
                "Min Max Check",
                Comparison::new("Max Nutrition", CompareOp::Ge, "Min Nutrition"),
            ),
        )
        .parameter(
            ADJUSTMENT,
            Parameter::new(0).with_data_type(DataType::numeric(
                NumberRange::default().inclusive_max(true),
            )),
        )
        .predicate(
            "categories",
            RowPredicate::comparison(
                "Adjusted Min Check",
                Comparison::new("Max Nutrition", CompareOp::Ge, "Min Nutrition")
                    .with_parameter_factor(ADJUSTMENT),
            ),
        )
        .foreign_key("nutrition_quantities", "foods", &[("Food", "Name")])
        .foreign_key("nutrition_quantities", "categories", &[("Category", "Name")])
        .build()
        .unwrap()
}

const ADJUSTMENT: &str = "Minimum Nutrition Adjustment Factor";

fn foods_link() -> ForeignKey {
    ForeignKey::new("nutrition_quantities", "foods", &[("Food", "Name")])
}

fn clean_data(schema: &Schema) -> DataSet {
    DataSet::from_json(
        &json!({
            "foods": [["milk", 0.23], ["chicken", 2.4], ["pizza pie", 2.8]],
            "categories": [
                ["protein", 91, 200],
                ["fat", 0, 65],
                {"Name": "calories", "Min Nutrition": 1800}
            ],
            "nutrition_quantities": [
                ["milk", "protein", 8],
                ["milk", "fat", 2.5],
                ["chicken", "protein", 32],
                ["chicken", "fat", 10],
                ["pizza pie", "fat", 12]
            ]
        }),
        schema,
    )
    .unwrap()
}

fn with_rows(mut data: DataSet, table: &str, rows: serde_json::Value, schema: &Schema) -> DataSet {
    let extra = DataSet::from_json(&json!({ table: rows }), schema).unwrap();
    for row in extra.rows(table) {
        data.push_row(table, row.clone());
    }
    data
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_clean_data_reports_nothing() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = clean_data(&schema);

    assert!(checker.find_duplicates(&data).unwrap().is_empty());
    assert!(checker.find_data_type_failures(&data).unwrap().is_empty());
    assert!(checker
        .find_foreign_key_failures(&data, Verbosity::High)
        .unwrap()
        .is_empty());
    assert!(checker.find_data_row_failures(&data).unwrap().is_empty());
    assert!(checker
        .check_all(&data, &CheckOptions::default())
        .unwrap()
        .is_clean());
}

#[test]
fn test_duplicate_milk_fat() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = with_rows(
        clean_data(&schema),
        "nutrition_quantities",
        json!([["milk", "fat", 3.0]]),
        &schema,
    );

    let report = checker.find_duplicates(&data).unwrap();
    assert_eq!(report.len(), 1);
    let dups = report.get("nutrition_quantities").unwrap();
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[&key!["milk", "fat"]], 2);

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({"nutrition_quantities": [{"key": ["milk", "fat"], "count": 2}]})
    );
}

#[test]
fn test_empty_string_quantity() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = with_rows(
        clean_data(&schema),
        "nutrition_quantities",
        json!([["chicken", "calories", ""]]),
        &schema,
    );

    let report = checker.find_data_type_failures(&data).unwrap();
    assert_eq!(report.len(), 1);
    let failure = report.get("nutrition_quantities", "Quantity").unwrap();
    assert_eq!(
        failure.rows_for(&Cell::from("")).unwrap(),
        &[RowId::Key(key!["chicken", "calories"])]
    );
}

#[test]
fn test_bad_value_on_duplicated_key_uses_first_row() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let mut data = clean_data(&schema);
    data.insert_table("nutrition_quantities", vec![]);
    let data = with_rows(
        data,
        "nutrition_quantities",
        json!([["chicken", "fat", ""], ["chicken", "fat", 10]]),
        &schema,
    );

    let failure = checker
        .find_data_type_failures(&data)
        .unwrap()
        .get("nutrition_quantities", "Quantity")
        .cloned()
        .unwrap();
    assert_eq!(
        failure.rows_for(&Cell::from("")).unwrap(),
        &[RowId::Key(key!["chicken", "fat"])]
    );
}

#[test]
fn test_four_pizza_rows_against_pizza_pie() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = with_rows(
        clean_data(&schema),
        "nutrition_quantities",
        json!([
            ["pizza", "protein", 11],
            ["pizza", "fat", 12],
            ["pizza", "calories", 270],
            ["pizza", "sodium", 0.5]
        ]),
        &schema,
    );

    let report = checker.find_foreign_key_failures(&data, Verbosity::Low).unwrap();

    let foods = report.get(&foods_link()).unwrap();
    assert_eq!(foods.len(), 1);
    let offending = foods.rows_for(&key!["pizza"]).unwrap();
    assert_eq!(offending.row_ids.len(), 4);
    assert!(offending
        .row_ids
        .contains(&RowId::Key(key!["pizza", "calories"])));
    assert!(offending.rows.is_empty());

    // "sodium" is not a category either
    let categories: Vec<_> = report.between("nutrition_quantities", "categories").collect();
    assert_eq!(categories.len(), 1);
    assert!(categories[0].1.rows_for(&key!["sodium"]).is_some());

    // Adding the parent clears the link
    let fixed = with_rows(data, "foods", json!([["pizza", 3.0]]), &schema);
    let report = checker.find_foreign_key_failures(&fixed, Verbosity::Low).unwrap();
    assert!(report.get(&foods_link()).is_none());
}

#[test]
fn test_high_verbosity_carries_row_contents() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = with_rows(
        clean_data(&schema),
        "nutrition_quantities",
        json!([["pizza", "fat", 12]]),
        &schema,
    );

    let report = checker.find_foreign_key_failures(&data, Verbosity::High).unwrap();
    let offending = report
        .get(&foods_link())
        .and_then(|f| f.rows_for(&key!["pizza"]))
        .unwrap();
    assert_eq!(offending.rows.len(), 1);
    assert_eq!(offending.rows[0]["Quantity"], Cell::from(12));
}

#[test]
fn test_min_max_check() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let mut data = clean_data(&schema);
    data.insert_table("categories", vec![]);
    let data = with_rows(
        data,
        "categories",
        json!([["fat", 70, 65], ["protein", 91, 200], {"Name": "calories", "Min Nutrition": 1800}]),
        &schema,
    );

    let report = checker.find_data_row_failures(&data).unwrap();
    assert_eq!(report.len(), 1);
    let failure = report.get("categories", "Min Max Check").unwrap();
    assert_eq!(failure.rows(), &[RowId::Key(key!["fat"])]);
}

#[test]
fn test_check_all_bundles_every_category() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = with_rows(
        with_rows(
            clean_data(&schema),
            "nutrition_quantities",
            json!([["milk", "fat", 3.0], ["pizza", "fat", ""]]),
            &schema,
        ),
        "categories",
        json!([["sugar", 70, 65]]),
        &schema,
    );

    let report = checker.check_all(&data, &CheckOptions::default()).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.duplicates.as_ref().unwrap().len(), 1);
    assert_eq!(report.data_types.as_ref().unwrap().len(), 1);
    assert!(report.foreign_keys.as_ref().unwrap().get(&foods_link()).is_some());
    assert!(report
        .predicates
        .as_ref()
        .unwrap()
        .get("categories", "Min Max Check")
        .is_some());

    let only = CheckOptions::only([CheckKind::Predicates]);
    let report = checker.check_all(&data, &only).unwrap();
    assert!(report.duplicates.is_none());
    assert_eq!(report.violation_count(), 1);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["predicates"][0]["rows"][0]["row"], json!("sugar"));
}

#[test]
fn test_unrecognized_names() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();
    let data = DataSet::from_json(
        &json!({
            "Foods": [{"Name": "milk", "Cost": 1, "Colour": "white"}],
            "recipes": [{"Name": "soup"}]
        }),
        &schema,
    )
    .unwrap();

    let report = checker.find_unrecognized(&data);
    assert!(report.tables.contains("recipes"));
    assert!(report.fields["foods"].contains("Colour"));
}

#[test]
fn test_adjustment_factor_parameter() {
    let schema = diet_schema();
    let checker = IntegrityChecker::new(&schema).unwrap();

    // Default factor 0: every category passes the adjusted check
    let params = schema.full_parameters(&clean_data(&schema)).unwrap();
    assert_eq!(params.number(ADJUSTMENT), Some(0.0));

    let data = with_rows(
        clean_data(&schema),
        "parameters",
        json!([[ADJUSTMENT, 0.5]]),
        &schema,
    );
    assert!(checker.find_data_row_failures(&data).unwrap().is_empty());

    // At 2.5 protein needs a max of at least 227.5
    let data = with_rows(
        clean_data(&schema),
        "parameters",
        json!([[ADJUSTMENT, 2.5]]),
        &schema,
    );
    let failure = checker
        .find_data_row_failures(&data)
        .unwrap()
        .get("categories", "Adjusted Min Check")
        .cloned()
        .unwrap();
    assert_eq!(failure.rows(), &[RowId::Key(key!["protein"])]);

    // A negative factor fails its type, is reported, and the default applies
    let data = with_rows(
        clean_data(&schema),
        "parameters",
        json!([[ADJUSTMENT, -1]]),
        &schema,
    );
    let types = checker.find_data_type_failures(&data).unwrap();
    assert!(types.get("parameters", "Value").unwrap().rows_for(&Cell::from(-1)).is_some());
    assert!(checker.find_data_row_failures(&data).unwrap().is_empty());
}
