//! Structural checks applied to model responses before they are decoded.
//!
//! The model is asked to follow a response schema, but nothing guarantees it
//! did. [`validate_against_schema`] walks the same cleaned schema that was sent
//! with the request and reports every mismatch with its JSON path, so a shape
//! problem becomes an explicit error rather than a confusing decode failure.

use crate::error::ShapeViolation;
use crate::schema::{ChartData, FinancialAnalysis, RatioCategoryName};
use serde_json::Value;

/// How much checking happens between JSON parsing and typed decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseValidation {
    /// Walk the response schema first, then decode.
    #[default]
    Strict,
    /// Decode straight into the typed record.
    Typed,
}

/// Returns every place where `value` does not conform to `schema`.
///
/// `schema` must be in the cleaned Gemini form produced by
/// [`crate::schema::clean_schema`]. Required fields that are present but
/// `null` count as missing unless the property is marked `nullable`.
pub fn validate_against_schema(schema: &Value, value: &Value) -> Vec<ShapeViolation> {
    let mut violations = Vec::new();
    walk(schema, value, "$", &mut violations);
    violations
}

fn walk(schema: &Value, value: &Value, path: &str, out: &mut Vec<ShapeViolation>) {
    let nullable = schema
        .get("nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if value.is_null() {
        if !nullable {
            out.push(violation(path, "unexpected null"));
        }
        return;
    }

    let Some(type_name) = schema.get("type").and_then(Value::as_str) else {
        return;
    };

    match type_name {
        "OBJECT" => {
            let Some(object) = value.as_object() else {
                out.push(violation(path, &format!("expected object, found {}", kind_of(value))));
                return;
            };
            let properties = schema.get("properties").and_then(Value::as_object);

            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for field in required.iter().filter_map(Value::as_str) {
                    let field_nullable = properties
                        .and_then(|p| p.get(field))
                        .and_then(|s| s.get("nullable"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    match object.get(field) {
                        None => out.push(violation(
                            path,
                            &format!("missing required field `{}`", field),
                        )),
                        Some(Value::Null) if !field_nullable => out.push(violation(
                            path,
                            &format!("required field `{}` is null", field),
                        )),
                        _ => {}
                    }
                }
            }

            if let Some(properties) = properties {
                for (name, child_schema) in properties {
                    match object.get(name) {
                        Some(Value::Null) | None => {}
                        Some(child) => {
                            walk(child_schema, child, &format!("{}.{}", path, name), out)
                        }
                    }
                }
            }
        }
        "ARRAY" => {
            let Some(items) = value.as_array() else {
                out.push(violation(path, &format!("expected array, found {}", kind_of(value))));
                return;
            };
            if let Some(item_schema) = schema.get("items") {
                for (index, item) in items.iter().enumerate() {
                    walk(item_schema, item, &format!("{}[{}]", path, index), out);
                }
            }
        }
        "STRING" => match value.as_str() {
            None => out.push(violation(path, &format!("expected string, found {}", kind_of(value)))),
            Some(text) => {
                if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
                    if !allowed.iter().any(|a| a.as_str() == Some(text)) {
                        out.push(violation(
                            path,
                            &format!("`{}` is not one of {}", text, Value::Array(allowed.clone())),
                        ));
                    }
                }
            }
        },
        "NUMBER" => {
            if !value.is_number() {
                out.push(violation(path, &format!("expected number, found {}", kind_of(value))));
            }
        }
        "INTEGER" => {
            if !(value.is_i64() || value.is_u64()) {
                out.push(violation(path, &format!("expected integer, found {}", kind_of(value))));
            }
        }
        "BOOLEAN" => {
            if !value.is_boolean() {
                out.push(violation(path, &format!("expected boolean, found {}", kind_of(value))));
            }
        }
        _ => {}
    }
}

fn violation(path: &str, problem: &str) -> ShapeViolation {
    ShapeViolation {
        path: path.to_string(),
        problem: problem.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Soft findings on a decoded report. These never fail an analysis; they are
/// logged so a drifting prompt or model shows up in diagnostics.
pub fn advisory_warnings(analysis: &FinancialAnalysis) -> Vec<String> {
    let mut warnings = Vec::new();

    let charts = [
        ("incomeStatementChartData", &analysis.income_statement_chart_data),
        ("balanceSheetChartData", &analysis.balance_sheet_chart_data),
        ("cashFlowChartData", &analysis.cash_flow_chart_data),
    ];
    for (name, chart) in charts {
        check_chart_lengths(name, chart, &mut warnings);
    }

    let breakdown = &analysis.analyst_view.expense_breakdown;
    if breakdown.labels.len() != breakdown.data.len() {
        warnings.push(format!(
            "expenseBreakdown has {} labels but {} values",
            breakdown.labels.len(),
            breakdown.data.len()
        ));
    }

    for category in RatioCategoryName::ALL {
        let Some(group) = analysis.find_ratio_category(category) else {
            warnings.push(format!("ratio category {} is missing", category.as_str()));
            continue;
        };
        for required in category.mandated_ratios() {
            let present = group
                .ratios
                .iter()
                .any(|r| r.name.eq_ignore_ascii_case(required));
            if !present {
                warnings.push(format!(
                    "{} ratio '{}' was not returned",
                    category.as_str(),
                    required
                ));
            }
        }
    }

    warnings
}

fn check_chart_lengths(name: &str, chart: &ChartData, warnings: &mut Vec<String>) {
    if chart.labels.len() != chart.data.len() {
        warnings.push(format!(
            "{} has {} labels but {} values",
            name,
            chart.labels.len(),
            chart.data.len()
        ));
    }
}
