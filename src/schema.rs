use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum RatioCategoryName {
    Profitability,
    Liquidity,
    Solvency,
    Efficiency,
}

impl RatioCategoryName {
    pub const ALL: [RatioCategoryName; 4] = [
        RatioCategoryName::Profitability,
        RatioCategoryName::Liquidity,
        RatioCategoryName::Solvency,
        RatioCategoryName::Efficiency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioCategoryName::Profitability => "Profitability",
            RatioCategoryName::Liquidity => "Liquidity",
            RatioCategoryName::Solvency => "Solvency",
            RatioCategoryName::Efficiency => "Efficiency",
        }
    }

    /// Ratios the model must return for this category, at minimum.
    pub fn mandated_ratios(&self) -> &'static [&'static str] {
        match self {
            RatioCategoryName::Profitability => &[
                "Gross Profit Margin",
                "Operating Profit Margin",
                "Net Profit Margin",
                "Return on Assets",
                "Return on Equity",
            ],
            RatioCategoryName::Liquidity => &["Current Ratio", "Quick Ratio", "Cash Ratio"],
            RatioCategoryName::Solvency => &[
                "Debt-to-Equity Ratio",
                "Debt Ratio",
                "Interest Coverage Ratio",
            ],
            RatioCategoryName::Efficiency => &[
                "Asset Turnover",
                "Inventory Turnover",
                "Days Sales Outstanding",
                "Days Inventory Outstanding",
                "Days Payable Outstanding",
                "Cash Conversion Cycle",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    #[schemars(description = "Metric name, e.g. 'Total Revenue' or 'Net Income'")]
    pub title: String,

    #[schemars(description = "Formatted value using the requested currency convention")]
    pub value: String,

    #[schemars(description = "Formatted change versus the previous period, e.g. '+12.5%'")]
    pub change: String,

    #[schemars(description = "Whether the change is favourable ('positive') or unfavourable ('negative')")]
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementItem {
    #[schemars(description = "Line item label as it should appear in the statement")]
    pub label: String,

    #[schemars(description = "Formatted amount using the requested currency convention")]
    pub value: String,

    #[schemars(description = "True for subtotal and total lines that should be rendered in bold")]
    pub is_bold: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    #[schemars(description = "Category or period labels, one per data point")]
    pub labels: Vec<String>,

    #[schemars(description = "Raw numeric values, same length and order as labels")]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ratio {
    pub name: String,

    #[schemars(description = "Formatted ratio value, e.g. '1.85x', '23.4%' or '42 days'")]
    pub value: String,

    #[schemars(description = "One or two sentences interpreting this value for the business")]
    pub insight: String,

    #[schemars(description = "Formula and plain-language definition of the ratio")]
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatioCategory {
    pub category: RatioCategoryName,
    pub ratios: Vec<Ratio>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyRisk {
    pub risk: String,

    #[schemars(description = "Concrete action that mitigates the risk")]
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub summary: String,

    #[schemars(description = "Period labels in chronological order")]
    pub labels: Vec<String>,

    pub revenue: Vec<f64>,
    pub expenses: Vec<f64>,
    pub net_income: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub summary: String,

    #[schemars(description = "Expense category names")]
    pub labels: Vec<String>,

    #[schemars(description = "Total amount per expense category")]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VarianceItem {
    #[schemars(description = "Metric compared against budget, e.g. 'Revenue' or 'Total Expenses'")]
    pub metric: String,
    pub actual: f64,
    pub budget: f64,
    pub variance: f64,
    pub variance_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VarianceAnalysis {
    pub summary: String,
    pub items: Vec<VarianceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallStep {
    pub label: String,

    #[schemars(description = "Signed contribution of this step; negative for deductions")]
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallAnalysis {
    pub summary: String,

    #[schemars(description = "Bridge from revenue to net income, in order")]
    pub steps: Vec<WaterfallStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatioSeries {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatioTrendAnalysis {
    pub summary: String,
    pub labels: Vec<String>,

    #[schemars(
        description = "One series per ratio; must include Net Profit Margin, Current Ratio and Cash Conversion Cycle"
    )]
    pub series: Vec<RatioSeries>,
}

/// Breakeven carries both a display string and the raw numbers so a UI can
/// format consistently while chart code works on the numeric forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BreakevenAnalysis {
    #[schemars(description = "Breakeven revenue formatted using the requested currency convention")]
    pub breakeven_revenue: String,

    #[schemars(description = "Breakeven revenue as a raw number")]
    pub breakeven_revenue_value: f64,

    #[schemars(description = "Current revenue as a raw number")]
    pub current_revenue_value: f64,

    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalystView {
    #[schemars(description = "Key insights an analyst would highlight")]
    pub insights: String,

    pub trend_analysis: TrendAnalysis,
    pub expense_breakdown: ExpenseBreakdown,

    #[schemars(description = "Actuals against a budget of 105% of actual revenue and 95% of actual expenses")]
    pub variance_analysis: VarianceAnalysis,

    pub waterfall_analysis: WaterfallAnalysis,
    pub ratio_trend_analysis: RatioTrendAnalysis,
    pub ratios_interpretation: String,
    pub breakeven_analysis: BreakevenAnalysis,

    #[schemars(description = "Short forward-looking projection")]
    pub forecast: String,
}

/// The complete report produced by a full analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    #[schemars(description = "Headline KPI cards, e.g. revenue, expenses, net income, cash position")]
    pub summary_cards: Vec<SummaryCard>,

    pub income_statement: Vec<StatementItem>,
    pub balance_sheet: Vec<StatementItem>,
    pub cash_flow_statement: Vec<StatementItem>,

    #[schemars(description = "Interpretation of the profit and loss statement")]
    pub pnl_interpretation: String,

    #[schemars(description = "Ratio groups, one per category")]
    pub ratios: Vec<RatioCategory>,

    #[schemars(description = "Executive summary as an ordered list of short paragraphs")]
    pub executive_summary: Vec<String>,

    pub key_risks: Vec<KeyRisk>,
    pub analyst_view: AnalystView,

    #[schemars(description = "Summary chart of the income statement")]
    pub income_statement_chart_data: ChartData,

    #[schemars(description = "Summary chart of the balance sheet")]
    pub balance_sheet_chart_data: ChartData,

    #[schemars(description = "Summary chart of the cash flow statement")]
    pub cash_flow_chart_data: ChartData,
}

impl FinancialAnalysis {
    pub fn generate_json_schema() -> RootSchema {
        schemars::schema_for!(FinancialAnalysis)
    }

    /// The Gemini-compatible response schema sent with every analysis request.
    pub fn response_schema() -> serde_json::Result<Value> {
        clean_schema(Self::generate_json_schema())
    }

    pub fn find_ratio_category(&self, name: RatioCategoryName) -> Option<&RatioCategory> {
        self.ratios.iter().find(|c| c.category == name)
    }
}

/// Generates a Gemini-compatible JSON schema (no $ref, $schema, or definitions)
pub fn gemini_response_schema<T: JsonSchema>() -> serde_json::Result<Value> {
    clean_schema(schemars::schema_for!(T))
}

const DROPPED_KEYS: &[&str] = &[
    "$schema",
    "$id",
    "title",
    "definitions",
    "additionalProperties",
    "default",
    "examples",
];

const GEMINI_FORMATS: &[&str] = &["float", "double", "int32", "int64", "enum", "date-time"];

/// Rewrites a schemars root schema into the OpenAPI subset Gemini accepts.
pub fn clean_schema(root: RootSchema) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(root)?;
    let definitions = value
        .as_object_mut()
        .and_then(|map| map.remove("definitions"))
        .unwrap_or_else(|| Value::Object(Map::new()));

    Ok(clean_node(value, &definitions))
}

fn clean_node(node: Value, definitions: &Value) -> Value {
    match node {
        Value::Object(mut map) => {
            if let Some(Value::String(reference)) = map.remove("$ref") {
                let name = reference.trim_start_matches("#/definitions/");
                if let Some(target) = definitions.get(name) {
                    absorb(&mut map, clean_node(target.clone(), definitions));
                }
            }

            if let Some(Value::Array(mut all_of)) = map.remove("allOf") {
                if all_of.len() == 1 {
                    absorb(&mut map, clean_node(all_of.remove(0), definitions));
                } else {
                    let cleaned = all_of
                        .into_iter()
                        .map(|s| clean_node(s, definitions))
                        .collect();
                    map.insert("allOf".to_string(), Value::Array(cleaned));
                }
            }

            for key in DROPPED_KEYS {
                map.remove(*key);
            }

            let mut out = Map::new();
            for (key, value) in map {
                match key.as_str() {
                    "type" => {
                        let (type_name, nullable) = normalize_type(&value);
                        if let Some(type_name) = type_name {
                            out.insert("type".to_string(), Value::String(type_name));
                        }
                        if nullable {
                            out.insert("nullable".to_string(), Value::Bool(true));
                        }
                    }
                    "format" => {
                        if value.as_str().is_some_and(|f| GEMINI_FORMATS.contains(&f)) {
                            out.insert(key, value);
                        }
                    }
                    "properties" => {
                        let properties = match value {
                            Value::Object(props) => props
                                .into_iter()
                                .map(|(name, schema)| (name, clean_node(schema, definitions)))
                                .collect(),
                            _ => Map::new(),
                        };
                        let ordering = properties
                            .keys()
                            .map(|k| Value::String(k.clone()))
                            .collect();
                        out.insert("properties".to_string(), Value::Object(properties));
                        out.insert("propertyOrdering".to_string(), Value::Array(ordering));
                    }
                    _ => {
                        out.insert(key, clean_node(value, definitions));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| clean_node(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

// Keys already on the referencing node (usually `description`) win.
fn absorb(map: &mut Map<String, Value>, resolved: Value) {
    if let Value::Object(resolved) = resolved {
        for (key, value) in resolved {
            map.entry(key).or_insert(value);
        }
    }
}

fn normalize_type(value: &Value) -> (Option<String>, bool) {
    match value {
        Value::String(name) => (Some(name.to_uppercase()), false),
        Value::Array(names) => {
            let nullable = names.iter().any(|n| n.as_str() == Some("null"));
            let name = names
                .iter()
                .filter_map(Value::as_str)
                .find(|n| *n != "null")
                .map(str::to_uppercase);
            (name, nullable)
        }
        _ => (None, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP_LEVEL: [&str; 12] = [
        "summaryCards",
        "incomeStatement",
        "balanceSheet",
        "cashFlowStatement",
        "pnlInterpretation",
        "ratios",
        "executiveSummary",
        "keyRisks",
        "analystView",
        "incomeStatementChartData",
        "balanceSheetChartData",
        "cashFlowChartData",
    ];

    #[test]
    fn test_schema_generation() {
        let schema = FinancialAnalysis::response_schema().unwrap();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert!(!text.contains("$schema"));
        assert_eq!(schema["type"], "OBJECT");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for field in TOP_LEVEL {
            assert!(required.contains(&field), "missing required {}", field);
        }
    }

    #[test]
    fn test_enums_are_inlined() {
        let schema = FinancialAnalysis::response_schema().unwrap();

        let change_type = &schema["properties"]["summaryCards"]["items"]["properties"]["changeType"];
        assert_eq!(change_type["type"], "STRING");
        assert_eq!(change_type["enum"], serde_json::json!(["positive", "negative"]));
        assert!(change_type["description"].as_str().unwrap().contains("favourable"));

        let category = &schema["properties"]["ratios"]["items"]["properties"]["category"];
        assert_eq!(
            category["enum"],
            serde_json::json!(["Profitability", "Liquidity", "Solvency", "Efficiency"])
        );
    }

    #[test]
    fn test_analyst_view_groups_required() {
        let schema = FinancialAnalysis::response_schema().unwrap();
        let view = &schema["properties"]["analystView"];
        assert_eq!(view["type"], "OBJECT");

        let required = view["required"].as_array().unwrap();
        for group in [
            "insights",
            "trendAnalysis",
            "expenseBreakdown",
            "varianceAnalysis",
            "waterfallAnalysis",
            "ratioTrendAnalysis",
            "ratiosInterpretation",
            "breakevenAnalysis",
            "forecast",
        ] {
            assert!(required.iter().any(|r| r == group), "missing {}", group);
        }

        let breakeven = &view["properties"]["breakevenAnalysis"];
        assert_eq!(breakeven["properties"]["breakevenRevenueValue"]["type"], "NUMBER");
        assert_eq!(breakeven["properties"]["breakevenRevenue"]["type"], "STRING");
    }

    #[test]
    fn test_property_ordering_follows_declaration() {
        let schema = FinancialAnalysis::response_schema().unwrap();
        let ordering = schema["propertyOrdering"].as_array().unwrap();
        assert_eq!(ordering[0], "summaryCards");
        assert_eq!(ordering.len(), TOP_LEVEL.len());
    }

    #[test]
    fn test_nested_schema_matches_embedded_node() {
        let raw = serde_json::to_string(&FinancialAnalysis::generate_json_schema()).unwrap();
        assert!(raw.contains("$ref"));

        let standalone = gemini_response_schema::<BreakevenAnalysis>().unwrap();
        let full = FinancialAnalysis::response_schema().unwrap();
        let embedded = &full["properties"]["analystView"]["properties"]["breakevenAnalysis"];

        assert_eq!(standalone["properties"], embedded["properties"]);
        assert_eq!(standalone["required"], embedded["required"]);
    }

    #[test]
    fn test_nullable_types() {
        let (name, nullable) = normalize_type(&serde_json::json!(["string", "null"]));
        assert_eq!(name.as_deref(), Some("STRING"));
        assert!(nullable);
    }

    #[test]
    fn test_mandated_ratios_cover_every_category() {
        for category in RatioCategoryName::ALL {
            assert!(!category.mandated_ratios().is_empty());
        }
        assert!(RatioCategoryName::Efficiency
            .mandated_ratios()
            .contains(&"Cash Conversion Cycle"));
    }
}
