// Prompt text for the four analyst operations.

use crate::schema::RatioCategoryName;

/// Budget used for the variance analysis, as a share of actuals.
pub const BUDGET_REVENUE_FACTOR: f64 = 1.05;
pub const BUDGET_EXPENSE_FACTOR: f64 = 0.95;

/// Ratios that must come back as a time series in `ratioTrendAnalysis`.
pub const RATIO_TREND_SERIES: [&str; 3] =
    ["Net Profit Margin", "Current Ratio", "Cash Conversion Cycle"];

pub const CONSOLIDATED_SCOPE: &str = "Analyze the data for ALL outlets combined. Produce a single consolidated report covering the entire business.";

const ANALYST_ROLE: &str = r#"
You are a senior financial analyst and chartered accountant.
You receive raw transaction data exported as CSV. Derive everything you report from that data.
"#;

const ANALYSIS_REQUIREMENTS: &str = r#"
## REQUIRED OUTPUT

### 1. Financial Statements
- `incomeStatement`, `balanceSheet`, `cashFlowStatement`: ordered line items.
- Set `isBold: true` on subtotal and total lines (Gross Profit, Total Assets, Net Cash Flow, ...).
- Provide `incomeStatementChartData`, `balanceSheetChartData` and `cashFlowChartData`: a short summary chart for each statement with parallel `labels` and raw numeric `data` of equal length.

### 2. Summary & Commentary
- `summaryCards`: headline KPIs with the period change; `changeType` is "positive" when the change is favourable, otherwise "negative".
- `pnlInterpretation`: a plain-language reading of the income statement.
- `executiveSummary`: 3-5 short paragraphs, most important first.
- `keyRisks`: each risk paired with a concrete `recommendation`.
"#;

const ANALYST_VIEW_REQUIREMENTS: &str = r#"
### 4. Analyst View
- `trendAnalysis`: revenue, expenses and net income per period, chronological.
- `expenseBreakdown`: total per expense category.
- `waterfallAnalysis`: the bridge from revenue to net income; deductions are negative.
- `breakevenAnalysis`: `breakevenRevenue` as a formatted string AND `breakevenRevenueValue` / `currentRevenueValue` as raw numbers.
- `ratiosInterpretation`, `insights` and `forecast`: concise narrative.
"#;

const OUTPUT_RULES: &str = r#"
## OUTPUT RULES
- Return ONLY JSON matching the response schema. Every field is required.
- Numeric fields (`data`, `actual`, `budget`, `variance`, ...) are raw numbers without symbols or separators.
- Display fields (`value`, `change`, `breakevenRevenue`) use the currency convention above.
"#;

/// The currency convention shared by every operation.
pub fn currency_rule(currency_code: &str) -> String {
    format!(
        "Format every monetary amount as \"{code} 1,234,567.89\": the three-letter code {code}, a space, thousands separators and exactly two decimal places.",
        code = currency_code
    )
}

/// Scope sentence for a full analysis: one outlet, or the whole business.
pub fn scope_instruction(outlet: Option<&str>) -> String {
    match outlet {
        Some(name) => format!(
            "Analyze ONLY the data for the outlet \"{name}\". Filter every transaction, statement, ratio, chart and comment to rows belonging to \"{name}\" and ignore all other outlets.",
            name = name
        ),
        None => CONSOLIDATED_SCOPE.to_string(),
    }
}

fn ratio_requirements() -> String {
    let mut section = String::from(
        "\n### 3. Ratios\nGroup ratios under the categories Profitability, Liquidity, Solvency and Efficiency. \
         Each ratio needs `name`, a formatted `value`, a short `insight` and a `definition`. \
         You MUST include at least the following ratios; add others where the data supports them:\n",
    );
    for category in RatioCategoryName::ALL {
        section.push_str(&format!(
            "- {}: {}\n",
            category.as_str(),
            category.mandated_ratios().join(", ")
        ));
    }
    section.push_str(&format!(
        "- `ratioTrendAnalysis`: a per-period series for at least {}.\n",
        RATIO_TREND_SERIES.join(", ")
    ));
    section.push_str(&format!(
        "- `varianceAnalysis`: compare actuals against a budget where budgeted revenue = {:.0}% of actual revenue and budgeted expenses = {:.0}% of actual expenses. Report `actual`, `budget`, `variance` and `variancePercent` per metric.\n",
        BUDGET_REVENUE_FACTOR * 100.0,
        BUDGET_EXPENSE_FACTOR * 100.0
    ));
    section
}

pub fn analysis_prompt(csv_data: &str, outlet: Option<&str>, currency_code: &str) -> String {
    format!(
        "{role}\n## SCOPE\n{scope}\n\n## CURRENCY\n{currency}\n{requirements}{ratios}{view}{rules}\n## CSV DATA\n```csv\n{csv}\n```\n",
        role = ANALYST_ROLE.trim(),
        scope = scope_instruction(outlet),
        currency = currency_rule(currency_code),
        requirements = ANALYSIS_REQUIREMENTS,
        ratios = ratio_requirements(),
        view = ANALYST_VIEW_REQUIREMENTS,
        rules = OUTPUT_RULES,
        csv = csv_data
    )
}

pub fn forecast_prompt(
    csv_data: &str,
    revenue_growth_pct: f64,
    expense_growth_pct: f64,
    currency_code: &str,
) -> String {
    format!(
        "{role}\n\
         Using the historical data below, project the next period assuming revenue changes by {revenue:+.2}% and expenses change by {expense:+.2}% period over period.\n\
         Answer in 2-3 sentences covering projected revenue, expenses and net income. Plain text only, no headings or lists.\n\
         {currency}\n\n\
         ## CSV DATA\n```csv\n{csv}\n```\n",
        role = ANALYST_ROLE.trim(),
        revenue = revenue_growth_pct,
        expense = expense_growth_pct,
        currency = currency_rule(currency_code),
        csv = csv_data
    )
}

pub fn outlets_prompt(csv_data: &str) -> String {
    format!(
        "Inspect the CSV data below and decide whether it has a column identifying an outlet, branch, store or location.\n\
         - If it does, return a JSON array of the distinct values of that column as strings, in order of first appearance.\n\
         - If it does not, return an empty JSON array: []\n\
         Return ONLY the JSON array.\n\n\
         ## CSV DATA\n```csv\n{}\n```\n",
        csv_data
    )
}

pub fn query_prompt(csv_data: &str, query: &str, currency_code: &str) -> String {
    format!(
        "{role}\n\
         Answer the question using ONLY the CSV data below. Do not use outside knowledge or assumptions.\n\
         If the data is insufficient to answer, say so plainly and explain what is missing. Never invent figures.\n\
         {currency}\n\n\
         ## QUESTION\n{query}\n\n\
         ## CSV DATA\n```csv\n{csv}\n```\n",
        role = ANALYST_ROLE.trim(),
        currency = currency_rule(currency_code),
        query = query.trim(),
        csv = csv_data
    )
}
