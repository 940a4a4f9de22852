use csv_financial_analyst::{AnalysisClient, AnalystConfig, FinancialAnalysis};
use anyhow::{anyhow, Result};
use dotenv::dotenv;

fn print_report(analysis: &FinancialAnalysis) {
    println!("\n📊 SUMMARY");
    for card in &analysis.summary_cards {
        println!("  {:<24} {:>20}  ({})", card.title, card.value, card.change);
    }

    println!("\n📄 INCOME STATEMENT");
    for item in &analysis.income_statement {
        let marker = if item.is_bold { "*" } else { " " };
        println!(" {}{:<30} {:>20}", marker, item.label, item.value);
    }

    println!("\n📐 RATIOS");
    for group in &analysis.ratios {
        println!("  {}", group.category.as_str());
        for ratio in &group.ratios {
            println!("    {:<28} {:>12}  {}", ratio.name, ratio.value, ratio.insight);
        }
    }

    let breakeven = &analysis.analyst_view.breakeven_analysis;
    println!(
        "\n⚖️  Breakeven revenue: {} (current revenue {:.2})",
        breakeven.breakeven_revenue, breakeven.current_revenue_value
    );

    println!("\n📝 EXECUTIVE SUMMARY");
    for paragraph in &analysis.executive_summary {
        println!("  - {}", paragraph);
    }

    println!("\n⚠️  KEY RISKS");
    for risk in &analysis.key_risks {
        println!("  - {} → {}", risk.risk, risk.recommendation);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: analyze_csv <transactions.csv> [question]"))?;
    let question = std::env::args().nth(2);

    let client = AnalysisClient::new(AnalystConfig::from_env()?)?;
    let csv = std::fs::read_to_string(&path)?;
    println!("✅ Loaded {} ({} bytes)", path, csv.len());

    let outlets = client.get_outlets(&csv).await;
    if outlets.is_empty() {
        println!("🏬 No outlet column detected, running a consolidated analysis.");
    } else {
        println!("🏬 Outlets: {}", outlets.join(", "));
    }

    let analysis = client.analyze_financial_data(&csv, None).await?;
    print_report(&analysis);

    for outlet in &outlets {
        match client.analyze_financial_data(&csv, Some(outlet.as_str())).await {
            Ok(report) => println!(
                "\n🏬 {}: {}",
                outlet,
                report.executive_summary.first().map(String::as_str).unwrap_or("-")
            ),
            Err(e) => eprintln!("❌ {}: {}", outlet, e),
        }
    }

    let forecast = client.get_updated_forecast(&csv, 5.0, 2.0).await?;
    println!("\n🔮 Forecast (+5% revenue, +2% expenses): {}", forecast);

    if let Some(question) = question {
        let answer = client.query_data(&csv, &question).await?;
        println!("\n💬 {}\n{}", question, answer);
    }

    Ok(())
}
