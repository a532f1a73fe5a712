//! `fundamentals` subcommand

use anyhow::Context;
use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use research_fundamentals::{
    DcfAssumptions, FinancialSnapshot, FundamentalAnalysis, analyze, format_market_cap,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Args, Debug)]
pub struct FundamentalsArgs {
    /// Financial snapshot (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Discount rate for the DCF
    #[arg(long, default_value_t = 0.1)]
    pub wacc: f64,

    /// DCF forecast horizon in years
    #[arg(long, default_value_t = 5)]
    pub years: u32,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn analysis_table(analysis: &FundamentalAnalysis) -> Table {
    let ratios = &analysis.key_ratios;
    let growth = &analysis.growth_rates;
    let reading = &analysis.interpretations;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Value", "Reading"]);

    let name = analysis
        .company_name
        .clone()
        .unwrap_or_else(|| analysis.symbol.clone());
    table.add_row(vec![
        "Company".to_string(),
        name,
        analysis.sector.clone().unwrap_or_default(),
    ]);
    table.add_row(vec![
        "Market Cap".to_string(),
        analysis
            .valuation
            .market_cap
            .map_or_else(|| "N/A".to_string(), format_market_cap),
        String::new(),
    ]);
    table.add_row(vec![
        "P/E".to_string(),
        ratio(ratios.pe_ratio),
        reading.pe_ratio.to_string(),
    ]);
    table.add_row(vec![
        "P/B".to_string(),
        ratio(ratios.pb_ratio),
        String::new(),
    ]);
    table.add_row(vec![
        "Debt/Equity".to_string(),
        ratio(ratios.debt_to_equity),
        reading.debt_to_equity.to_string(),
    ]);
    table.add_row(vec![
        "ROE".to_string(),
        percent(ratios.roe),
        reading.roe.to_string(),
    ]);
    table.add_row(vec![
        "Net Margin".to_string(),
        percent(ratios.net_profit_margin),
        String::new(),
    ]);
    table.add_row(vec![
        "Revenue Growth (YoY)".to_string(),
        percent(growth.revenue_growth_yoy),
        reading.revenue_growth.to_string(),
    ]);
    table.add_row(vec![
        "Net Income Growth (YoY)".to_string(),
        percent(growth.net_income_growth_yoy),
        String::new(),
    ]);
    table.add_row(vec![
        "DCF Value".to_string(),
        analysis
            .dcf_value
            .map_or_else(|| "N/A".to_string(), format_market_cap),
        format!(
            "WACC {:.1}%, {} years",
            analysis.assumptions.wacc * 100.0,
            analysis.assumptions.years
        ),
    ]);
    table.add_row(vec![
        "Last Updated".to_string(),
        analysis.last_updated.to_string(),
        format!("retrieved {}", analysis.retrieved_on),
    ]);
    table
}

/// Command output: pretty JSON or a table
fn render(analysis: &FundamentalAnalysis, json: bool) -> anyhow::Result<String> {
    if json {
        serde_json::to_string_pretty(analysis).context("Failed to serialize analysis")
    } else {
        Ok(analysis_table(analysis).to_string())
    }
}

pub fn run(args: &FundamentalsArgs) -> anyhow::Result<ExitCode> {
    let snapshot = FinancialSnapshot::from_file(&args.input)
        .with_context(|| format!("Failed to read snapshot from {}", args.input.display()))?;

    let assumptions = DcfAssumptions {
        wacc: args.wacc,
        years: args.years,
        ..DcfAssumptions::default()
    };

    info!("Analyzing {}", snapshot.symbol);
    let analysis = analyze(&snapshot, assumptions);
    println!("{}", render(&analysis, args.json)?);

    Ok(ExitCode::SUCCESS)
}
