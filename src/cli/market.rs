//! Terminal rendering of the market data operations.

use super::ui;
use crate::core::{CompanyMatch, CompanySummary, MarketDataService, MarketSummary, PricePoint};
use anyhow::Result;
use comfy_table::{Attribute, Cell, Table};

pub async fn overview(service: &MarketDataService, symbol: &str, range: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {symbol}"));
    let summary = service.get_index_overview(symbol, range).await;
    pb.finish_and_clear();

    println!("{}", render_overview(&summary?));
    Ok(())
}

pub async fn company(service: &MarketDataService, symbol: &str, range: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {symbol}"));
    let summary = service.get_company_detail(symbol, range).await;
    pb.finish_and_clear();

    println!("{}", render_company(&summary?));
    Ok(())
}

pub async fn search(service: &MarketDataService, query: &str, limit: usize) -> Result<()> {
    let pb = ui::new_spinner(&format!("Searching \"{query}\""));
    let matches = service.search_companies(query, limit).await;
    pb.finish_and_clear();

    let matches = matches?;
    if matches.is_empty() {
        println!(
            "{}",
            ui::style_text("No matching companies", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", search_table(&matches));
    Ok(())
}

fn render_overview(summary: &MarketSummary) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Index"),
        ui::header_cell("Value"),
        ui::header_cell("Change"),
        ui::header_cell("Low"),
        ui::header_cell("High"),
    ]);
    table.add_row(vec![
        Cell::new(&summary.symbol),
        ui::number_cell(summary.current_value),
        ui::change_cell(summary.gain, summary.gain_percent),
        ui::number_cell(summary.day_range.low),
        ui::number_cell(summary.day_range.high),
    ]);

    let values: Vec<f64> = summary.chart.iter().map(|p| p.value).collect();
    format!(
        "{}\n{table}\n{}",
        ui::style_text(&summary.symbol, ui::StyleType::Title),
        chart_line(&summary.chart, &values)
    )
}

fn render_company(summary: &CompanySummary) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Value"),
        ui::header_cell("Change"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Prev Close"),
        ui::header_cell("Mkt Cap"),
        ui::header_cell("Volume"),
    ]);
    table.add_row(vec![
        ui::number_cell(summary.current_value),
        ui::change_cell(summary.gain, summary.gain_percent),
        ui::number_cell(summary.stats.open),
        ui::number_cell(summary.stats.high),
        ui::number_cell(summary.stats.low),
        ui::number_cell(summary.stats.prev_close),
        Cell::new(&summary.stats.market_cap),
        Cell::new(&summary.stats.volume),
    ]);

    let values: Vec<f64> = summary.chart.iter().map(|p| p.value).collect();
    format!(
        "{} {}\n{table}\n{}",
        ui::style_text(&summary.name, ui::StyleType::Title),
        ui::style_text(&format!("({})", summary.symbol), ui::StyleType::Subtle),
        chart_line(&summary.chart, &values)
    )
}

fn chart_line(chart: &[PricePoint], values: &[f64]) -> String {
    match (chart.first(), chart.last()) {
        (Some(first), Some(last)) => format!(
            "{} {} {}",
            ui::style_text(&first.time, ui::StyleType::Subtle),
            ui::sparkline(values),
            ui::style_text(&last.time, ui::StyleType::Subtle)
        ),
        _ => String::new(),
    }
}

fn search_table(matches: &[CompanyMatch]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Symbol"), ui::header_cell("Name")]);
    for m in matches {
        table.add_row(vec![
            Cell::new(&m.symbol).add_attribute(Attribute::Bold),
            Cell::new(&m.name),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{CompanyStats, DayRange};

    fn points() -> Vec<PricePoint> {
        vec![
            PricePoint {
                time: "09:15".to_string(),
                value: 100.0,
            },
            PricePoint {
                time: "09:20".to_string(),
                value: 98.0,
            },
        ]
    }

    #[test]
    fn test_render_overview() {
        let summary = MarketSummary {
            symbol: "^NSEI".to_string(),
            current_value: 98.0,
            gain: -2.0,
            gain_percent: -2.0,
            day_range: DayRange {
                low: 98.0,
                high: 100.0,
            },
            chart: points(),
        };

        let rendered = render_overview(&summary);
        assert!(rendered.contains("^NSEI"));
        assert!(rendered.contains("98.00"));
        assert!(rendered.contains("-2.00 (-2.00%)"));
        assert!(rendered.contains("09:15"));
        assert!(rendered.contains("09:20"));
    }

    #[test]
    fn test_render_company() {
        let summary = CompanySummary {
            symbol: "TCS.NS".to_string(),
            name: "Tata Consultancy Services".to_string(),
            current_value: 98.0,
            gain: -2.0,
            gain_percent: -2.0,
            stats: CompanyStats {
                open: 99.0,
                high: 102.0,
                low: 95.0,
                prev_close: 100.0,
                market_cap: "13.0T".to_string(),
                volume: "2.0K".to_string(),
            },
            chart: points(),
        };

        let rendered = render_company(&summary);
        assert!(rendered.contains("Tata Consultancy Services"));
        assert!(rendered.contains("13.0T"));
        assert!(rendered.contains("2.0K"));
    }

    #[test]
    fn test_search_table_lists_matches() {
        let table = search_table(&[CompanyMatch {
            symbol: "INFY.NS".to_string(),
            name: "Infosys Limited".to_string(),
        }]);
        let rendered = table.to_string();
        assert!(rendered.contains("INFY.NS"));
        assert!(rendered.contains("Infosys Limited"));
    }
}
