use nabz_core::domain::market::{ExtendedAnalysis, MarketItem, Opportunity, Trend};
use nabz_core::gateway::{AnalysisOutcome, DashboardData, KeyedAnalysis};
use nabz_core::time::iran::DateInfo;
use std::fmt;

pub struct DashboardReport<'a> {
    pub date: &'a DateInfo,
    pub data: &'a DashboardData,
}

impl fmt::Display for DashboardReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== نبض بازار | {} ==", self.date.shamsi)?;
        writeln!(f, "{}\n", self.data.sentiment)?;

        writeln!(f, "== قیمت‌های لحظه‌ای ==")?;
        for item in &self.data.prices {
            write_price(f, item)?;
        }

        writeln!(f, "\n== فرصت‌های معاملاتی ==")?;
        for (idx, opp) in self.data.opportunities.iter().enumerate() {
            write!(f, "{:>2}. ", idx + 1)?;
            write_opportunity(f, opp)?;
        }
        Ok(())
    }
}

pub struct AnalysisReport<'a>(pub &'a AnalysisOutcome);

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_keyed(f, &self.0.primary)?;
        if let Some(comparison) = &self.0.comparison {
            writeln!(f)?;
            write_keyed(f, comparison)?;
        }
        Ok(())
    }
}

fn write_price(f: &mut fmt::Formatter<'_>, item: &MarketItem) -> fmt::Result {
    let arrow = match item.trend() {
        Trend::Up => '▲',
        Trend::Down => '▼',
        Trend::Flat => '=',
    };
    writeln!(
        f,
        "{:<24} {:<8} {:>16.0} {arrow} {:+.2}% ({:+.0})",
        item.name, item.symbol, item.price, item.change_percent, item.change
    )
}

fn write_opportunity(f: &mut fmt::Formatter<'_>, opp: &Opportunity) -> fmt::Result {
    writeln!(
        f,
        "{} ({}) بازده={} ریسک={} توصیه={}",
        opp.name,
        opp.symbol,
        opp.expected_return,
        opp.risk_level.label(),
        opp.recommendation.label()
    )
}

fn write_keyed(f: &mut fmt::Formatter<'_>, keyed: &KeyedAnalysis) -> fmt::Result {
    let ExtendedAnalysis {
        result,
        political_impact,
        historical_context,
        data_date,
    } = &keyed.analysis;

    writeln!(f, "== {} ==", keyed.query)?;
    writeln!(
        f,
        "{} | confidence {}% | data as of {}",
        result.recommendation.label(),
        result.confidence,
        data_date
    )?;
    writeln!(f, "technical: {}", result.technical_summary)?;
    writeln!(f, "fundamental: {}", result.fundamental_summary)?;
    writeln!(f, "political: {political_impact}")?;
    writeln!(f, "history: {historical_context}")?;

    let targets: Vec<String> = result.targets.iter().map(|t| format!("{t:.0}")).collect();
    writeln!(f, "targets: {} | stop-loss: {:.0}", targets.join(", "), result.stop_loss)?;

    for risk in &result.risks {
        writeln!(f, "  - {risk}")?;
    }
    for source in &result.sources {
        writeln!(f, "  [{}] {}", source.title, source.uri)?;
    }
    Ok(())
}
