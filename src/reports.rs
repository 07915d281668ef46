use std::collections::BTreeMap;

use chrono::Local;
use log::{debug, info, warn};

use crate::color::{build_color_map, category_key, ColorMap};
use crate::config::Settings;
use crate::error::Result;
use crate::filter::{build_filters, render_filters};
use crate::normalize::normalize;
use crate::query::{QueryExecutor, QueryParams};
use crate::selection::validate;
use crate::style::{build_style_rules, chart_properties, ChartProperties};
use crate::types::{
    CategoryColor, PeriodMode, RecordPreviewRow, ReportKind, ReportSummary, Selection,
    TurnoverRecord,
};
use crate::util::{format_number, round_to};

pub const NO_DATA_MESSAGE: &str = "There are no data available!";
pub const CHART_SLOTS: u8 = 8;

/// Chart slot (1..=8) showing a report kind in a period mode. Each kind owns
/// two adjacent slots, fiscal-year first.
pub fn chart_slot(kind: ReportKind, mode: PeriodMode) -> u8 {
    let base = match kind {
        ReportKind::AllSuppliers => 1,
        ReportKind::Top5 => 3,
        ReportKind::SingleSupplier => 5,
        ReportKind::PurchaseTurnover => 7,
    };
    match mode {
        PeriodMode::FiscalYearWise => base,
        PeriodMode::QuarterlyWise => base + 1,
    }
}

/// The other slot of the same report kind.
pub fn partner_slot(slot: u8) -> u8 {
    if slot % 2 == 1 {
        slot + 1
    } else {
        slot - 1
    }
}

#[derive(Debug, Clone)]
pub struct ChartReport {
    pub selection: Selection,
    pub slot: u8,
    pub filter: Option<String>,
    pub records: Vec<TurnoverRecord>,
    pub colors: ColorMap,
    pub properties: ChartProperties,
}

#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// The query succeeded but returned no rows.
    NoData { slot: u8 },
    Chart(ChartReport),
}

impl ReportOutcome {
    pub fn slot(&self) -> u8 {
        match self {
            ReportOutcome::NoData { slot } => *slot,
            ReportOutcome::Chart(report) => report.slot,
        }
    }
}

/// Run one report: validate, query, normalize, color and style.
pub fn fetch_report<E: QueryExecutor>(
    executor: &E,
    selection: &Selection,
    settings: &Settings,
) -> Result<ReportOutcome> {
    validate(selection)?;

    let kind = selection.kind;
    let mode = selection.mode;
    let slot = chart_slot(kind, mode);
    let filters = build_filters(selection);
    let filter = render_filters(&filters);
    let params = QueryParams {
        filters,
        url_parameters: BTreeMap::from([("sap-client".to_string(), settings.sap_client.clone())]),
    };

    info!(
        "Fetching {} ({}) from {}",
        kind.tab_text(),
        mode.label(),
        kind.entity_set()
    );
    let mut records = executor.read_turnover(kind.entity_set(), &params)?;
    if records.is_empty() {
        info!("{}", NO_DATA_MESSAGE);
        return Ok(ReportOutcome::NoData { slot });
    }

    normalize(&mut records, kind);
    let colors = build_color_map(&records, kind, mode);
    let rules = build_style_rules(&records, &colors, kind, mode)?;
    debug!("{} records, {} categories", records.len(), colors.len());

    Ok(ReportOutcome::Chart(ChartReport {
        selection: selection.clone(),
        slot,
        filter,
        records,
        colors,
        properties: chart_properties(mode, rules),
    }))
}

pub fn preview_rows(report: &ChartReport) -> Vec<RecordPreviewRow> {
    let kind = report.selection.kind;
    let mode = report.selection.mode;
    report
        .records
        .iter()
        .map(|r| {
            let category = category_key(r, kind, mode);
            let color = report
                .colors
                .get(&category)
                .map(|c| c.to_string())
                .unwrap_or_default();
            RecordPreviewRow {
                supplier: r.supplier.clone(),
                category,
                turnover_crore: r
                    .turnover_crore
                    .map(|v| format_number(v, 2))
                    .unwrap_or_else(|| "-".to_string()),
                color,
            }
        })
        .collect()
}

pub fn summarize(report: &ChartReport) -> ReportSummary {
    let kind = report.selection.kind;
    let total: f64 = report.records.iter().filter_map(|r| r.turnover_crore).sum();
    ReportSummary {
        report: kind.tab_text().to_string(),
        period: report.selection.mode.label().to_string(),
        entity_set: kind.entity_set().to_string(),
        chart_slot: report.slot,
        filter: report.filter.clone(),
        total_records: report.records.len(),
        distinct_categories: report.colors.len(),
        total_turnover_crore: round_to(total, 2),
        palette: report
            .colors
            .iter()
            .map(|(category, color)| CategoryColor {
                category: category.to_string(),
                color: color.to_string(),
            })
            .collect(),
        generated_at: Local::now().to_rfc3339(),
    }
}

/// Identifies one fetch; results are only applied for the latest ticket.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    pub selection: Selection,
}

/// Selection echoed back to the user, chart visibility and the last result
/// of each chart slot.
#[derive(Debug, Clone)]
pub struct ReportSession {
    pub selection: Selection,
    generation: u64,
    visible: [bool; CHART_SLOTS as usize],
    charts: BTreeMap<u8, ChartReport>,
}

impl Default for ReportSession {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            generation: 0,
            visible: default_visibility(),
            charts: BTreeMap::new(),
        }
    }
}

// Fiscal-year slots are shown until a quarterly report replaces them.
fn default_visibility() -> [bool; CHART_SLOTS as usize] {
    let mut visible = [false; CHART_SLOTS as usize];
    for (i, v) in visible.iter_mut().enumerate() {
        *v = i % 2 == 0;
    }
    visible
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for the current selection. Any earlier ticket becomes
    /// stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            selection: self.selection.clone(),
        }
    }

    /// Store a fetch result. Returns false, leaving the session untouched,
    /// if the ticket has been superseded by a later fetch or a clear.
    pub fn apply(&mut self, ticket: &FetchTicket, outcome: ReportOutcome) -> bool {
        if ticket.generation != self.generation {
            warn!(
                "Discarding stale result for fetch {} (latest is {})",
                ticket.generation, self.generation
            );
            return false;
        }
        let slot = outcome.slot();
        self.set_visible(slot, true);
        self.set_visible(partner_slot(slot), false);
        match outcome {
            ReportOutcome::NoData { .. } => {
                self.charts.remove(&slot);
            }
            ReportOutcome::Chart(report) => {
                self.charts.insert(slot, report);
            }
        }
        true
    }

    pub fn is_visible(&self, slot: u8) -> bool {
        slot_index(slot).map(|i| self.visible[i]).unwrap_or(false)
    }

    pub fn chart(&self, slot: u8) -> Option<&ChartReport> {
        self.charts.get(&slot)
    }

    /// Reset selection, visibility and stored charts. In-flight fetches are
    /// discarded when they complete.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.visible = default_visibility();
        self.charts.clear();
        self.generation += 1;
    }

    fn set_visible(&mut self, slot: u8, visible: bool) {
        if let Some(i) = slot_index(slot) {
            self.visible[i] = visible;
        }
    }
}

fn slot_index(slot: u8) -> Option<usize> {
    (1..=CHART_SLOTS)
        .contains(&slot)
        .then(|| usize::from(slot - 1))
}
