use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::{ReportError, Result};
use crate::util::{string_from_number, string_or_number, two_decimals};

/// Whether turnover is viewed per fiscal year or per quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum PeriodMode {
    #[default]
    #[value(name = "fiscal-year")]
    FiscalYearWise,
    #[value(name = "quarterly")]
    QuarterlyWise,
}

impl PeriodMode {
    /// Radio group index: 0 is fiscal-year-wise, 1 is quarterly-wise.
    pub fn from_radio_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Self::FiscalYearWise),
            1 => Ok(Self::QuarterlyWise),
            other => Err(ReportError::InvalidInput(format!("radio index {other}"))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FiscalYearWise => "Fiscal Year Wise",
            Self::QuarterlyWise => "Quarterly Wise",
        }
    }
}

/// The four query scenarios offered by the report tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum ReportKind {
    #[default]
    #[value(name = "all")]
    AllSuppliers,
    #[value(name = "top5")]
    Top5,
    #[value(name = "single")]
    SingleSupplier,
    #[value(name = "purchase")]
    PurchaseTurnover,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        Self::AllSuppliers,
        Self::Top5,
        Self::SingleSupplier,
        Self::PurchaseTurnover,
    ];

    pub fn from_tab_key(key: &str) -> Result<Self> {
        match key {
            "scenario1" => Ok(Self::AllSuppliers),
            "scenario2" => Ok(Self::Top5),
            "scenario3" => Ok(Self::SingleSupplier),
            "scenario4" => Ok(Self::PurchaseTurnover),
            other => Err(ReportError::InvalidInput(format!("tab key '{other}'"))),
        }
    }

    pub fn tab_text(self) -> &'static str {
        match self {
            Self::AllSuppliers => "All Supplier Turnover",
            Self::Top5 => "Top 5 Supplier Turnover",
            Self::SingleSupplier => "Single Supplier Turnover",
            Self::PurchaseTurnover => "Purchase Turnover",
        }
    }

    /// Entity set the backend serves this report from.
    pub fn entity_set(self) -> &'static str {
        match self {
            Self::AllSuppliers => "/SUPPSet",
            Self::Top5 => "/Supp_Top5Set",
            Self::SingleSupplier => "/SINGLE_SUPPSet",
            Self::PurchaseTurnover => "/POSet",
        }
    }

    pub fn is_purchase(self) -> bool {
        self == Self::PurchaseTurnover
    }
}

/// User choices for one report run.
///
/// `supplier_ids` behaves as an insertion-ordered set; use
/// [`Selection::add_supplier`] to keep it free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: ReportKind,
    pub mode: PeriodMode,
    pub supplier_ids: Vec<String>,
    pub fiscal_years: Vec<String>,
    pub quarters: Vec<String>,
    pub quarter_years: Vec<String>,
}

impl Selection {
    #[must_use]
    pub fn new(kind: ReportKind, mode: PeriodMode) -> Self {
        Self {
            kind,
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fiscal_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fiscal_years = years.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_quarters<I, S>(mut self, quarters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quarters = quarters.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_quarter_years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quarter_years = years.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_suppliers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.add_supplier(id);
        }
        self
    }

    /// Returns false if the id was already selected.
    pub fn add_supplier(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.supplier_ids.contains(&id) {
            return false;
        }
        self.supplier_ids.push(id);
        true
    }

    /// Reset every choice back to the first tab and fiscal-year mode.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One aggregated turnover row as served by the backend.
///
/// Serde names follow the backend field spellings; the Rust names are
/// normalized. `turnover_crore` and `supplier_short` are filled by
/// [`crate::normalize::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnoverRecord {
    #[serde(default)]
    pub supplier: String,
    #[serde(rename = "supplierId", alias = "lifnr", default, deserialize_with = "string_from_number")]
    pub supplier_id: String,
    #[serde(rename = "fiscalYear", default, deserialize_with = "string_from_number")]
    pub fiscal_year: String,
    #[serde(
        rename = "quater",
        alias = "fiscalQuater",
        alias = "quarter",
        default,
        deserialize_with = "string_from_number"
    )]
    pub quarter: String,
    #[serde(
        rename = "quaterYear",
        alias = "quater_Year",
        alias = "quarterYear",
        default,
        deserialize_with = "string_from_number"
    )]
    pub quarter_year: String,
    #[serde(rename = "turnOver", default, deserialize_with = "string_or_number")]
    pub turnover: Option<String>,
    #[serde(
        rename = "turnoverCrore",
        default,
        skip_deserializing,
        serialize_with = "two_decimals"
    )]
    pub turnover_crore: Option<f64>,
    #[serde(rename = "supplierShort", default, skip_deserializing)]
    pub supplier_short: Option<String>,
}

/// Row of the supplier master entity set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct SupplierMaster {
    #[serde(default, deserialize_with = "string_from_number")]
    #[tabled(rename = "Supplier No")]
    pub lifnr: String,
    #[serde(default)]
    #[tabled(rename = "Name")]
    pub name1: String,
}

/// Console preview of a normalized record together with its chart color.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RecordPreviewRow {
    #[tabled(rename = "Supplier")]
    pub supplier: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Turnover (Cr)")]
    pub turnover_crore: String,
    #[tabled(rename = "Color")]
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryColor {
    pub category: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub report: String,
    pub period: String,
    pub entity_set: String,
    pub chart_slot: u8,
    pub filter: Option<String>,
    pub total_records: usize,
    pub distinct_categories: usize,
    pub total_turnover_crore: f64,
    pub palette: Vec<CategoryColor>,
    pub generated_at: String,
}
