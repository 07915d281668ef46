// Query filter trees built from a report selection.
//
// Values within one dimension are OR-ed, dimensions are AND-ed. The list
// returned by `build_filters` is an implicit conjunction; an empty list
// means "no constraint".

use std::fmt;

use crate::types::{PeriodMode, ReportKind, Selection, TurnoverRecord};

// Backend field names, spelled the way the entity sets expect them.
pub const FIELD_FISCAL_YEAR: &str = "fiscalYear";
pub const FIELD_QUARTER: &str = "fiscalQuater";
pub const FIELD_QUARTER_YEAR: &str = "quater_Year";
pub const FIELD_SUPPLIER: &str = "supplier";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Equals { field: &'static str, value: String },
    Or(Vec<FilterExpr>),
    And(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn equals(field: &'static str, value: impl Into<String>) -> Self {
        Self::Equals {
            field,
            value: value.into(),
        }
    }

    fn any_of(field: &'static str, values: &[String]) -> Option<Self> {
        let terms: Vec<FilterExpr> = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| Self::equals(field, v))
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Self::Or(terms))
        }
    }

    /// Evaluate the expression against a record the way the backend would.
    ///
    /// `supplier` matches either the supplier number or the supplier name.
    pub fn matches(&self, record: &TurnoverRecord) -> bool {
        match self {
            Self::Equals { field, value } => match *field {
                FIELD_FISCAL_YEAR => record.fiscal_year == *value,
                FIELD_QUARTER => record.quarter == *value,
                FIELD_QUARTER_YEAR => record.quarter_year == *value,
                FIELD_SUPPLIER => record.supplier_id == *value || record.supplier == *value,
                _ => false,
            },
            Self::Or(terms) => terms.iter().any(|t| t.matches(record)),
            Self::And(terms) => terms.iter().all(|t| t.matches(record)),
        }
    }
}

impl fmt::Display for FilterExpr {
    /// Renders OData `$filter` syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => {
                write!(f, "{} eq '{}'", field, value.replace('\'', "''"))
            }
            Self::Or(terms) => write_joined(f, terms, " or "),
            Self::And(terms) => write_joined(f, terms, " and "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[FilterExpr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{term}")?;
    }
    write!(f, ")")
}

/// Build the top-level filter nodes for a selection.
///
/// In quarterly mode the quarter node is only emitted when both quarters and
/// quarter years are chosen; a one-sided quarter selection adds no
/// constraint. Validation rejects that case before a fetch, see
/// [`crate::selection::validate`].
pub fn build_filters(selection: &Selection) -> Vec<FilterExpr> {
    let mut filters = Vec::new();

    match selection.mode {
        PeriodMode::FiscalYearWise => {
            if let Some(years) = FilterExpr::any_of(FIELD_FISCAL_YEAR, &selection.fiscal_years) {
                filters.push(years);
            }
        }
        PeriodMode::QuarterlyWise => {
            let quarters = FilterExpr::any_of(FIELD_QUARTER, &selection.quarters);
            let years = FilterExpr::any_of(FIELD_QUARTER_YEAR, &selection.quarter_years);
            if let (Some(q), Some(y)) = (quarters, years) {
                filters.push(FilterExpr::And(vec![q, y]));
            }
        }
    }

    if selection.kind == ReportKind::SingleSupplier {
        if let Some(suppliers) = FilterExpr::any_of(FIELD_SUPPLIER, &selection.supplier_ids) {
            filters.push(suppliers);
        }
    }

    filters
}

/// Join top-level nodes into one `$filter` string, `None` when unfiltered.
pub fn render_filters(filters: &[FilterExpr]) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    Some(
        filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and "),
    )
}
