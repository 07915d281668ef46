use crate::error::{ReportError, Result};
use crate::types::{PeriodMode, ReportKind, Selection};

/// Input fields a report may require before it can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Supplier,
    FiscalYear,
    Quarter,
    QuarterYear,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Supplier => "Supplier",
            Field::FiscalYear => "Fiscal Year",
            Field::Quarter => "Quarter",
            Field::QuarterYear => "Quarter Year",
        }
    }

    fn values(self, selection: &Selection) -> &[String] {
        match self {
            Field::Supplier => &selection.supplier_ids,
            Field::FiscalYear => &selection.fiscal_years,
            Field::Quarter => &selection.quarters,
            Field::QuarterYear => &selection.quarter_years,
        }
    }
}

pub fn required_fields(kind: ReportKind, mode: PeriodMode) -> &'static [Field] {
    match (kind, mode) {
        (ReportKind::SingleSupplier, PeriodMode::FiscalYearWise) => {
            &[Field::Supplier, Field::FiscalYear]
        }
        (ReportKind::SingleSupplier, PeriodMode::QuarterlyWise) => {
            &[Field::Supplier, Field::Quarter, Field::QuarterYear]
        }
        (_, PeriodMode::FiscalYearWise) => &[Field::FiscalYear],
        (_, PeriodMode::QuarterlyWise) => &[Field::Quarter, Field::QuarterYear],
    }
}

/// Labels of required fields that have no non-blank value.
pub fn missing_fields(selection: &Selection) -> Vec<&'static str> {
    required_fields(selection.kind, selection.mode)
        .iter()
        .filter(|f| f.values(selection).iter().all(|v| v.trim().is_empty()))
        .map(|f| f.label())
        .collect()
}

/// Reject selections that cannot produce a meaningful query.
///
/// A quarterly report needs both quarters and quarter years, so a one-sided
/// quarter selection fails here instead of being dropped by the filter
/// builder.
pub fn validate(selection: &Selection) -> Result<()> {
    let missing = missing_fields(selection);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingFields(
            missing.into_iter().map(str::to_string).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_year_required() {
        let sel = Selection::new(ReportKind::AllSuppliers, PeriodMode::FiscalYearWise);
        assert_eq!(missing_fields(&sel), vec!["Fiscal Year"]);
        assert!(validate(&sel.with_fiscal_years(["2022"])).is_ok());
    }

    #[test]
    fn test_partial_quarter_selection_is_rejected() {
        let sel = Selection::new(ReportKind::Top5, PeriodMode::QuarterlyWise).with_quarters(["Q1"]);
        assert_eq!(missing_fields(&sel), vec!["Quarter Year"]);
        match validate(&sel) {
            Err(ReportError::MissingFields(fields)) => assert_eq!(fields, vec!["Quarter Year"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_single_supplier_needs_supplier() {
        let sel = Selection::new(ReportKind::SingleSupplier, PeriodMode::QuarterlyWise);
        assert_eq!(missing_fields(&sel), vec!["Supplier", "Quarter", "Quarter Year"]);

        let sel = Selection::new(ReportKind::SingleSupplier, PeriodMode::FiscalYearWise)
            .with_fiscal_years(["2022"])
            .with_suppliers(["100"]);
        assert!(validate(&sel).is_ok());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let sel = Selection::new(ReportKind::PurchaseTurnover, PeriodMode::FiscalYearWise)
            .with_fiscal_years(["   "]);
        assert_eq!(missing_fields(&sel), vec!["Fiscal Year"]);
    }

    #[test]
    fn test_error_message_lists_fields() {
        let sel = Selection::new(ReportKind::AllSuppliers, PeriodMode::QuarterlyWise);
        let msg = validate(&sel).unwrap_err().to_string();
        assert_eq!(msg, "Please fill the following fields:\n\nQuarter\nQuarter Year");
    }
}
