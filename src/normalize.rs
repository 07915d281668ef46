use log::warn;

use crate::types::{ReportKind, TurnoverRecord};
use crate::util::{parse_f64_safe, round_to};

const RUPEES_PER_CRORE: f64 = 10_000_000.0;

/// Turnover in crore, rounded to two decimals. `None` if the raw value is
/// missing or not numeric.
pub fn convert_turnover_to_crore(raw: Option<&str>) -> Option<f64> {
    parse_f64_safe(raw).map(|v| round_to(v / RUPEES_PER_CRORE, 2))
}

/// Short label built from the initials of capitalized words longer than two
/// characters. Falls back to the full name when nothing qualifies.
///
/// A word qualifies when its first character is unchanged by upper-casing,
/// so words starting with digits or punctuation count as well.
pub fn generate_supplier_short(supplier: &str) -> String {
    let abbreviation: String = supplier
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .filter_map(|w| w.chars().next())
        .filter(|c| c.to_uppercase().eq(std::iter::once(*c)))
        .collect::<String>()
        .to_uppercase();

    if abbreviation.is_empty() {
        supplier.to_string()
    } else {
        abbreviation
    }
}

/// Fill the display fields of every record in place.
///
/// The crore value is always derived from the raw `turnover` field, which
/// is never overwritten, so normalizing a record twice yields the same
/// result.
pub fn normalize(records: &mut [TurnoverRecord], kind: ReportKind) {
    for record in records.iter_mut() {
        record.turnover_crore = convert_turnover_to_crore(record.turnover.as_deref());
        if record.turnover.is_some() && record.turnover_crore.is_none() {
            warn!(
                "Unparsable turnover {:?} for supplier '{}'",
                record.turnover, record.supplier
            );
        }
        if !kind.is_purchase() {
            record.supplier_short = Some(generate_supplier_short(&record.supplier));
        }
    }
}
