// Category keys and the per-category chart palette.
//
// `category_key` is the only place a record's category is derived; both the
// color map and the style rules go through it.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::types::{PeriodMode, ReportKind, TurnoverRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

impl Serialize for Hsl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Color of the `index`-th distinct category for a period mode.
pub fn color_for_index(index: usize, mode: PeriodMode) -> Hsl {
    let (step, saturation, lightness) = match mode {
        PeriodMode::FiscalYearWise => (43, 70, 50),
        PeriodMode::QuarterlyWise => (37, 65, 55),
    };
    Hsl {
        hue: ((index * step) % 360) as u16,
        saturation,
        lightness,
    }
}

/// Supplier label used in keys and chart contexts.
pub(crate) fn supplier_label(record: &TurnoverRecord) -> &str {
    record.supplier_short.as_deref().unwrap_or(&record.supplier)
}

pub fn category_key(record: &TurnoverRecord, kind: ReportKind, mode: PeriodMode) -> String {
    match (mode, kind.is_purchase()) {
        (PeriodMode::FiscalYearWise, true) => record.fiscal_year.clone(),
        (PeriodMode::FiscalYearWise, false) => {
            format!("{} ({})", supplier_label(record), record.fiscal_year)
        }
        (PeriodMode::QuarterlyWise, true) => {
            format!("({} {})", record.quarter, record.quarter_year)
        }
        (PeriodMode::QuarterlyWise, false) => format!(
            "{} ({} {})",
            supplier_label(record),
            record.quarter,
            record.quarter_year
        ),
    }
}

/// Distinct category keys in first-seen order, each with its color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    keys: Vec<String>,
    colors: HashMap<String, Hsl>,
}

impl ColorMap {
    pub fn get(&self, key: &str) -> Option<Hsl> {
        self.colors.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Hsl)> + '_ {
        self.keys.iter().map(|k| (k.as_str(), self.colors[k]))
    }
}

pub fn build_color_map(records: &[TurnoverRecord], kind: ReportKind, mode: PeriodMode) -> ColorMap {
    let mut map = ColorMap::default();
    for record in records {
        let key = category_key(record, kind, mode);
        if map.colors.contains_key(&key) {
            continue;
        }
        let color = color_for_index(map.keys.len(), mode);
        map.colors.insert(key.clone(), color);
        map.keys.push(key);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(short: Option<&str>, fy: &str, q: &str, qy: &str) -> TurnoverRecord {
        TurnoverRecord {
            supplier: "Full Supplier Name".to_string(),
            supplier_short: short.map(str::to_string),
            fiscal_year: fy.to_string(),
            quarter: q.to_string(),
            quarter_year: qy.to_string(),
            ..TurnoverRecord::default()
        }
    }

    #[test]
    fn test_key_shapes() {
        let r = rec(Some("TML"), "2022", "Q1", "2023");
        let fy = PeriodMode::FiscalYearWise;
        let q = PeriodMode::QuarterlyWise;
        assert_eq!(category_key(&r, ReportKind::PurchaseTurnover, fy), "2022");
        assert_eq!(category_key(&r, ReportKind::AllSuppliers, fy), "TML (2022)");
        assert_eq!(category_key(&r, ReportKind::PurchaseTurnover, q), "(Q1 2023)");
        assert_eq!(category_key(&r, ReportKind::Top5, q), "TML (Q1 2023)");
    }

    #[test]
    fn test_key_without_short_name_uses_supplier() {
        let r = rec(None, "2022", "", "");
        assert_eq!(
            category_key(&r, ReportKind::AllSuppliers, PeriodMode::FiscalYearWise),
            "Full Supplier Name (2022)"
        );
    }

    #[test]
    fn test_palette_constants() {
        assert_eq!(color_for_index(0, PeriodMode::FiscalYearWise).to_string(), "hsl(0, 70%, 50%)");
        assert_eq!(color_for_index(1, PeriodMode::FiscalYearWise).to_string(), "hsl(43, 70%, 50%)");
        assert_eq!(color_for_index(9, PeriodMode::FiscalYearWise).hue, 27);
        assert_eq!(color_for_index(1, PeriodMode::QuarterlyWise).to_string(), "hsl(37, 65%, 55%)");
        assert_eq!(color_for_index(10, PeriodMode::QuarterlyWise).hue, 10);
    }

    #[test]
    fn test_distinct_keys_first_seen_order() {
        let records = vec![
            rec(Some("TML"), "2022", "", ""),
            rec(Some("RI"), "2023", "", ""),
            rec(Some("TML"), "2022", "", ""),
        ];
        let map = build_color_map(&records, ReportKind::AllSuppliers, PeriodMode::FiscalYearWise);
        let entries: Vec<(&str, String)> = map.iter().map(|(k, c)| (k, c.to_string())).collect();
        assert_eq!(
            entries,
            vec![
                ("TML (2022)", "hsl(0, 70%, 50%)".to_string()),
                ("RI (2023)", "hsl(43, 70%, 50%)".to_string()),
            ]
        );
    }

    #[test]
    fn test_color_map_is_deterministic() {
        let records = vec![
            rec(None, "2021", "Q1", "2021"),
            rec(None, "2021", "Q2", "2021"),
            rec(None, "2022", "Q1", "2022"),
        ];
        let kind = ReportKind::PurchaseTurnover;
        let mode = PeriodMode::QuarterlyWise;
        let a = build_color_map(&records, kind, mode);
        let b = build_color_map(&records, kind, mode);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_ne!(a.get("(Q1 2021)"), a.get("(Q2 2021)"));
        assert_eq!(build_color_map(&[], kind, mode).len(), 0);
    }
}
