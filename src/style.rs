use std::collections::BTreeMap;

use serde::Serialize;

use crate::color::{category_key, supplier_label, ColorMap, Hsl};
use crate::error::{ReportError, Result};
use crate::types::{PeriodMode, ReportKind, TurnoverRecord};

pub const LABEL_SUPPLIER: &str = "Supplier Name";
pub const LABEL_FISCAL_YEAR: &str = "Fiscal Year";
pub const LABEL_QUARTER: &str = "Quarter";
pub const LABEL_QUARTER_YEAR: &str = "Quarter Year";

/// Tells the chart which color to paint data points matching `data_context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRule {
    #[serde(rename = "dataContext")]
    pub data_context: BTreeMap<&'static str, String>,
    pub properties: RuleProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleProperties {
    pub color: Hsl,
}

pub fn data_context(
    record: &TurnoverRecord,
    kind: ReportKind,
    mode: PeriodMode,
) -> BTreeMap<&'static str, String> {
    let mut ctx = BTreeMap::new();
    if !kind.is_purchase() {
        ctx.insert(LABEL_SUPPLIER, supplier_label(record).to_string());
    }
    match mode {
        PeriodMode::FiscalYearWise => {
            ctx.insert(LABEL_FISCAL_YEAR, record.fiscal_year.clone());
        }
        PeriodMode::QuarterlyWise => {
            ctx.insert(LABEL_QUARTER, record.quarter.clone());
            ctx.insert(LABEL_QUARTER_YEAR, record.quarter_year.clone());
        }
    }
    ctx
}

/// One rule per record, in record order.
///
/// Fails with [`ReportError::MissingColor`] if a record's category is not in
/// `colors`, which means the map was built from different records.
pub fn build_style_rules(
    records: &[TurnoverRecord],
    colors: &ColorMap,
    kind: ReportKind,
    mode: PeriodMode,
) -> Result<Vec<StyleRule>> {
    records
        .iter()
        .map(|record| {
            let key = category_key(record, kind, mode);
            let color = colors.get(&key).ok_or(ReportError::MissingColor(key))?;
            Ok(StyleRule {
                data_context: data_context(record, kind, mode),
                properties: RuleProperties { color },
            })
        })
        .collect()
}

/// Property object handed to the chart widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartProperties {
    pub title: Title,
    pub plot_area: PlotArea,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Visibility>,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub visible: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotArea {
    pub data_point_style: DataPointStyle,
    pub data_label: Visibility,
    pub drawing_effect: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataPointStyle {
    pub rules: Vec<StyleRule>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Visibility {
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub selectability: Selectability,
}

#[derive(Debug, Clone, Serialize)]
pub struct Selectability {
    pub mode: &'static str,
}

pub fn chart_properties(mode: PeriodMode, rules: Vec<StyleRule>) -> ChartProperties {
    ChartProperties {
        title: Title {
            visible: true,
            text: format!("{} Turnover", mode.label()),
        },
        plot_area: PlotArea {
            data_point_style: DataPointStyle { rules },
            data_label: Visibility { visible: true },
            drawing_effect: "glossy",
        },
        tooltip: match mode {
            PeriodMode::FiscalYearWise => None,
            PeriodMode::QuarterlyWise => Some(Visibility { visible: true }),
        },
        interaction: Interaction {
            selectability: Selectability { mode: "multiple" },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::build_color_map;
    use crate::normalize::normalize;

    fn records() -> Vec<TurnoverRecord> {
        let mk = |supplier: &str, fy: &str, q: &str, qy: &str| TurnoverRecord {
            supplier: supplier.to_string(),
            fiscal_year: fy.to_string(),
            quarter: q.to_string(),
            quarter_year: qy.to_string(),
            turnover: Some("10000000".to_string()),
            ..TurnoverRecord::default()
        };
        vec![
            mk("Tata Motors Ltd", "2022", "Q1", "2022"),
            mk("Reliance Industries", "2023", "Q2", "2023"),
            mk("Tata Motors Ltd", "2023", "Q1", "2022"),
        ]
    }

    #[test]
    fn test_keys_match_for_every_combination() {
        for kind in [ReportKind::AllSuppliers, ReportKind::PurchaseTurnover] {
            for mode in [PeriodMode::FiscalYearWise, PeriodMode::QuarterlyWise] {
                let mut recs = records();
                normalize(&mut recs, kind);
                let colors = build_color_map(&recs, kind, mode);
                let rules = build_style_rules(&recs, &colors, kind, mode).unwrap();
                assert_eq!(rules.len(), recs.len());
                for (rule, rec) in rules.iter().zip(&recs) {
                    let key = category_key(rec, kind, mode);
                    assert_eq!(Some(rule.properties.color), colors.get(&key));
                }
            }
        }
    }

    #[test]
    fn test_context_labels() {
        let mut recs = records();
        normalize(&mut recs, ReportKind::Top5);
        let r = &recs[0];

        let ctx = data_context(r, ReportKind::Top5, PeriodMode::FiscalYearWise);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx[LABEL_SUPPLIER], "TML");
        assert_eq!(ctx[LABEL_FISCAL_YEAR], "2022");

        let ctx = data_context(r, ReportKind::PurchaseTurnover, PeriodMode::FiscalYearWise);
        assert_eq!(ctx.keys().copied().collect::<Vec<_>>(), vec![LABEL_FISCAL_YEAR]);

        let ctx = data_context(r, ReportKind::PurchaseTurnover, PeriodMode::QuarterlyWise);
        assert_eq!(ctx[LABEL_QUARTER], "Q1");
        assert_eq!(ctx[LABEL_QUARTER_YEAR], "2022");
        assert!(!ctx.contains_key(LABEL_SUPPLIER));

        let ctx = data_context(r, ReportKind::SingleSupplier, PeriodMode::QuarterlyWise);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_missing_color_is_an_error() {
        let mut recs = records();
        normalize(&mut recs, ReportKind::AllSuppliers);
        let colors = build_color_map(&recs[..1], ReportKind::AllSuppliers, PeriodMode::FiscalYearWise);
        let err = build_style_rules(&recs, &colors, ReportKind::AllSuppliers, PeriodMode::FiscalYearWise)
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingColor(ref k) if k == "RI (2023)"));
    }

    #[test]
    fn test_chart_properties_json() {
        let mut recs = records();
        normalize(&mut recs, ReportKind::AllSuppliers);
        let mode = PeriodMode::QuarterlyWise;
        let colors = build_color_map(&recs, ReportKind::AllSuppliers, mode);
        let rules = build_style_rules(&recs, &colors, ReportKind::AllSuppliers, mode).unwrap();
        let json = serde_json::to_value(chart_properties(mode, rules)).unwrap();

        assert_eq!(json["title"]["text"], "Quarterly Wise Turnover");
        assert_eq!(json["plotArea"]["drawingEffect"], "glossy");
        assert_eq!(json["plotArea"]["dataLabel"]["visible"], true);
        assert_eq!(json["tooltip"]["visible"], true);
        assert_eq!(json["interaction"]["selectability"]["mode"], "multiple");
        let rule = &json["plotArea"]["dataPointStyle"]["rules"][1];
        assert_eq!(rule["dataContext"]["Supplier Name"], "RI");
        assert_eq!(rule["properties"]["color"], "hsl(37, 65%, 55%)");

        let fy = serde_json::to_value(chart_properties(PeriodMode::FiscalYearWise, vec![])).unwrap();
        assert!(fy.get("tooltip").is_none());
        assert_eq!(fy["title"]["text"], "Fiscal Year Wise Turnover");
    }
}
