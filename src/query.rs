use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ReportError, Result};
use crate::filter::{render_filters, FilterExpr};
use crate::types::{SupplierMaster, TurnoverRecord};

pub const SUPPLIER_MASTER_SET: &str = "/SUPP_MasterSet";
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";
pub const SUPPLIER_MASTER_ERROR_MESSAGE: &str = "Failed to fetch supplier master data.";

/// Options sent along with a read request.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub filters: Vec<FilterExpr>,
    pub url_parameters: BTreeMap<String, String>,
}

/// Read access to the turnover data service.
pub trait QueryExecutor {
    /// Rows of a turnover entity set that satisfy every top-level filter.
    fn read_turnover(&self, path: &str, params: &QueryParams) -> Result<Vec<TurnoverRecord>>;

    fn read_suppliers(&self, path: &str) -> Result<Vec<SupplierMaster>>;
}

/// Message to show for a failed request: the payload's
/// `error.message.value` if present, otherwise `fallback`.
pub fn backend_error_message(response_text: &str, fallback: &str) -> String {
    let parsed: Option<Value> = match serde_json::from_str(response_text) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Error parsing error response JSON: {}", e);
            None
        }
    };
    parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message/value"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// Serves entity sets from files in a directory.
///
/// `/SUPPSet` is read from `SUPPSet.json` or, failing that, `SUPPSet.csv`.
/// JSON files may hold an OData envelope (`{"d":{"results":[..]}}`), a
/// `{"results":[..]}` object or a bare array. A JSON payload with a
/// top-level `error` object is reported as a backend error.
#[derive(Debug, Clone)]
pub struct FileQueryExecutor {
    root: PathBuf,
}

impl FileQueryExecutor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let name = path.trim_start_matches('/');
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ReportError::UnknownEntitySet(path.to_string()));
        }
        for ext in ["json", "csv"] {
            let candidate = self.root.join(format!("{name}.{ext}"));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(ReportError::UnknownEntitySet(path.to_string()))
    }

    fn read_rows<T: DeserializeOwned>(&self, path: &str, error_fallback: &str) -> Result<Vec<T>> {
        let file = self.resolve(path)?;
        debug!("Reading {} from {}", path, file.display());
        match file.extension().and_then(|e| e.to_str()) {
            Some("csv") => read_csv(&file),
            _ => read_json(&file, error_fallback),
        }
    }
}

fn read_csv<T: DeserializeOwned>(file: &Path) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(file)?;
    let mut rows = Vec::new();
    let mut parse_errors = 0usize;
    for result in rdr.deserialize::<T>() {
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                parse_errors += 1;
                debug!("Skipping row: {}", e);
            }
        }
    }
    if parse_errors > 0 {
        warn!("{} rows skipped in {}", parse_errors, file.display());
    }
    Ok(rows)
}

fn read_json<T: DeserializeOwned>(file: &Path, error_fallback: &str) -> Result<Vec<T>> {
    let text = fs::read_to_string(file)?;
    let value: Value = serde_json::from_str(&text)?;
    if value.get("error").is_some() {
        return Err(ReportError::Backend(backend_error_message(&text, error_fallback)));
    }
    let results = match value {
        Value::Array(rows) => Value::Array(rows),
        Value::Object(mut obj) => match obj.remove("d") {
            Some(Value::Object(mut d)) => d.remove("results").unwrap_or(Value::Array(vec![])),
            _ => obj.remove("results").unwrap_or(Value::Array(vec![])),
        },
        _ => Value::Array(vec![]),
    };
    let Value::Array(items) = results else {
        return Err(ReportError::InvalidInput(format!(
            "{}: results is not a list",
            file.display()
        )));
    };

    let mut rows = Vec::with_capacity(items.len());
    let mut parse_errors = 0usize;
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(r) => rows.push(r),
            Err(e) => {
                parse_errors += 1;
                debug!("Skipping row: {}", e);
            }
        }
    }
    if parse_errors > 0 {
        warn!("{} rows skipped in {}", parse_errors, file.display());
    }
    Ok(rows)
}

impl QueryExecutor for FileQueryExecutor {
    fn read_turnover(&self, path: &str, params: &QueryParams) -> Result<Vec<TurnoverRecord>> {
        debug!(
            "GET {} $filter={} params={:?}",
            path,
            render_filters(&params.filters).unwrap_or_default(),
            params.url_parameters
        );
        let rows: Vec<TurnoverRecord> = self.read_rows(path, GENERIC_ERROR_MESSAGE)?;
        let total = rows.len();
        let matched: Vec<TurnoverRecord> = rows
            .into_iter()
            .filter(|r| params.filters.iter().all(|f| f.matches(r)))
            .collect();
        debug!("{} of {} rows matched", matched.len(), total);
        Ok(matched)
    }

    fn read_suppliers(&self, path: &str) -> Result<Vec<SupplierMaster>> {
        self.read_rows(path, SUPPLIER_MASTER_ERROR_MESSAGE)
    }
}

/// Supplier master sorted by supplier number.
///
/// Numbers that do not parse sort after the numeric ones, by text.
pub fn load_supplier_master<E: QueryExecutor>(executor: &E) -> Result<Vec<SupplierMaster>> {
    let mut suppliers = executor.read_suppliers(SUPPLIER_MASTER_SET)?;
    suppliers.sort_by(|a, b| {
        let ka = a.lifnr.trim().parse::<u64>().ok();
        let kb = b.lifnr.trim().parse::<u64>().ok();
        match (ka, kb) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.lifnr.cmp(&b.lifnr),
        }
    });
    debug!("Supplier master data loaded: {} rows", suppliers.len());
    Ok(suppliers)
}

/// Suppliers whose number or name contains `query`, ignoring case. Empty
/// query keeps all.
pub fn search_suppliers<'a>(suppliers: &'a [SupplierMaster], query: &str) -> Vec<&'a SupplierMaster> {
    let query = query.trim().to_lowercase();
    suppliers
        .iter()
        .filter(|s| {
            query.is_empty()
                || s.lifnr.to_lowercase().contains(&query)
                || s.name1.to_lowercase().contains(&query)
        })
        .collect()
}

/// Names of the selected suppliers, in selection order. Unknown numbers are
/// shown as given.
pub fn supplier_names<'a>(suppliers: &'a [SupplierMaster], ids: &'a [String]) -> Vec<&'a str> {
    ids.iter()
        .map(|id| {
            suppliers
                .iter()
                .find(|s| s.lifnr == *id)
                .map(|s| s.name1.as_str())
                .unwrap_or(id.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FIELD_FISCAL_YEAR;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_backend_error_message() {
        let payload = r#"{"error":{"code":"X","message":{"lang":"en","value":"Supplier locked"}}}"#;
        assert_eq!(backend_error_message(payload, GENERIC_ERROR_MESSAGE), "Supplier locked");
        assert_eq!(
            backend_error_message("<html>502</html>", GENERIC_ERROR_MESSAGE),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            backend_error_message(r#"{"error":{}}"#, SUPPLIER_MASTER_ERROR_MESSAGE),
            "Failed to fetch supplier master data."
        );
    }

    #[test]
    fn test_reads_odata_envelope_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SUPPSet.json",
            r#"{"d":{"results":[
                {"supplier":"Tata Motors Ltd","fiscalYear":"2022","turnOver":"10000000"},
                {"supplier":"Reliance Industries","fiscalYear":"2021","turnOver":"20000000"}
            ]}}"#,
        );
        let exec = FileQueryExecutor::new(dir.path());
        let params = QueryParams {
            filters: vec![FilterExpr::Or(vec![FilterExpr::equals(FIELD_FISCAL_YEAR, "2022")])],
            ..QueryParams::default()
        };
        let rows = exec.read_turnover("/SUPPSet", &params).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].supplier, "Tata Motors Ltd");

        let all = exec.read_turnover("/SUPPSet", &QueryParams::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_reads_bare_array_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "POSet.json", r#"[{"fiscalYear":"2022","turnOver":5}]"#);
        write(
            dir.path(),
            "Supp_Top5Set.csv",
            "supplier,fiscalYear,quater,quaterYear,turnOver\nTata Motors Ltd,2022,Q1,2022,12345678\n",
        );
        let exec = FileQueryExecutor::new(dir.path());
        let po = exec.read_turnover("/POSet", &QueryParams::default()).unwrap();
        assert_eq!(po[0].turnover.as_deref(), Some("5"));

        let top5 = exec.read_turnover("/Supp_Top5Set", &QueryParams::default()).unwrap();
        assert_eq!(top5.len(), 1);
        assert_eq!(top5[0].quarter, "Q1");
        assert_eq!(top5[0].turnover.as_deref(), Some("12345678"));
    }

    #[test]
    fn test_error_payload_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SUPPSet.json",
            r#"{"error":{"message":{"value":"Service unavailable"}}}"#,
        );
        let exec = FileQueryExecutor::new(dir.path());
        let err = exec.read_turnover("/SUPPSet", &QueryParams::default()).unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
    }

    #[test]
    fn test_unknown_entity_set() {
        let dir = tempfile::tempdir().unwrap();
        let exec = FileQueryExecutor::new(dir.path());
        assert!(matches!(
            exec.read_turnover("/POSet", &QueryParams::default()),
            Err(ReportError::UnknownEntitySet(_))
        ));
        assert!(matches!(
            exec.read_suppliers("/../secret"),
            Err(ReportError::UnknownEntitySet(_))
        ));
    }

    #[test]
    fn test_supplier_master_sorted_and_searchable() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SUPP_MasterSet.json",
            r#"{"results":[
                {"lifnr":"1000","name1":"Tata Motors Ltd"},
                {"lifnr":"200","name1":"Reliance Industries"},
                {"lifnr":"30","name1":"Bharat Forge"}
            ]}"#,
        );
        let exec = FileQueryExecutor::new(dir.path());
        let suppliers = load_supplier_master(&exec).unwrap();
        let ids: Vec<&str> = suppliers.iter().map(|s| s.lifnr.as_str()).collect();
        assert_eq!(ids, vec!["30", "200", "1000"]);

        assert_eq!(search_suppliers(&suppliers, "").len(), 3);
        let hits = search_suppliers(&suppliers, "Tata");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lifnr, "1000");
        assert_eq!(search_suppliers(&suppliers, "00").len(), 2);
        let hits = search_suppliers(&suppliers, "tata");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name1, "Tata Motors Ltd");
        assert_eq!(search_suppliers(&suppliers, "BHARAT forge").len(), 1);

        let ids = vec!["200".to_string(), "999".to_string()];
        assert_eq!(supplier_names(&suppliers, &ids), vec!["Reliance Industries", "999"]);
    }

    #[test]
    fn test_supplier_master_error_uses_own_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "SUPP_MasterSet.json", r#"{"error":{"code":"500"}}"#);
        let exec = FileQueryExecutor::new(dir.path());
        let err = load_supplier_master(&exec).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch supplier master data.");

        write(dir.path(), "SUPPSet.json", r#"{"error":{"code":"500"}}"#);
        let err = exec.read_turnover("/SUPPSet", &QueryParams::default()).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_json_rows_tolerate_numbers_and_skip_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SUPPSet.json",
            r#"{"d":{"results":[
                {"supplier":"Tata Motors Ltd","fiscalYear":"2022","turnOver":"10000000"},
                {"supplier":"Reliance Industries","fiscalYear":2023,"turnOver":20000000},
                {"supplier":["not","a","name"],"fiscalYear":"2023"}
            ]}}"#,
        );
        let exec = FileQueryExecutor::new(dir.path());
        let rows = exec.read_turnover("/SUPPSet", &QueryParams::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].fiscal_year, "2023");
        assert_eq!(rows[1].turnover.as_deref(), Some("20000000"));
    }
}
