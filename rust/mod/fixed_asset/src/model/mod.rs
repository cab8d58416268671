pub mod asset;
pub mod reference;
pub mod voucher;

pub use asset::{AssetInput, AssetListItem, AssetView};
pub use reference::{AssetType, AssetTypeSeed, Department, DepartmentSeed};
pub use voucher::{VoucherDetailInput, VoucherDetailView, VoucherInput, VoucherSummary, VoucherView};

use assetreg_core::ServiceError;
use assetreg_sql::Row;
use chrono::NaiveDate;

// ── Row accessors ──
//
// Every projection maps its columns explicitly; a missing or mistyped
// column is a schema bug, reported as Internal.

fn missing(name: &str) -> ServiceError {
    ServiceError::Internal(format!("missing or mistyped column '{}'", name))
}

pub(crate) fn col_str(row: &Row, name: &str) -> Result<String, ServiceError> {
    row.get_str(name).map(str::to_string).ok_or_else(|| missing(name))
}

pub(crate) fn col_opt_str(row: &Row, name: &str) -> Option<String> {
    row.get_str(name).map(str::to_string)
}

pub(crate) fn col_i64(row: &Row, name: &str) -> Result<i64, ServiceError> {
    row.get_i64(name).ok_or_else(|| missing(name))
}

pub(crate) fn col_f64(row: &Row, name: &str) -> Result<f64, ServiceError> {
    row.get_f64(name).ok_or_else(|| missing(name))
}

pub(crate) fn col_date(row: &Row, name: &str) -> Result<NaiveDate, ServiceError> {
    let s = row.get_str(name).ok_or_else(|| missing(name))?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ServiceError::Internal(format!("bad date in column '{}': {}", name, e)))
}

/// Storage format of calendar dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn date_text(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Trimmed optional code: `None` when absent or blank.
pub(crate) fn requested_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}
