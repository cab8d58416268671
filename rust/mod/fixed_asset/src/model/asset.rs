use assetreg_core::ServiceError;
use assetreg_sql::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{col_date, col_f64, col_i64, col_str, requested_code};

pub const MAX_CODE_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 255;

/// An asset joined with its department and type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub id: i64,
    pub asset_code: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub department_id: i64,
    pub department_code: String,
    pub department_name: String,
    pub type_id: i64,
    pub type_code: i64,
    pub type_name: String,
    pub purchase_date: NaiveDate,
    pub purchase_year: i64,
    pub start_tracking_year: i64,
    pub years_of_use: i64,
    pub depreciation_rate: f64,
    pub quantity: i64,
    pub purchase_price: f64,
    pub annual_depreciation_value: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl AssetView {
    pub(crate) fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            asset_code: col_str(row, "asset_code")?,
            asset_symbol: col_str(row, "asset_symbol")?,
            asset_name: col_str(row, "asset_name")?,
            department_id: col_i64(row, "department_id")?,
            department_code: col_str(row, "department_code")?,
            department_name: col_str(row, "department_name")?,
            type_id: col_i64(row, "type_id")?,
            type_code: col_i64(row, "type_code")?,
            type_name: col_str(row, "type_name")?,
            purchase_date: col_date(row, "purchase_date")?,
            purchase_year: col_i64(row, "purchase_year")?,
            start_tracking_year: col_i64(row, "start_tracking_year")?,
            years_of_use: col_i64(row, "years_of_use")?,
            depreciation_rate: col_f64(row, "depreciation_rate")?,
            quantity: col_i64(row, "quantity")?,
            purchase_price: col_f64(row, "purchase_price")?,
            annual_depreciation_value: col_f64(row, "annual_depreciation_value")?,
            created_at: col_str(row, "created_at")?,
            updated_at: col_str(row, "updated_at")?,
        })
    }
}

/// Row of the asset list, with depreciation to date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetListItem {
    pub id: i64,
    pub asset_code: String,
    pub asset_name: String,
    pub type_name: String,
    pub department_name: String,
    pub quantity: i64,
    pub purchase_price: f64,
    pub accumulated_depreciation: f64,
    pub remaining_value: f64,
}

impl AssetListItem {
    pub(crate) fn from_row(row: &Row, current_year: i64) -> Result<Self, ServiceError> {
        let purchase_price = col_f64(row, "purchase_price")?;
        let accumulated = accumulated_depreciation(
            col_f64(row, "annual_depreciation_value")?,
            col_i64(row, "start_tracking_year")?,
            current_year,
        );
        Ok(Self {
            id: col_i64(row, "id")?,
            asset_code: col_str(row, "asset_code")?,
            asset_name: col_str(row, "asset_name")?,
            type_name: col_str(row, "type_name")?,
            department_name: col_str(row, "department_name")?,
            quantity: col_i64(row, "quantity")?,
            purchase_price,
            accumulated_depreciation: accumulated,
            remaining_value: purchase_price - accumulated,
        })
    }
}

/// Body of asset create and update requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
    /// Blank or absent: generate on create, keep the current code on update.
    #[serde(default)]
    pub asset_code: Option<String>,
    pub asset_name: String,
    pub dept_code: String,
    pub type_code: i64,
    pub purchase_date: NaiveDate,
    pub quantity: i64,
    pub purchase_price: f64,
}

impl AssetInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(code) = self.requested_code() {
            if code.chars().count() > MAX_CODE_LEN {
                return Err(ServiceError::Validation(format!(
                    "assetCode must be at most {} characters",
                    MAX_CODE_LEN
                )));
            }
        }
        let name = self.asset_name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("assetName is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ServiceError::Validation(format!(
                "assetName must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.dept_code.trim().is_empty() {
            return Err(ServiceError::Validation("deptCode is required".into()));
        }
        if self.quantity < 1 {
            return Err(ServiceError::Validation("quantity must be at least 1".into()));
        }
        if !(self.purchase_price.is_finite() && self.purchase_price > 0.0) {
            return Err(ServiceError::Validation(
                "purchasePrice must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Client-supplied code, trimmed; `None` when blank.
    pub fn requested_code(&self) -> Option<&str> {
        requested_code(self.asset_code.as_deref())
    }
}

/// Yearly depreciation: `price × rate / 100`.
pub fn annual_depreciation(purchase_price: f64, rate_percent: f64) -> f64 {
    purchase_price * rate_percent / 100.0
}

/// Depreciation accrued from `start_year` up to `current_year`; zero for a
/// start year in the future.
pub fn accumulated_depreciation(annual: f64, start_year: i64, current_year: i64) -> f64 {
    annual * (current_year - start_year).max(0) as f64
}
