use assetreg_core::ServiceError;
use assetreg_sql::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::asset::MAX_CODE_LEN;
use super::{col_date, col_f64, col_i64, col_opt_str, col_str, requested_code};

pub const MAX_NOTE_LEN: usize = 500;

/// Voucher list row with aggregates over its details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherSummary {
    pub id: i64,
    pub voucher_no: String,
    pub voucher_date: NaiveDate,
    pub increase_date: NaiveDate,
    pub note: Option<String>,
    pub detail_count: i64,
    /// Sum of the purchase prices of the voucher's assets.
    pub total_original_price: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl VoucherSummary {
    pub(crate) fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            voucher_no: col_str(row, "voucher_no")?,
            voucher_date: col_date(row, "voucher_date")?,
            increase_date: col_date(row, "increase_date")?,
            note: col_opt_str(row, "note"),
            detail_count: col_i64(row, "detail_count")?,
            total_original_price: col_f64(row, "total_original_price")?,
            created_at: col_str(row, "created_at")?,
            updated_at: col_str(row, "updated_at")?,
        })
    }
}

/// A voucher with its details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherView {
    pub id: i64,
    pub voucher_no: String,
    pub voucher_date: NaiveDate,
    pub increase_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub details: Vec<VoucherDetailView>,
}

impl VoucherView {
    pub(crate) fn from_row(row: &Row, details: Vec<VoucherDetailView>) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            voucher_no: col_str(row, "voucher_no")?,
            voucher_date: col_date(row, "voucher_date")?,
            increase_date: col_date(row, "increase_date")?,
            note: col_opt_str(row, "note"),
            created_at: col_str(row, "created_at")?,
            updated_at: col_str(row, "updated_at")?,
            details,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDetailView {
    pub id: i64,
    pub voucher_id: i64,
    pub asset_id: i64,
    pub asset_code: String,
    pub asset_name: String,
    pub purchase_price: f64,
    pub created_at: String,
}

impl VoucherDetailView {
    pub(crate) fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            voucher_id: col_i64(row, "voucher_id")?,
            asset_id: col_i64(row, "asset_id")?,
            asset_code: col_str(row, "asset_code")?,
            asset_name: col_str(row, "asset_name")?,
            purchase_price: col_f64(row, "purchase_price")?,
            created_at: col_str(row, "created_at")?,
        })
    }
}

/// Body of voucher create and update requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherInput {
    /// Blank or absent: generate on create, keep the current number on update.
    #[serde(default)]
    pub voucher_no: Option<String>,
    pub voucher_date: NaiveDate,
    pub increase_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub details: Vec<VoucherDetailInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDetailInput {
    pub asset_id: i64,
}

impl VoucherInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(no) = self.requested_no() {
            if no.chars().count() > MAX_CODE_LEN {
                return Err(ServiceError::Validation(format!(
                    "voucherNo must be at most {} characters",
                    MAX_CODE_LEN
                )));
            }
        }
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(ServiceError::Validation(format!(
                    "note must be at most {} characters",
                    MAX_NOTE_LEN
                )));
            }
        }
        Ok(())
    }

    /// Client-supplied voucher number, trimmed; `None` when blank.
    pub fn requested_no(&self) -> Option<&str> {
        requested_code(self.voucher_no.as_deref())
    }

    /// Note with surrounding whitespace removed; `None` when blank.
    pub fn note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    /// Referenced asset ids in request order, first occurrence wins.
    pub fn asset_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.details.len());
        for d in &self.details {
            if !ids.contains(&d.asset_id) {
                ids.push(d.asset_id);
            }
        }
        ids
    }
}
