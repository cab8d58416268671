use assetreg_core::ServiceError;
use assetreg_sql::Row;
use serde::{Deserialize, Serialize};

use super::{col_f64, col_i64, col_str};

/// Organisational unit owning assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub department_code: String,
    pub department_symbol: String,
    pub department_name: String,
}

impl Department {
    pub(crate) fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            department_code: col_str(row, "department_code")?,
            department_symbol: col_str(row, "department_symbol")?,
            department_name: col_str(row, "department_name")?,
        })
    }
}

/// Asset category. Carries the depreciation parameters copied onto assets
/// of this type when they are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetType {
    pub id: i64,
    pub type_code: i64,
    pub type_symbol: String,
    pub type_name: String,
    pub years_of_use: i64,
    /// Percent per year.
    pub depreciation_rate: f64,
}

/// Largest type code (type codes fit in one byte).
pub const MAX_TYPE_CODE: i64 = 255;

impl AssetType {
    pub(crate) fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: col_i64(row, "id")?,
            type_code: col_i64(row, "type_code")?,
            type_symbol: col_str(row, "type_symbol")?,
            type_name: col_str(row, "type_name")?,
            years_of_use: col_i64(row, "years_of_use")?,
            depreciation_rate: col_f64(row, "depreciation_rate")?,
        })
    }
}

/// Department row to insert or update by code.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentSeed {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl DepartmentSeed {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.code.trim().is_empty() {
            return Err(ServiceError::Validation("department code is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ServiceError::Validation(format!(
                "department '{}': name is required",
                self.code
            )));
        }
        Ok(())
    }
}

/// Asset type row to insert or update by type code.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetTypeSeed {
    pub code: i64,
    pub symbol: String,
    pub name: String,
    pub years_of_use: i64,
    pub depreciation_rate: f64,
}

impl AssetTypeSeed {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !(0..=MAX_TYPE_CODE).contains(&self.code) {
            return Err(ServiceError::Validation(format!(
                "asset type code {} out of range 0..={}",
                self.code, MAX_TYPE_CODE
            )));
        }
        if self.name.trim().is_empty() {
            return Err(ServiceError::Validation(format!(
                "asset type {}: name is required",
                self.code
            )));
        }
        if self.years_of_use < 0 {
            return Err(ServiceError::Validation(format!(
                "asset type {}: years_of_use must not be negative",
                self.code
            )));
        }
        if !(0.0..=100.0).contains(&self.depreciation_rate) {
            return Err(ServiceError::Validation(format!(
                "asset type {}: depreciation_rate must be within 0..=100",
                self.code
            )));
        }
        Ok(())
    }
}
