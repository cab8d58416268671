pub mod asset;
pub mod reference;
pub mod schema;
pub mod voucher;

use std::sync::Arc;

use assetreg_core::{PageParams, PagedResult, ServiceError};
use assetreg_sql::{Row, SQLError, SQLStore, Value};
use serde::Serialize;

use crate::code::{Allocator, CodeColumn, ASSET_CODE, VOUCHER_NO};

pub use asset::{AssetFilter, BulkDeleteAssets};
pub use voucher::{BulkDeleteVouchers, VoucherFilter};

pub(crate) const ASSETS: &str = "assets";
pub(crate) const VOUCHERS: &str = "asset_increase_vouchers";
pub(crate) const DETAILS: &str = "asset_increase_voucher_details";

/// Register service: owns the store and the code allocators for assets and
/// increase vouchers.
pub struct FixedAssetService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) asset_codes: Allocator<CodeColumn>,
    pub(crate) voucher_nos: Allocator<CodeColumn>,
}

impl FixedAssetService {
    /// Initialize the schema and build the service. `max_attempts` bounds
    /// retries of generated codes lost to concurrent creates.
    pub fn new(sql: Arc<dyn SQLStore>, max_attempts: u32) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        let asset_codes = Allocator::new(ASSET_CODE, CodeColumn::new(sql.clone(), ASSETS, "asset_code"))
            .with_max_attempts(max_attempts);
        let voucher_nos = Allocator::new(VOUCHER_NO, CodeColumn::new(sql.clone(), VOUCHERS, "voucher_no"))
            .with_max_attempts(max_attempts);
        Ok(Self {
            sql,
            asset_codes,
            voucher_nos,
        })
    }

    // ── Generic SQL helpers ──

    pub(crate) fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ServiceError> {
        self.sql.query(sql, params).map_err(storage)
    }

    pub(crate) fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, ServiceError> {
        self.sql.exec(sql, params).map_err(storage)
    }

    /// Run a `SELECT COUNT(*) AS cnt ...` query.
    pub(crate) fn count(&self, sql: &str, params: &[Value]) -> Result<u64, ServiceError> {
        let rows = self.query(sql, params)?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0).max(0) as u64)
    }

    /// Fetch one page of `SELECT {columns} FROM {from}` under `cond`, plus the
    /// total row count.
    pub(crate) fn list_page<T, F>(
        &self,
        columns: &str,
        from: &str,
        cond: &Conditions,
        order_by: &str,
        page: &PageParams,
        map: F,
    ) -> Result<PagedResult<T>, ServiceError>
    where
        T: Serialize,
        F: Fn(&Row) -> Result<T, ServiceError>,
    {
        let where_sql = cond.where_sql();
        let total = self.count(
            &format!("SELECT COUNT(*) AS cnt FROM {}{}", from, where_sql),
            cond.params(),
        )?;

        let mut params = cond.params().to_vec();
        params.push(Value::Integer(page.size() as i64));
        params.push(Value::Integer(page.offset() as i64));
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            columns,
            from,
            where_sql,
            order_by,
            params.len() - 1,
            params.len(),
        );

        let items = self
            .query(&sql, &params)?
            .iter()
            .map(map)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PagedResult::new(items, total, page))
    }
}

pub(crate) fn storage(e: SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

/// Accumulates `AND`-joined WHERE clauses with numbered parameters.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    /// Add a parameter and return its placeholder (`?N`).
    pub fn bind(&mut self, v: impl Into<Value>) -> String {
        self.params.push(v.into());
        format!("?{}", self.params.len())
    }

    /// Bind every id and return a comma-separated placeholder list.
    pub fn bind_all(&mut self, ids: &[i64]) -> String {
        ids.iter()
            .map(|id| self.bind(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn and(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Distinct ids in request order.
pub(crate) fn distinct_ids(ids: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// Search text for a `LIKE ... ESCAPE '\'` substring match; `None` when
/// blank. `%` and `_` in the text match themselves.
pub(crate) fn like_pattern(text: Option<&str>) -> Option<String> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::model::{AssetInput, AssetTypeSeed, DepartmentSeed};
    use assetreg_sql::SqliteStore;
    use chrono::NaiveDate;

    /// Service over an in-memory store with departments `HC`, `KT` and asset
    /// types 1 (20%/yr) and 2 (10%/yr).
    pub fn service() -> FixedAssetService {
        service_on(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    /// Same seed data as [`service`], over the given store.
    pub fn service_on(sql: Arc<dyn SQLStore>) -> FixedAssetService {
        let svc = FixedAssetService::new(sql, 3).unwrap();
        for (code, name) in [("HC", "Administration"), ("KT", "Accounting")] {
            svc.upsert_department(&DepartmentSeed {
                code: code.into(),
                symbol: code.into(),
                name: name.into(),
            })
            .unwrap();
        }
        for (code, name, years, rate) in [(1, "Computers", 5, 20.0), (2, "Furniture", 10, 10.0)] {
            svc.upsert_asset_type(&AssetTypeSeed {
                code,
                symbol: format!("T{}", code),
                name: name.into(),
                years_of_use: years,
                depreciation_rate: rate,
            })
            .unwrap();
        }
        svc
    }

    pub fn asset_input(name: &str) -> AssetInput {
        AssetInput {
            asset_code: None,
            asset_name: name.into(),
            dept_code: "HC".into(),
            type_code: 1,
            purchase_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            quantity: 1,
            purchase_price: 1000.0,
        }
    }

    pub fn asset_count(svc: &FixedAssetService) -> u64 {
        svc.count("SELECT COUNT(*) AS cnt FROM assets", &[]).unwrap()
    }
}
