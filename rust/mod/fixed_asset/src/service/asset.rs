use assetreg_core::{now_rfc3339, PageParams, PagedResult, ServiceError};
use assetreg_sql::{SQLError, Value};
use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{distinct_ids, like_pattern, storage, Conditions, FixedAssetService};
use crate::code::{claim, CodeStore};
use crate::model::asset::annual_depreciation;
use crate::model::{date_text, AssetInput, AssetListItem, AssetType, AssetView, Department};

const ASSET_FROM: &str = "assets a
    JOIN departments d ON d.id = a.department_id
    JOIN asset_types t ON t.id = a.type_id";

const ASSET_COLUMNS: &str = "a.id, a.asset_code, a.asset_symbol, a.asset_name,
    a.department_id, d.department_code, d.department_name,
    a.type_id, t.type_code, t.type_name,
    a.purchase_date, a.purchase_year, a.start_tracking_year,
    a.years_of_use, a.depreciation_rate, a.quantity, a.purchase_price,
    a.annual_depreciation_value, a.created_at, a.updated_at";

const LIST_COLUMNS: &str = "a.id, a.asset_code, a.asset_name, t.type_name, d.department_name,
    a.quantity, a.purchase_price, a.annual_depreciation_value, a.start_tracking_year";

const NEWEST_FIRST: &str = "a.created_at DESC, a.id DESC";

const NOT_IN_VOUCHER: &str = "NOT EXISTS (
    SELECT 1 FROM asset_increase_voucher_details vd WHERE vd.asset_id = a.id)";

/// Optional asset list filters. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    /// Substring of the asset code or name.
    pub search_text: Option<String>,
    pub department_code: Option<String>,
    /// Ignored unless greater than 0.
    pub type_code: Option<i64>,
}

impl AssetFilter {
    fn conditions(&self) -> Conditions {
        let mut c = Conditions::default();
        if let Some(pattern) = like_pattern(self.search_text.as_deref()) {
            let p = c.bind(pattern);
            c.and(format!("(a.asset_code LIKE {p} ESCAPE '\\' OR a.asset_name LIKE {p} ESCAPE '\\')"));
        }
        if let Some(dept) = self
            .department_code
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let p = c.bind(dept);
            c.and(format!("d.department_code = {p}"));
        }
        if let Some(code) = self.type_code.filter(|t| *t > 0) {
            let p = c.bind(code);
            c.and(format!("t.type_code = {p}"));
        }
        c
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteAssets {
    pub deleted_count: u64,
    /// Distinct ids in the request.
    pub total_count: u64,
    /// Requested assets kept because a voucher references them.
    pub cannot_delete_count: u64,
}

/// Column values derived from an input and its resolved references.
struct AssetRow<'a> {
    input: &'a AssetInput,
    department: Department,
    asset_type: AssetType,
    year: i64,
    annual: f64,
}

impl FixedAssetService {
    /// Preview the next generated asset code. Nothing is reserved.
    pub fn next_asset_code(&self) -> Result<String, ServiceError> {
        self.asset_codes.next_code()
    }

    pub fn asset_code_exists(&self, code: &str) -> Result<bool, ServiceError> {
        self.asset_codes.store().contains(code.trim())
    }

    pub fn get_asset(&self, id: i64) -> Result<AssetView, ServiceError> {
        let sql = format!("SELECT {} FROM {} WHERE a.id = ?1", ASSET_COLUMNS, ASSET_FROM);
        let rows = self.query(&sql, &[Value::from(id)])?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("asset {} not found", id)))?;
        AssetView::from_row(row)
    }

    /// Create an asset. A blank `assetCode` is generated; a supplied one is
    /// used as-is after trimming and must not exist yet.
    pub fn create_asset(&self, input: &AssetInput) -> Result<AssetView, ServiceError> {
        let row = self.resolve(input)?;
        let now = now_rfc3339();
        let insert = |code: &str| -> Result<i64, SQLError> {
            self.sql.insert(
                "INSERT INTO assets (
                    asset_code, asset_symbol, asset_name, department_id, type_id,
                    purchase_date, purchase_year, start_tracking_year,
                    years_of_use, depreciation_rate, quantity, purchase_price,
                    annual_depreciation_value, created_at, updated_at)
                 VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                &row.params(code, &[now.as_str().into()]),
            )
        };

        let id = match input.requested_code() {
            Some(code) => claim(self.asset_codes.store(), code, insert)?,
            None => self.asset_codes.claim_next(insert)?,
        };

        let asset = self.get_asset(id)?;
        info!(id, code = %asset.asset_code, "asset created");
        Ok(asset)
    }

    /// Replace an asset's fields. A blank `assetCode` keeps the current code;
    /// a different one must not exist yet. Derived fields are recomputed.
    pub fn update_asset(&self, id: i64, input: &AssetInput) -> Result<AssetView, ServiceError> {
        let current = self.get_asset(id)?;
        let row = self.resolve(input)?;
        let code = input.requested_code().unwrap_or(&current.asset_code).to_string();
        let now = now_rfc3339();

        let update = |code: &str| -> Result<u64, SQLError> {
            let params = row.params(code, &[now.as_str().into(), id.into()]);
            self.sql.exec(
                "UPDATE assets SET
                    asset_code = ?1, asset_symbol = ?1, asset_name = ?2,
                    department_id = ?3, type_id = ?4, purchase_date = ?5,
                    purchase_year = ?6, start_tracking_year = ?6,
                    years_of_use = ?7, depreciation_rate = ?8, quantity = ?9,
                    purchase_price = ?10, annual_depreciation_value = ?11,
                    updated_at = ?12
                 WHERE id = ?13",
                &params,
            )
        };

        let affected = if code != current.asset_code {
            claim(self.asset_codes.store(), &code, update)?
        } else {
            update(&code).map_err(storage)?
        };
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("asset {} not found", id)));
        }

        info!(id, code = %code, "asset updated");
        self.get_asset(id)
    }

    /// Delete an asset that no voucher references.
    pub fn delete_asset(&self, id: i64) -> Result<(), ServiceError> {
        let exists = self.count("SELECT COUNT(*) AS cnt FROM assets WHERE id = ?1", &[id.into()])?;
        if exists == 0 {
            return Err(ServiceError::NotFound(format!("asset {} not found", id)));
        }
        if self.is_in_voucher(id)? {
            warn!(id, "refusing to delete asset referenced by a voucher");
            return Err(in_voucher(id));
        }

        match self.sql.exec("DELETE FROM assets WHERE id = ?1", &[id.into()]) {
            Ok(0) => Err(ServiceError::NotFound(format!("asset {} not found", id))),
            Ok(_) => {
                info!(id, "asset deleted");
                Ok(())
            }
            // A voucher picked it up after the check.
            Err(SQLError::Constraint(_)) => Err(in_voucher(id)),
            Err(e) => Err(storage(e)),
        }
    }

    /// Delete every listed asset that exists and is not referenced by a
    /// voucher; referenced ones are counted and kept.
    pub fn bulk_delete_assets(&self, ids: &[i64]) -> Result<BulkDeleteAssets, ServiceError> {
        let ids = distinct_ids(ids);
        if ids.is_empty() {
            return Err(ServiceError::Validation("no asset ids given".into()));
        }

        let mut referenced = Conditions::default();
        let list = referenced.bind_all(&ids);
        let cannot_delete = self.count(
            &format!(
                "SELECT COUNT(DISTINCT asset_id) AS cnt FROM asset_increase_voucher_details
                 WHERE asset_id IN ({})",
                list
            ),
            referenced.params(),
        )?;

        let mut del = Conditions::default();
        let list = del.bind_all(&ids);
        let deleted = self.exec(
            &format!(
                "DELETE FROM assets WHERE id IN ({}) AND NOT EXISTS (
                    SELECT 1 FROM asset_increase_voucher_details vd WHERE vd.asset_id = assets.id)",
                list
            ),
            del.params(),
        )?;

        if cannot_delete > 0 {
            warn!(cannot_delete, "bulk delete kept assets referenced by vouchers");
        }
        info!(deleted, requested = ids.len(), "assets bulk deleted");
        Ok(BulkDeleteAssets {
            deleted_count: deleted,
            total_count: ids.len() as u64,
            cannot_delete_count: cannot_delete,
        })
    }

    /// Newest first, with depreciation to date.
    pub fn list_assets(
        &self,
        filter: &AssetFilter,
        page: &PageParams,
    ) -> Result<PagedResult<AssetListItem>, ServiceError> {
        self.asset_page(filter.conditions(), page)
    }

    /// Like [`list_assets`](Self::list_assets), restricted to assets no
    /// voucher references yet.
    pub fn list_assets_available_for_voucher(
        &self,
        filter: &AssetFilter,
        page: &PageParams,
    ) -> Result<PagedResult<AssetListItem>, ServiceError> {
        let mut cond = filter.conditions();
        cond.and(NOT_IN_VOUCHER);
        self.asset_page(cond, page)
    }

    fn asset_page(
        &self,
        cond: Conditions,
        page: &PageParams,
    ) -> Result<PagedResult<AssetListItem>, ServiceError> {
        let year = Utc::now().year() as i64;
        self.list_page(LIST_COLUMNS, ASSET_FROM, &cond, NEWEST_FIRST, page, |row| {
            AssetListItem::from_row(row, year)
        })
    }

    pub(crate) fn is_in_voucher(&self, asset_id: i64) -> Result<bool, ServiceError> {
        Ok(self.count(
            "SELECT COUNT(*) AS cnt FROM asset_increase_voucher_details WHERE asset_id = ?1",
            &[asset_id.into()],
        )? > 0)
    }

    /// Validate `input` and resolve its department and type.
    fn resolve<'a>(&self, input: &'a AssetInput) -> Result<AssetRow<'a>, ServiceError> {
        input.validate()?;
        let dept_code = input.dept_code.trim();
        let department = self.department_by_code(dept_code)?.ok_or_else(|| {
            ServiceError::Validation(format!("department '{}' does not exist", dept_code))
        })?;
        let asset_type = self.asset_type_by_code(input.type_code)?.ok_or_else(|| {
            ServiceError::Validation(format!("asset type {} does not exist", input.type_code))
        })?;
        Ok(AssetRow {
            input,
            year: input.purchase_date.year() as i64,
            annual: annual_depreciation(input.purchase_price, asset_type.depreciation_rate),
            department,
            asset_type,
        })
    }
}

impl AssetRow<'_> {
    /// Column parameters `?1..=?11`, followed by `tail`.
    fn params(&self, code: &str, tail: &[Value]) -> Vec<Value> {
        let mut params: Vec<Value> = vec![
            code.into(),
            self.input.asset_name.trim().into(),
            self.department.id.into(),
            self.asset_type.id.into(),
            date_text(self.input.purchase_date).into(),
            self.year.into(),
            self.asset_type.years_of_use.into(),
            self.asset_type.depreciation_rate.into(),
            self.input.quantity.into(),
            self.input.purchase_price.into(),
            self.annual.into(),
        ];
        params.extend_from_slice(tail);
        params
    }
}

fn in_voucher(id: i64) -> ServiceError {
    ServiceError::Validation(format!(
        "asset {} is referenced by an increase voucher and cannot be deleted",
        id
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::super::testutil::{asset_count, asset_input, service};
    use super::*;
    use chrono::NaiveDate;

    fn with_code(name: &str, code: &str) -> AssetInput {
        AssetInput {
            asset_code: Some(code.into()),
            ..asset_input(name)
        }
    }

    #[test]
    fn create_generates_sequential_codes() {
        let svc = service();
        assert_eq!(svc.next_asset_code().unwrap(), "TS00001");
        let a = svc.create_asset(&asset_input("Laptop")).unwrap();
        let b = svc.create_asset(&asset_input("Monitor")).unwrap();
        assert_eq!(a.asset_code, "TS00001");
        assert_eq!(a.asset_symbol, "TS00001");
        assert_eq!(b.asset_code, "TS00002");
        assert_eq!(svc.next_asset_code().unwrap(), "TS00003");
    }

    #[test]
    fn create_derives_depreciation_fields() {
        let svc = service();
        let a = svc
            .create_asset(&AssetInput {
                purchase_price: 20_000_000.0,
                purchase_date: NaiveDate::from_ymd_opt(2021, 11, 30).unwrap(),
                ..asset_input("Server")
            })
            .unwrap();
        assert_eq!(a.purchase_year, 2021);
        assert_eq!(a.start_tracking_year, 2021);
        assert_eq!(a.years_of_use, 5);
        assert_eq!(a.depreciation_rate, 20.0);
        assert_eq!(a.annual_depreciation_value, 4_000_000.0);
        assert_eq!(a.department_code, "HC");
        assert_eq!(a.type_name, "Computers");
    }

    #[test]
    fn explicit_code_is_trimmed_and_feeds_the_scan() {
        let svc = service();
        let a = svc.create_asset(&with_code("Desk", "  TS00040 ")).unwrap();
        assert_eq!(a.asset_code, "TS00040");
        assert!(svc.asset_code_exists("TS00040").unwrap());
        assert_eq!(svc.next_asset_code().unwrap(), "TS00041");
    }

    #[test]
    fn duplicate_explicit_code_is_rejected_without_write() {
        let svc = service();
        svc.create_asset(&with_code("Desk", "TS00007")).unwrap();
        let err = svc.create_asset(&with_code("Chair", "TS00007")).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCode(ref c) if c == "TS00007"));
        assert_eq!(asset_count(&svc), 1);
    }

    #[test]
    fn stale_preview_is_rejected() {
        let svc = service();
        let preview = svc.next_asset_code().unwrap();
        svc.create_asset(&asset_input("Laptop")).unwrap();
        let err = svc.create_asset(&with_code("Phone", &preview)).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCode(_)));
        assert_eq!(svc.next_asset_code().unwrap(), "TS00002");
    }

    #[test]
    fn malformed_codes_do_not_break_generation() {
        let svc = service();
        for code in ["TSxyz", "TSA0002", "ts00009", "OLD-17"] {
            svc.create_asset(&with_code("Legacy", code)).unwrap();
        }
        assert_eq!(svc.create_asset(&asset_input("New")).unwrap().asset_code, "TS00001");
    }

    #[test]
    fn concurrent_creates_get_distinct_codes() {
        let svc = Arc::new(service());
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let (svc, barrier) = (svc.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    svc.create_asset(&asset_input(&format!("Asset {}", i)))
                        .unwrap()
                        .asset_code
                })
            })
            .collect();
        let mut codes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        codes.sort();
        assert_eq!(codes, vec!["TS00001", "TS00002"]);
    }

    #[test]
    fn unknown_references_are_validation_errors() {
        let svc = service();
        let err = svc
            .create_asset(&AssetInput { dept_code: "XX".into(), ..asset_input("A") })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = svc
            .create_asset(&AssetInput { type_code: 9, ..asset_input("A") })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(asset_count(&svc), 0);
    }

    #[test]
    fn update_keeps_or_changes_code() {
        let svc = service();
        let a = svc.create_asset(&asset_input("Laptop")).unwrap();
        svc.create_asset(&asset_input("Monitor")).unwrap();

        let kept = svc
            .update_asset(a.id, &AssetInput { type_code: 2, ..asset_input("Laptop Pro") })
            .unwrap();
        assert_eq!(kept.asset_code, "TS00001");
        assert_eq!(kept.asset_name, "Laptop Pro");
        assert_eq!(kept.depreciation_rate, 10.0);
        assert_eq!(kept.annual_depreciation_value, 100.0);

        let err = svc.update_asset(a.id, &with_code("Laptop", "TS00002")).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCode(_)));

        let renamed = svc.update_asset(a.id, &with_code("Laptop", "TS00010")).unwrap();
        assert_eq!(renamed.asset_code, "TS00010");
        assert_eq!(renamed.asset_symbol, "TS00010");

        // Re-sending its own code is not a conflict.
        assert!(svc.update_asset(a.id, &with_code("Laptop", "TS00010")).is_ok());

        assert!(matches!(
            svc.update_asset(999, &asset_input("X")),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn delete_and_not_found() {
        let svc = service();
        let a = svc.create_asset(&asset_input("Laptop")).unwrap();
        svc.delete_asset(a.id).unwrap();
        assert!(matches!(svc.get_asset(a.id), Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete_asset(a.id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn bulk_delete_requires_ids() {
        let svc = service();
        assert!(matches!(svc.bulk_delete_assets(&[]), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn list_filters_and_pages() {
        let svc = service();
        for i in 0..12 {
            svc.create_asset(&asset_input(&format!("Laptop {}", i))).unwrap();
        }
        svc.create_asset(&AssetInput { dept_code: "KT".into(), type_code: 2, ..asset_input("Desk") })
            .unwrap();

        let all = svc.list_assets(&AssetFilter::default(), &PageParams::default()).unwrap();
        assert_eq!(all.total_records, 13);
        assert_eq!(all.data.len(), 10);
        assert_eq!(all.total_pages, 2);
        assert!(all.has_next_page);
        // Newest first.
        assert_eq!(all.data[0].asset_name, "Desk");

        let second = svc.list_assets(&AssetFilter::default(), &PageParams::new(2, 10)).unwrap();
        assert_eq!(second.data.len(), 3);
        assert!(!second.has_next_page);

        let by_text = AssetFilter { search_text: Some(" desk ".into()), ..Default::default() };
        assert_eq!(svc.list_assets(&by_text, &PageParams::default()).unwrap().total_records, 1);

        let by_code = AssetFilter { search_text: Some("TS0001".into()), ..Default::default() };
        assert_eq!(svc.list_assets(&by_code, &PageParams::default()).unwrap().total_records, 4);

        let by_dept = AssetFilter { department_code: Some("KT".into()), ..Default::default() };
        assert_eq!(svc.list_assets(&by_dept, &PageParams::default()).unwrap().total_records, 1);

        let by_type = AssetFilter { type_code: Some(1), ..Default::default() };
        assert_eq!(svc.list_assets(&by_type, &PageParams::default()).unwrap().total_records, 12);

        let any_type = AssetFilter { type_code: Some(0), ..Default::default() };
        assert_eq!(svc.list_assets(&any_type, &PageParams::default()).unwrap().total_records, 13);
    }

    #[test]
    fn search_text_wildcards_are_literal() {
        let svc = service();
        svc.create_asset(&asset_input("Chair")).unwrap();
        svc.create_asset(&asset_input("Desk 50% set")).unwrap();
        svc.create_asset(&asset_input("rack_unit")).unwrap();

        let hits = |text: &str| {
            let filter = AssetFilter { search_text: Some(text.into()), ..Default::default() };
            svc.list_assets(&filter, &PageParams::default()).unwrap().total_records
        };
        // `_` would otherwise match the first digit of TS00001.
        assert_eq!(hits("TS_0001"), 0);
        assert_eq!(hits("TS00001"), 1);
        assert_eq!(hits("%"), 1);
        assert_eq!(hits("50% s"), 1);
        assert_eq!(hits("_"), 1);
        assert_eq!(hits("k_u"), 1);
    }

    #[test]
    fn list_items_carry_depreciation_to_date() {
        let svc = service();
        let year = Utc::now().year();
        svc.create_asset(&AssetInput {
            purchase_price: 1000.0,
            purchase_date: NaiveDate::from_ymd_opt(year - 2, 1, 1).unwrap(),
            ..asset_input("Laptop")
        })
        .unwrap();
        let page = svc.list_assets(&AssetFilter::default(), &PageParams::default()).unwrap();
        let item = &page.data[0];
        assert_eq!(item.accumulated_depreciation, 400.0);
        assert_eq!(item.remaining_value, 600.0);
    }
}
