use assetreg_core::{now_rfc3339, PageParams, PagedResult, ServiceError};
use assetreg_sql::{SQLError, Statement, Value};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::{distinct_ids, like_pattern, storage, Conditions, FixedAssetService};
use crate::code::{claim, CodeStore};
use crate::model::{date_text, VoucherDetailView, VoucherInput, VoucherSummary, VoucherView};

const VOUCHER_COLUMNS: &str =
    "v.id, v.voucher_no, v.voucher_date, v.increase_date, v.note, v.created_at, v.updated_at";

const DETAIL_COUNT: &str = "(SELECT COUNT(*) FROM asset_increase_voucher_details vd
    WHERE vd.voucher_id = v.id)";

const TOTAL_ORIGINAL_PRICE: &str = "(SELECT COALESCE(SUM(a.purchase_price), 0)
    FROM asset_increase_voucher_details vd JOIN assets a ON a.id = vd.asset_id
    WHERE vd.voucher_id = v.id)";

/// Two totals closer than this are the same amount.
const PRICE_TOLERANCE: f64 = 0.005;

const INSERT_DETAIL: &str = "INSERT INTO asset_increase_voucher_details (voucher_id, asset_id, created_at)
    VALUES (?1, ?2, ?3)";

/// Optional voucher list filters. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
    /// Substring of the voucher number or note.
    pub search_text: Option<String>,
    /// Inclusive bounds on the voucher date.
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub total_original_price: Option<f64>,
}

impl VoucherFilter {
    fn conditions(&self) -> Conditions {
        let mut c = Conditions::default();
        if let Some(pattern) = like_pattern(self.search_text.as_deref()) {
            let p = c.bind(pattern);
            c.and(format!("(v.voucher_no LIKE {p} ESCAPE '\\' OR v.note LIKE {p} ESCAPE '\\')"));
        }
        if let Some(from) = self.from_date {
            let p = c.bind(date_text(from));
            c.and(format!("v.voucher_date >= {p}"));
        }
        if let Some(to) = self.to_date {
            let p = c.bind(date_text(to));
            c.and(format!("v.voucher_date <= {p}"));
        }
        if let Some(total) = self.total_original_price.filter(|t| t.is_finite()) {
            let p = c.bind(total);
            c.and(format!("ABS({} - {p}) < {}", TOTAL_ORIGINAL_PRICE, PRICE_TOLERANCE));
        }
        c
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkDeleteVouchers {
    pub deleted: u64,
}

impl FixedAssetService {
    /// Preview the next generated voucher number. Nothing is reserved.
    pub fn next_voucher_no(&self) -> Result<String, ServiceError> {
        self.voucher_nos.next_code()
    }

    pub fn voucher_no_exists(&self, voucher_no: &str) -> Result<bool, ServiceError> {
        self.voucher_nos.store().contains(voucher_no.trim())
    }

    pub fn get_voucher(&self, id: i64) -> Result<VoucherView, ServiceError> {
        let sql = format!(
            "SELECT {} FROM asset_increase_vouchers v WHERE v.id = ?1",
            VOUCHER_COLUMNS
        );
        let rows = self.query(&sql, &[Value::from(id)])?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("increase voucher {} not found", id)))?;

        let details = self
            .query(
                "SELECT vd.id, vd.voucher_id, vd.asset_id, a.asset_code, a.asset_name,
                        a.purchase_price, vd.created_at
                 FROM asset_increase_voucher_details vd
                 JOIN assets a ON a.id = vd.asset_id
                 WHERE vd.voucher_id = ?1
                 ORDER BY vd.id",
                &[Value::from(id)],
            )?
            .iter()
            .map(VoucherDetailView::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        VoucherView::from_row(row, details)
    }

    /// Create a voucher and its details in one transaction. A blank
    /// `voucherNo` is generated; a supplied one must not exist yet.
    pub fn create_voucher(&self, input: &VoucherInput) -> Result<VoucherView, ServiceError> {
        input.validate()?;
        let asset_ids = input.asset_ids();
        self.ensure_assets_exist(&asset_ids)?;

        let now = now_rfc3339();
        let note = input.note();
        let details = |voucher_id: i64| -> Vec<Statement> {
            asset_ids
                .iter()
                .map(|asset_id| {
                    Statement::new(
                        INSERT_DETAIL,
                        vec![voucher_id.into(), (*asset_id).into(), now.as_str().into()],
                    )
                })
                .collect()
        };
        let write = |no: &str| -> Result<i64, SQLError> {
            let head = Statement::new(
                "INSERT INTO asset_increase_vouchers
                    (voucher_no, voucher_date, increase_date, note, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                vec![
                    no.into(),
                    date_text(input.voucher_date).into(),
                    date_text(input.increase_date).into(),
                    note.clone().into(),
                    now.as_str().into(),
                ],
            );
            self.sql.insert_batch(&head, &details)
        };

        let written = match input.requested_no() {
            Some(no) => claim(self.voucher_nos.store(), no, |no| Ok((no.to_string(), write(no)?))),
            None => self.voucher_nos.claim_next(|no| Ok((no.to_string(), write(no)?))),
        };
        let (no, id) = written.map_err(|e| self.explain_write_failure(e, None, &asset_ids))?;

        info!(id, voucher_no = %no, details = asset_ids.len(), "increase voucher created");
        self.get_voucher(id)
    }

    /// Replace a voucher's fields and details. At least one detail is
    /// required; a blank `voucherNo` keeps the current number.
    pub fn update_voucher(&self, id: i64, input: &VoucherInput) -> Result<VoucherView, ServiceError> {
        input.validate()?;
        let asset_ids = input.asset_ids();
        if asset_ids.is_empty() {
            return Err(ServiceError::Validation(
                "an increase voucher needs at least one detail".into(),
            ));
        }
        let current = self.get_voucher(id)?;
        self.ensure_assets_exist(&asset_ids)?;

        let no = input.requested_no().unwrap_or(&current.voucher_no).to_string();
        let now = now_rfc3339();
        let note = input.note();
        let write = |no: &str| -> Result<u64, SQLError> {
            let mut stmts = vec![
                Statement::new(
                    "UPDATE asset_increase_vouchers SET
                        voucher_no = ?1, voucher_date = ?2, increase_date = ?3,
                        note = ?4, updated_at = ?5
                     WHERE id = ?6",
                    vec![
                        no.into(),
                        date_text(input.voucher_date).into(),
                        date_text(input.increase_date).into(),
                        note.clone().into(),
                        now.as_str().into(),
                        id.into(),
                    ],
                ),
                Statement::new(
                    "DELETE FROM asset_increase_voucher_details WHERE voucher_id = ?1",
                    vec![id.into()],
                ),
            ];
            stmts.extend(asset_ids.iter().map(|asset_id| {
                Statement::new(
                    INSERT_DETAIL,
                    vec![id.into(), (*asset_id).into(), now.as_str().into()],
                )
            }));
            self.sql.exec_batch(&stmts)
        };

        let written = if no != current.voucher_no {
            claim(self.voucher_nos.store(), &no, write)
        } else {
            write(&no).map_err(storage)
        };
        written.map_err(|e| self.explain_write_failure(e, Some(id), &asset_ids))?;

        info!(id, voucher_no = %no, details = asset_ids.len(), "increase voucher updated");
        self.get_voucher(id)
    }

    /// Delete a voucher; its details go with it.
    pub fn delete_voucher(&self, id: i64) -> Result<(), ServiceError> {
        let affected = self.exec(
            "DELETE FROM asset_increase_vouchers WHERE id = ?1",
            &[id.into()],
        )?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("increase voucher {} not found", id)));
        }
        info!(id, "increase voucher deleted");
        Ok(())
    }

    /// Remove one detail line from a voucher.
    pub fn delete_voucher_detail(&self, voucher_id: i64, detail_id: i64) -> Result<(), ServiceError> {
        let affected = self.exec(
            "DELETE FROM asset_increase_voucher_details WHERE id = ?1 AND voucher_id = ?2",
            &[detail_id.into(), voucher_id.into()],
        )?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "detail {} of increase voucher {} not found",
                detail_id, voucher_id
            )));
        }
        info!(voucher_id, detail_id, "increase voucher detail deleted");
        Ok(())
    }

    pub fn bulk_delete_vouchers(&self, ids: &[i64]) -> Result<BulkDeleteVouchers, ServiceError> {
        let ids = distinct_ids(ids);
        if ids.is_empty() {
            return Err(ServiceError::Validation("no voucher ids given".into()));
        }
        let mut c = Conditions::default();
        let list = c.bind_all(&ids);
        let deleted = self.exec(
            &format!("DELETE FROM asset_increase_vouchers WHERE id IN ({})", list),
            c.params(),
        )?;
        info!(deleted, requested = ids.len(), "increase vouchers bulk deleted");
        Ok(BulkDeleteVouchers { deleted })
    }

    /// Newest first, with detail count and total original price.
    pub fn list_vouchers(
        &self,
        filter: &VoucherFilter,
        page: &PageParams,
    ) -> Result<PagedResult<VoucherSummary>, ServiceError> {
        let columns = format!(
            "{}, {} AS detail_count, {} AS total_original_price",
            VOUCHER_COLUMNS, DETAIL_COUNT, TOTAL_ORIGINAL_PRICE
        );
        self.list_page(
            &columns,
            "asset_increase_vouchers v",
            &filter.conditions(),
            "v.created_at DESC, v.id DESC",
            page,
            VoucherSummary::from_row,
        )
    }

    /// A voucher write that passed its checks can still lose a race with a
    /// delete, and then fails a foreign key. Report the voucher or asset
    /// that went missing; any other failure is returned unchanged.
    fn explain_write_failure(
        &self,
        err: ServiceError,
        voucher_id: Option<i64>,
        asset_ids: &[i64],
    ) -> ServiceError {
        if !matches!(err, ServiceError::Storage(_)) {
            return err;
        }
        if let Some(id) = voucher_id {
            if let Err(gone @ ServiceError::NotFound(_)) = self.get_voucher(id) {
                return gone;
            }
        }
        match self.ensure_assets_exist(asset_ids) {
            Err(missing @ ServiceError::Validation(_)) => missing,
            _ => err,
        }
    }

    /// Fail with a validation error naming any id that is not an asset.
    fn ensure_assets_exist(&self, ids: &[i64]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut c = Conditions::default();
        let list = c.bind_all(ids);
        let found: Vec<i64> = self
            .query(&format!("SELECT id FROM assets WHERE id IN ({})", list), c.params())?
            .iter()
            .filter_map(|r| r.get_i64("id"))
            .collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(format!(
                "assets not found: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
