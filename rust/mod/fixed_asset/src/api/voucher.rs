use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use assetreg_core::{PagedResult, ServiceError};

use super::{AppState, PageQuery};
use crate::model::{VoucherInput, VoucherSummary, VoucherView};
use crate::service::{BulkDeleteVouchers, VoucherFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/increase-vouchers", get(list_vouchers).post(create_voucher))
        .route("/increase-vouchers/filter", get(filter_vouchers))
        .route("/increase-vouchers/next-voucher-no", get(next_voucher_no))
        .route(
            "/increase-vouchers/check-voucher-no/{voucher_no}",
            get(check_voucher_no),
        )
        .route("/increase-vouchers/bulk-delete", delete(bulk_delete))
        .route(
            "/increase-vouchers/{id}",
            get(get_voucher).put(update_voucher).delete(delete_voucher),
        )
        .route(
            "/increase-vouchers/{id}/details/{detail_id}",
            delete(delete_detail),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoucherQuery {
    page_number: Option<i64>,
    page_size: Option<i64>,
    search_text: Option<String>,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    total_original_price: Option<f64>,
}

async fn list_vouchers(
    State(svc): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<PagedResult<VoucherSummary>>, ServiceError> {
    svc.list_vouchers(&VoucherFilter::default(), &q.page()).map(Json)
}

async fn filter_vouchers(
    State(svc): State<AppState>,
    Query(q): Query<VoucherQuery>,
) -> Result<Json<PagedResult<VoucherSummary>>, ServiceError> {
    let page = PageQuery {
        page_number: q.page_number,
        page_size: q.page_size,
    };
    let filter = VoucherFilter {
        search_text: q.search_text,
        from_date: q.from_date,
        to_date: q.to_date,
        total_original_price: q.total_original_price,
    };
    svc.list_vouchers(&filter, &page.page()).map(Json)
}

async fn next_voucher_no(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let no = svc.next_voucher_no()?;
    Ok(Json(serde_json::json!({ "voucherNo": no })))
}

async fn check_voucher_no(
    State(svc): State<AppState>,
    Path(voucher_no): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let exists = svc.voucher_no_exists(&voucher_no)?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn get_voucher(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VoucherView>, ServiceError> {
    svc.get_voucher(id).map(Json)
}

async fn create_voucher(
    State(svc): State<AppState>,
    Json(body): Json<VoucherInput>,
) -> Result<(StatusCode, Json<VoucherView>), ServiceError> {
    let voucher = svc.create_voucher(&body)?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

async fn update_voucher(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<VoucherInput>,
) -> Result<Json<VoucherView>, ServiceError> {
    svc.update_voucher(id, &body).map(Json)
}

async fn delete_voucher(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_voucher(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_detail(
    State(svc): State<AppState>,
    Path((voucher_id, detail_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_voucher_detail(voucher_id, detail_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body: a JSON array of voucher ids.
async fn bulk_delete(
    State(svc): State<AppState>,
    Json(ids): Json<Vec<i64>>,
) -> Result<Json<BulkDeleteVouchers>, ServiceError> {
    svc.bulk_delete_vouchers(&ids).map(Json)
}
