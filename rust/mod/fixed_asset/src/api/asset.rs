use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use assetreg_core::{PagedResult, ServiceError};

use super::{AppState, PageQuery};
use crate::model::{AssetInput, AssetListItem, AssetType, AssetView, Department};
use crate::service::{AssetFilter, BulkDeleteAssets};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/filter", get(filter_assets))
        .route("/assets/available-for-voucher", get(available_for_voucher))
        .route("/assets/next-asset-code", get(next_asset_code))
        .route("/assets/check-code/{asset_code}", get(check_code))
        .route("/assets/departments", get(list_departments))
        .route("/assets/asset-types", get(list_asset_types))
        .route("/assets/bulk-delete", delete(bulk_delete))
        .route(
            "/assets/{id}",
            get(get_asset).put(update_asset).delete(delete_asset),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetQuery {
    page_number: Option<i64>,
    page_size: Option<i64>,
    search_text: Option<String>,
    department_code: Option<String>,
    type_code: Option<i64>,
}

impl AssetQuery {
    fn split(self) -> (AssetFilter, PageQuery) {
        (
            AssetFilter {
                search_text: self.search_text,
                department_code: self.department_code,
                type_code: self.type_code,
            },
            PageQuery {
                page_number: self.page_number,
                page_size: self.page_size,
            },
        )
    }
}

async fn list_assets(
    State(svc): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<PagedResult<AssetListItem>>, ServiceError> {
    svc.list_assets(&AssetFilter::default(), &q.page()).map(Json)
}

async fn filter_assets(
    State(svc): State<AppState>,
    Query(q): Query<AssetQuery>,
) -> Result<Json<PagedResult<AssetListItem>>, ServiceError> {
    let (filter, page) = q.split();
    svc.list_assets(&filter, &page.page()).map(Json)
}

async fn available_for_voucher(
    State(svc): State<AppState>,
    Query(q): Query<AssetQuery>,
) -> Result<Json<PagedResult<AssetListItem>>, ServiceError> {
    let (filter, page) = q.split();
    svc.list_assets_available_for_voucher(&filter, &page.page()).map(Json)
}

async fn next_asset_code(
    State(svc): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let code = svc.next_asset_code()?;
    Ok(Json(serde_json::json!({ "assetCode": code })))
}

async fn check_code(
    State(svc): State<AppState>,
    Path(asset_code): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let exists = svc.asset_code_exists(&asset_code)?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn list_departments(
    State(svc): State<AppState>,
) -> Result<Json<Vec<Department>>, ServiceError> {
    svc.list_departments().map(Json)
}

async fn list_asset_types(
    State(svc): State<AppState>,
) -> Result<Json<Vec<AssetType>>, ServiceError> {
    svc.list_asset_types().map(Json)
}

async fn get_asset(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AssetView>, ServiceError> {
    svc.get_asset(id).map(Json)
}

async fn create_asset(
    State(svc): State<AppState>,
    Json(body): Json<AssetInput>,
) -> Result<(StatusCode, Json<AssetView>), ServiceError> {
    let asset = svc.create_asset(&body)?;
    Ok((StatusCode::CREATED, Json(asset)))
}

async fn update_asset(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AssetInput>,
) -> Result<Json<AssetView>, ServiceError> {
    svc.update_asset(id, &body).map(Json)
}

async fn delete_asset(
    State(svc): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_asset(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body: a JSON array of asset ids.
async fn bulk_delete(
    State(svc): State<AppState>,
    Json(ids): Json<Vec<i64>>,
) -> Result<Json<BulkDeleteAssets>, ServiceError> {
    svc.bulk_delete_assets(&ids).map(Json)
}
