pub mod asset;
pub mod voucher;

use std::sync::Arc;

use assetreg_core::PageParams;
use axum::Router;
use serde::Deserialize;

use crate::service::FixedAssetService;

/// Shared application state.
pub type AppState = Arc<FixedAssetService>;

/// Build the register API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(asset::routes())
        .merge(voucher::routes())
        .with_state(state)
}

/// `pageNumber` / `pageSize` query parameters.
///
/// Kept as plain optional fields: `#[serde(flatten)]` does not mix with
/// numeric fields under `serde_urlencoded`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageQuery {
    page_number: Option<i64>,
    page_size: Option<i64>,
}

impl PageQuery {
    pub(crate) fn page(&self) -> PageParams {
        let d = PageParams::default();
        PageParams::new(
            self.page_number.unwrap_or(d.page_number),
            self.page_size.unwrap_or(d.page_size),
        )
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::service::testutil;

    pub fn app() -> Router {
        router(Arc::new(testutil::service()))
    }

    pub async fn api(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        let req = builder.body(body).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
        };
        (status, json)
    }

    pub fn asset_body(name: &str) -> serde_json::Value {
        serde_json::json!({
            "assetName": name,
            "deptCode": "HC",
            "typeCode": 1,
            "purchaseDate": "2023-04-01",
            "quantity": 1,
            "purchasePrice": 1500.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let p = PageQuery::default().page();
        assert_eq!((p.number(), p.size()), (1, 10));
        let p = PageQuery { page_number: Some(0), page_size: Some(500) }.page();
        assert_eq!((p.number(), p.size()), (1, 100));
    }
}
