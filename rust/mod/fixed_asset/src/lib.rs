pub mod api;
pub mod code;
pub mod model;
pub mod service;

use std::sync::Arc;

use assetreg_core::Module;
use axum::Router;

use service::FixedAssetService;

/// Fixed-asset register: assets, increase vouchers and their reference data.
pub struct FixedAssetModule {
    service: Arc<FixedAssetService>,
}

impl FixedAssetModule {
    pub fn new(service: FixedAssetService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Module for FixedAssetModule {
    fn name(&self) -> &str {
        "fixed_asset"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
