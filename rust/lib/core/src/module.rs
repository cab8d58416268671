use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module implements this trait to register its API
/// endpoints. The binary entry point collects all modules and merges their
/// routes into a single Router. Modules own their top-level paths
/// (e.g. `/assets`), so routers are merged rather than nested.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes, already bound to their state.
    fn routes(&self) -> Router;
}
