//! Application state shared across handlers

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::context::AgendaContext;
use crate::lifecycle::AppointmentController;
use crate::middleware::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub appointments: AppointmentController,
    pub catalog: Catalog,
    pub verifier: Option<Arc<TokenVerifier>>,
    pub store_backend: &'static str,
}

impl AppState {
    pub fn new(ctx: AgendaContext, verifier: Option<TokenVerifier>) -> Self {
        Self {
            store_backend: ctx.store.backend_tag(),
            appointments: AppointmentController::new(ctx.clone()),
            catalog: Catalog::new(ctx),
            verifier: verifier.map(Arc::new),
        }
    }
}
