//! Service handle shared by request handlers.

use std::sync::Arc;

use crate::binding::{BindingReconciler, MembershipQuery};
use crate::config::Config;
use crate::store::BindingStore;

use super::handlers;
use super::messages::{ApiRequest, ApiResponse, methods};

/// Owns the reconciler and query engine over one store
#[derive(Debug)]
pub struct ToolService<S: BindingStore> {
    reconciler: BindingReconciler<S>,
    queries: MembershipQuery<S>,
}

impl<S: BindingStore> ToolService<S> {
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            reconciler: BindingReconciler::new(store.clone(), config.binding.clone()),
            queries: MembershipQuery::new(store, config.query.clone()),
        }
    }

    pub fn reconciler(&self) -> &BindingReconciler<S> {
        &self.reconciler
    }

    pub fn queries(&self) -> &MembershipQuery<S> {
        &self.queries
    }

    /// Route a request to its handler.
    pub fn dispatch(&self, request: &ApiRequest) -> ApiResponse {
        log::debug!("Dispatching {}", request.method);
        match request.method.as_str() {
            methods::BOUND => handlers::handle_bound(&request.params, self),
            methods::UNBOUND => handlers::handle_unbound(&request.params, self),
            methods::BIND => handlers::handle_bind(&request.params, self),
            other => ApiResponse::method_not_found(other),
        }
    }
}
