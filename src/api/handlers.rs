//! Binding request handlers
//!
//! Each handler parses its params, runs the operation, and wraps the outcome
//! in the response envelope. Handlers never return `Err`; failures become
//! error envelopes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{AgentId, Membership};
use crate::error::Result;
use crate::store::BindingStore;

use super::messages::{ApiResponse, BindToolsRequest, MembershipRequest};
use super::service::ToolService;

/// Handle binding.bound - active tools bound to an agent
pub fn handle_bound<S: BindingStore>(params: &Value, svc: &ToolService<S>) -> ApiResponse {
    handle_membership(Membership::Bound, params, svc)
}

/// Handle binding.unbound - active tools not bound to an agent
pub fn handle_unbound<S: BindingStore>(params: &Value, svc: &ToolService<S>) -> ApiResponse {
    handle_membership(Membership::Unbound, params, svc)
}

/// Handle binding.bind - replace an agent's tool set
pub fn handle_bind<S: BindingStore>(params: &Value, svc: &ToolService<S>) -> ApiResponse {
    let request: BindToolsRequest = match parse(params) {
        Ok(r) => r,
        Err(response) => return response,
    };

    respond(AgentId::new(request.agent_id).and_then(|agent| svc.reconciler().bind(&agent, &request.tool_ids)))
}

fn handle_membership<S: BindingStore>(membership: Membership, params: &Value, svc: &ToolService<S>) -> ApiResponse {
    let request: MembershipRequest = match parse(params) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let queries = svc.queries();
    let outcome = (|| {
        let agent = AgentId::new(request.agent_id)?;
        let filter = queries.filter(request.keyword.as_deref(), request.category_id)?;
        let page = queries.page_request(request.page, request.size)?;
        queries.query(membership, &agent, &filter, page)
    })();
    respond(outcome)
}

fn parse<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, ApiResponse> {
    serde_json::from_value(params.clone()).map_err(|e| ApiResponse::invalid_params(&e))
}

fn respond<T: Serialize>(outcome: Result<T>) -> ApiResponse {
    match outcome.and_then(|data| Ok(serde_json::to_value(data)?)) {
        Ok(data) => ApiResponse::success(data),
        Err(e) => ApiResponse::from(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    use crate::api::messages::{ApiRequest, ErrorCode, methods};
    use crate::config::Config;
    use crate::domain::NewTool;
    use crate::store::SqliteStore;

    fn service() -> (Arc<SqliteStore>, ToolService<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = ToolService::new(store.clone(), &Config::default());
        (store, svc)
    }

    #[test]
    fn test_bind_then_query_over_envelope() {
        let (store, svc) = service();
        let a = store.create_tool(NewTool::new("alpha")).unwrap();
        let b = store.create_tool(NewTool::new("bravo")).unwrap();

        let bind = svc.dispatch(&ApiRequest::new(
            methods::BIND,
            json!({"agentId": "a1", "toolIds": [a.id, a.id]}),
        ));
        assert!(bind.is_success(), "{bind:?}");
        let data = bind.data.unwrap();
        assert_eq!(data["agentId"], "a1");
        assert_eq!(data["boundToolCount"], 1);

        let bound = svc.dispatch(&ApiRequest::new(methods::BOUND, json!({"agentId": "a1"})));
        let data = bound.data.unwrap();
        assert_eq!(data["totalElements"], 1);
        assert_eq!(data["content"][0]["name"], "alpha");

        let unbound = svc.dispatch(&ApiRequest::new(methods::UNBOUND, json!({"agentId": "a1"})));
        let data = unbound.data.unwrap();
        assert_eq!(data["content"][0]["id"], b.id.to_string());
        assert_eq!(data["page"], 1);
        assert_eq!(data["size"], 20);
    }

    #[test]
    fn test_bind_invalid_ids_envelope() {
        let (store, svc) = service();
        let inactive = store.create_tool(NewTool::new("old").inactive()).unwrap();

        let response = handle_bind(&json!({"agentId": "a1", "toolIds": [inactive.id]}), &svc);
        assert_eq!(response.code, ErrorCode::BAD_REQUEST);
        let error = response.error.unwrap();
        assert_eq!(error.details.unwrap()["invalidIds"], json!([inactive.id.to_string()]));
    }

    #[test]
    fn test_empty_agent_id_reports_field() {
        let (_store, svc) = service();
        let response = handle_bound(&json!({"agentId": ""}), &svc);
        assert_eq!(response.code, ErrorCode::BAD_REQUEST);
        assert_eq!(response.error.unwrap().field.as_deref(), Some("agentId"));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let (_store, svc) = service();
        let response = handle_unbound(&json!({"agentId": "a1", "size": 0}), &svc);
        assert_eq!(response.code, ErrorCode::BAD_REQUEST);
        assert_eq!(response.error.unwrap().field.as_deref(), Some("size"));
    }

    #[test]
    fn test_missing_agent_id_is_invalid_params() {
        let (_store, svc) = service();
        let response = handle_bind(&json!({"toolIds": []}), &svc);
        assert_eq!(response.code, ErrorCode::BAD_REQUEST);
        assert!(response.message.starts_with("Invalid params"));
    }

    #[test]
    fn test_unknown_method() {
        let (_store, svc) = service();
        let response = svc.dispatch(&ApiRequest::new("binding.bindng", json!({})));
        assert_eq!(response.code, ErrorCode::NOT_FOUND);
    }
}
