//! Bound and unbound tool queries.
//!
//! Both sides share one filter object and one code path down to the store;
//! only the [`Membership`] flag differs. For a fixed agent and filter the two
//! result sets partition the matching active tools, as long as all pages are
//! read from one consistent snapshot. Each call reads its count and slice in
//! one read transaction, but pages fetched by separate calls may observe
//! binds that happened in between.

use std::sync::Arc;

use log::info;

use crate::config::QueryConfig;
use crate::domain::{AgentId, Membership, Page, PageRequest, Tool, ToolFilter};
use crate::error::Result;
use crate::id::CategoryId;
use crate::store::BindingStore;

/// Read-side engine over a [`BindingStore`]
#[derive(Debug)]
pub struct MembershipQuery<S: BindingStore> {
    store: Arc<S>,
    config: QueryConfig,
}

impl<S: BindingStore> MembershipQuery<S> {
    pub fn new(store: Arc<S>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Active tools bound to `agent_id` that match `filter`.
    pub fn query_bound(&self, agent_id: &AgentId, filter: &ToolFilter, page: PageRequest) -> Result<Page<Tool>> {
        self.query(Membership::Bound, agent_id, filter, page)
    }

    /// Active tools not bound to `agent_id` that match `filter`.
    pub fn query_unbound(&self, agent_id: &AgentId, filter: &ToolFilter, page: PageRequest) -> Result<Page<Tool>> {
        self.query(Membership::Unbound, agent_id, filter, page)
    }

    pub fn query(
        &self,
        membership: Membership,
        agent_id: &AgentId,
        filter: &ToolFilter,
        page: PageRequest,
    ) -> Result<Page<Tool>> {
        info!(
            "Querying {} tools for agent: {} (keyword={:?}, categoryId={:?})",
            membership,
            agent_id,
            filter.keyword(),
            filter.category_id().map(|c| c.to_string())
        );

        let result = self.store.query_tools(membership, agent_id, filter, page)?;

        info!(
            "Found {} {} tools for agent {} (page {}/{})",
            result.total_elements,
            membership,
            agent_id,
            result.page,
            result.total_pages
        );
        Ok(result)
    }

    /// Build a page request, defaulting to page 1 and the configured size.
    pub fn page_request(&self, page: Option<i64>, size: Option<i64>) -> Result<PageRequest> {
        PageRequest::new(
            page.unwrap_or(1),
            size.unwrap_or_else(|| i64::from(self.config.default_page_size)),
            self.config.max_page_size,
        )
    }

    /// Build a filter under the configured keyword length limit.
    pub fn filter(&self, keyword: Option<&str>, category_id: Option<CategoryId>) -> Result<ToolFilter> {
        ToolFilter::new(keyword, category_id, self.config.max_keyword_len)
    }
}
