//! SQL construction for membership queries.
//!
//! Bound and unbound selections share every predicate except the
//! `EXISTS` / `NOT EXISTS` test on the binding table, so the two result sets
//! partition the filtered active tools by construction.

use rusqlite::ToSql;

use crate::domain::{AgentId, Membership, ToolFilter};
use crate::id::CategoryId;

pub(crate) const TOOL_COLUMNS: &str = "t.id, t.name, t.description, t.status, t.category_id, t.created_at, t.updated_at";

/// A membership query for one agent under one filter
pub(crate) struct ToolQuery<'a> {
    membership: Membership,
    agent: &'a str,
    keyword: Option<&'a str>,
    category_id: Option<CategoryId>,
}

impl<'a> ToolQuery<'a> {
    pub fn new(membership: Membership, agent: &'a AgentId, filter: &'a ToolFilter) -> Self {
        Self {
            membership,
            agent: agent.as_str(),
            keyword: filter.keyword(),
            category_id: filter.category_id(),
        }
    }

    fn where_clause(&self) -> String {
        let exists = match self.membership {
            Membership::Bound => "EXISTS",
            Membership::Unbound => "NOT EXISTS",
        };

        let mut clause = format!(
            "t.status = 'active' AND {exists} (SELECT 1 FROM agent_tool_bindings b \
             WHERE b.tool_id = t.id AND b.agent_id = :agent)"
        );

        // instr() rather than LIKE so '%' and '_' in the keyword stay literal.
        // fold_case is registered by schema::init; SQLite's lower() is ASCII-only.
        if self.keyword.is_some() {
            clause.push_str(
                " AND (instr(fold_case(t.name), fold_case(:keyword)) > 0 \
                 OR instr(fold_case(t.description), fold_case(:keyword)) > 0)",
            );
        }
        if self.category_id.is_some() {
            clause.push_str(" AND t.category_id = :category");
        }
        clause
    }

    /// Total matching rows, ignoring pagination
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM tools t WHERE {}", self.where_clause())
    }

    /// One page of matching rows; binds `:limit` and `:offset` in addition to
    /// the filter parameters.
    pub fn page_sql(&self) -> String {
        format!(
            "SELECT {TOOL_COLUMNS} FROM tools t WHERE {} ORDER BY t.name ASC, t.id ASC LIMIT :limit OFFSET :offset",
            self.where_clause()
        )
    }

    /// Named parameters referenced by `where_clause`, in a form rusqlite binds directly.
    pub fn filter_params(&self) -> Vec<(&'static str, &dyn ToSql)> {
        let mut params: Vec<(&'static str, &dyn ToSql)> = vec![(":agent", &self.agent as &dyn ToSql)];
        if let Some(keyword) = &self.keyword {
            params.push((":keyword", keyword as &dyn ToSql));
        }
        if let Some(category) = &self.category_id {
            params.push((":category", category as &dyn ToSql));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AgentId {
        AgentId::new("a1").unwrap()
    }

    #[test]
    fn test_bound_and_unbound_differ_only_in_exists() {
        let agent = agent();
        let filter = ToolFilter::any().with_keyword("disk");
        let bound = ToolQuery::new(Membership::Bound, &agent, &filter).count_sql();
        let unbound = ToolQuery::new(Membership::Unbound, &agent, &filter).count_sql();

        assert_eq!(bound.replace("EXISTS", "NOT EXISTS"), unbound);
    }

    #[test]
    fn test_unfiltered_query_binds_only_agent() {
        let agent = agent();
        let filter = ToolFilter::any();
        let query = ToolQuery::new(Membership::Bound, &agent, &filter);

        let names: Vec<&str> = query.filter_params().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec![":agent"]);
        assert!(!query.count_sql().contains(":keyword"));
        assert!(!query.count_sql().contains(":category"));
    }

    #[test]
    fn test_full_filter_binds_all_params() {
        let agent = agent();
        let filter = ToolFilter::any().with_keyword("x").with_category(CategoryId::new());
        let query = ToolQuery::new(Membership::Unbound, &agent, &filter);

        let names: Vec<&str> = query.filter_params().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec![":agent", ":keyword", ":category"]);
        assert!(query.page_sql().contains("ORDER BY t.name ASC, t.id ASC"));
    }
}
