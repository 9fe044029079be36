//! Filter value object shared by the bound and unbound queries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolbindError};
use crate::id::CategoryId;

/// Which side of an agent's binding set to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// Tools the agent is bound to
    Bound,
    /// Active tools the agent is not bound to
    Unbound,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Bound => "bound",
            Membership::Unbound => "unbound",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional predicates applied on top of the membership selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    keyword: Option<String>,
    category_id: Option<CategoryId>,
}

impl ToolFilter {
    /// A filter matching every active tool
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a filter, normalizing a blank keyword to "no keyword".
    pub fn new(keyword: Option<&str>, category_id: Option<CategoryId>, max_keyword_len: usize) -> Result<Self> {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        if let Some(k) = keyword
            && k.chars().count() > max_keyword_len
        {
            return Err(ToolbindError::invalid_input(
                "keyword",
                format!("must be at most {} characters", max_keyword_len),
            ));
        }

        Ok(Self {
            keyword: keyword.map(str::to_string),
            category_id,
        })
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        let trimmed = keyword.trim();
        self.keyword = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_keyword_is_absent() {
        let filter = ToolFilter::new(Some("   "), None, 100).unwrap();
        assert_eq!(filter.keyword(), None);
        assert_eq!(filter, ToolFilter::any());
    }

    #[test]
    fn test_keyword_is_trimmed() {
        let filter = ToolFilter::new(Some("  disk "), None, 100).unwrap();
        assert_eq!(filter.keyword(), Some("disk"));
    }

    #[test]
    fn test_keyword_too_long() {
        let long = "k".repeat(101);
        assert!(ToolFilter::new(Some(&long), None, 100).is_err());
    }

    #[test]
    fn test_membership_display() {
        assert_eq!(Membership::Bound.to_string(), "bound");
        assert_eq!(Membership::Unbound.as_str(), "unbound");
    }
}
