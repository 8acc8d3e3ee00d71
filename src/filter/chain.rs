//! Ordered filter chain.
//!
//! # Design Decisions
//! - AND semantics: every filter must allow
//! - First denial wins; later filters are not consulted
//! - Empty chain allows everything

use crate::filter::{Filter, FilterResult};
use crate::rpc::{MessageContext, Request};

/// Filters evaluated in insertion order with short-circuit AND semantics.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter, builder style.
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.push(filter);
        self
    }

    /// Append a filter to the end of the chain.
    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Remove every filter.
    ///
    /// Only valid while the chain is exclusively owned; shared chains are
    /// replaced wholesale instead (see [`SharedFilter`](crate::filter::SharedFilter)).
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The chained filters, in evaluation order.
    pub fn filters(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    /// Names of the chained filters, in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

impl Filter for FilterChain {
    fn evaluate(&self, request: &Request, context: &MessageContext) -> FilterResult {
        for filter in &self.filters {
            let result = filter.evaluate(request, context);
            if let FilterResult::Denied(reason) = result {
                tracing::debug!(
                    filter = filter.name(),
                    method = %request.method(),
                    code = reason.code(),
                    reason = reason.as_str(),
                    "Access denied"
                );
                return result;
            }
        }
        FilterResult::ALLOWED
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
