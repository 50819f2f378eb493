//! Multi-strategy search over a module: types, members, literals, and
//! metadata tokens behind one query DSL. Strategies run independently (in
//! parallel when the `parallel_analysis` feature is on) into a shared sink;
//! results are re-sorted deterministically before they become observable.

pub mod query;
pub mod strategies;

pub use query::{EffectiveMode, QueryMatcher, SearchMode, SearchRequest};
pub use strategies::{SearchAccumulator, SearchHit, SearchHitKind};

use crate::analysis::context::{AnalysisConfig, CancellationToken};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::Module;
use log::debug;
#[cfg(feature = "parallel_analysis")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strategies::{
    LiteralStrategy, MemberStrategy, SearchContext, SearchStrategy, TokenStrategy, TypeStrategy,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    /// Matches found before the limit cut.
    pub total: usize,
    pub has_more: bool,
}

fn all_strategies() -> Vec<Box<dyn SearchStrategy>> {
    vec![
        Box::new(TypeStrategy),
        Box::new(MemberStrategy),
        Box::new(LiteralStrategy),
        Box::new(TokenStrategy),
    ]
}

pub fn search(
    module: &Module,
    config: &AnalysisConfig,
    request: &SearchRequest,
    cancel: &CancellationToken,
) -> AnalysisResult<SearchResponse> {
    let limit = request.limit.unwrap_or(config.default_search_limit);
    if limit == 0 {
        return Err(AnalysisError::InvalidInput("limit must be positive".to_string()));
    }

    let mode = query::detect_mode(request);
    let matcher = QueryMatcher::parse(&request.query)?;
    let ctx = SearchContext {
        module,
        matcher: &matcher,
        request,
        config,
    };

    let strategies = all_strategies();
    let active: Vec<&Box<dyn SearchStrategy>> =
        strategies.iter().filter(|s| s.supports(mode)).collect();
    debug!(
        "search: {:?} over {} strategies",
        mode,
        active.len()
    );

    #[cfg(feature = "parallel_analysis")]
    let partials: Vec<AnalysisResult<SearchAccumulator>> = active
        .par_iter()
        .map(|s| {
            cancel.ensure_live()?;
            let mut local = SearchAccumulator::default();
            s.run(&ctx, &mut local)?;
            Ok(local)
        })
        .collect();

    #[cfg(not(feature = "parallel_analysis"))]
    let partials: Vec<AnalysisResult<SearchAccumulator>> = active
        .iter()
        .map(|s| {
            cancel.ensure_live()?;
            let mut local = SearchAccumulator::default();
            s.run(&ctx, &mut local)?;
            Ok(local)
        })
        .collect();

    // Merge in strategy order so duplicate-id collapse is deterministic.
    let mut merged = SearchAccumulator::default();
    for partial in partials {
        for hit in partial?.hits {
            merged.push(hit);
        }
    }

    let mut hits = merged.hits;
    hits.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.len().cmp(&b.name.len()))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    let total = hits.len();
    let has_more = total > limit;
    hits.truncate(limit);

    Ok(SearchResponse {
        hits,
        total,
        has_more,
    })
}
