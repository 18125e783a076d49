//! Person-reference resolution.
//!
//! A typed reference is either a literal `<@U...>` mention, taken verbatim, or
//! free text (`@Ariel`, `ariel smith`) matched against the live member list:
//! profiles pass a two-way containment filter on their combined name text and
//! the highest-scoring survivor wins, earliest listed on ties.

pub mod similarity;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::call_policy::CallPolicy;
use crate::domain::member::MemberProfile;
use crate::domain::mention::{parse_exact_mention, ResolvedMention};
use crate::ports::MemberDirectory;

pub use similarity::SimilarityScorer;

/// A directory profile that survived the containment filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub profile: &'a MemberProfile,
    pub combined_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: Candidate<'a>,
    pub score: f64,
}

pub struct UserResolver {
    directory: Arc<dyn MemberDirectory>,
    scorer: SimilarityScorer,
    policy: CallPolicy,
    min_score: Option<f64>,
}

impl UserResolver {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self {
            directory,
            scorer: SimilarityScorer::new(),
            policy: CallPolicy::default(),
            min_score: None,
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Optional cutoff; without one any candidate passing the containment filter can win.
    pub fn with_min_score(mut self, min_score: Option<f64>) -> Self {
        self.min_score = min_score;
        self
    }

    pub async fn resolve(&self, token: &str) -> ResolvedMention {
        if let Some(user_id) = parse_exact_mention(token) {
            debug!(
                event_name = "resolver.exact_mention",
                user_id, "reference is an exact mention; skipping directory lookup"
            );
            return ResolvedMention::Resolved {
                user_id: user_id.to_owned(),
                mention: token.to_owned(),
            };
        }

        let display_name = token.trim_start_matches('@');
        match self.find_user_id_by_display_name(display_name).await {
            Some(user_id) => {
                debug!(
                    event_name = "resolver.fuzzy.resolved",
                    display_name, user_id = %user_id, "resolved reference via fuzzy match"
                );
                ResolvedMention::resolved(user_id)
            }
            None => {
                debug!(
                    event_name = "resolver.fuzzy.unresolved",
                    display_name, fallback = token, "no member matched; keeping literal reference"
                );
                ResolvedMention::unresolved(token)
            }
        }
    }

    pub async fn find_user_id_by_display_name(&self, display_name: &str) -> Option<String> {
        let members = match self
            .policy
            .run("users.list", move || self.directory.list_members())
            .await
        {
            Ok(members) => members,
            Err(error) => {
                warn!(
                    event_name = "resolver.directory.failed",
                    error = %error,
                    "member directory unavailable; treating as no candidates"
                );
                return None;
            }
        };
        debug!(event_name = "resolver.directory.loaded", members = members.len(), "members listed");

        let query = display_name.to_lowercase();
        let candidates = collect_candidates(&query, &members);
        if candidates.is_empty() {
            debug!(
                event_name = "resolver.fuzzy.no_candidates",
                query = %query,
                "no partial matches"
            );
            return None;
        }

        let best = select_best(&self.scorer, &query, candidates, self.min_score)?;
        debug!(
            event_name = "resolver.fuzzy.best_match",
            user_id = %best.candidate.profile.id,
            score = best.score,
            "selected best-scoring candidate"
        );
        Some(best.candidate.profile.id.clone())
    }
}

/// Resolvable profiles whose combined name contains `query`, or is contained in it.
/// `query` must already be lowercased. Listing order is preserved.
pub fn collect_candidates<'a>(query: &str, members: &'a [MemberProfile]) -> Vec<Candidate<'a>> {
    members
        .iter()
        .filter(|profile| profile.is_resolvable())
        .filter_map(|profile| {
            let combined_name = profile.combined_name();
            let overlaps =
                combined_name.contains(query) || query.contains(combined_name.as_str());
            overlaps.then_some(Candidate { profile, combined_name })
        })
        .collect()
}

/// Strictly greatest score wins; a later equal score never replaces the current best.
/// A candidate must beat zero (and reach `min_score` when set) to be selected.
pub fn select_best<'a>(
    scorer: &SimilarityScorer,
    query: &str,
    candidates: Vec<Candidate<'a>>,
    min_score: Option<f64>,
) -> Option<ScoredCandidate<'a>> {
    let mut best: Option<ScoredCandidate<'a>> = None;

    for candidate in candidates {
        let score = scorer.score(query, &candidate.combined_name);
        debug!(
            event_name = "resolver.fuzzy.candidate_scored",
            user_id = %candidate.profile.id,
            combined_name = %candidate.combined_name,
            score,
            "scored candidate"
        );

        if min_score.is_some_and(|threshold| score < threshold) {
            continue;
        }

        let best_score = best.as_ref().map_or(0.0, |current| current.score);
        if score > best_score {
            best = Some(ScoredCandidate { candidate, score });
        }
    }

    best
}
