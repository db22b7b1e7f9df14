//! Matching engine
//!
//! Cross-references a report against the open reports of the opposite kind.
//! Candidates are prefiltered locally by tag overlap, the best few are sent to
//! the vision service in a single comparison call, and only confident,
//! well-formed judgements survive. Surviving matches are persisted as a
//! notification.

use std::cmp::Reverse;
use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::ai::VisionService;
use crate::models::{Item, ItemKind, MatchResult, Notification};
use crate::{repo, AppState};

/// Tunables of the matching engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    /// Judgements must score strictly above this confidence
    pub confidence_threshold: f64,
    /// Number of prefiltered candidates sent for comparison
    pub candidate_limit: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 75.0,
            candidate_limit: 3,
        }
    }
}

/// What started a matching run; decides the notification wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTrigger {
    /// A report was just filed
    NewReport,
    /// A user asked for a rescan of an existing report
    ManualScan,
}

/// Result of a matching run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_count: usize,
    /// The notification created for the matches, if there were any
    pub notification: Option<Notification>,
}

impl MatchOutcome {
    fn empty() -> Self {
        Self { match_count: 0, notification: None }
    }
}

/// Keeps the open reports of the opposite kind, preserving their order
pub fn select_candidates(target: &Item, items: Vec<Item>) -> Vec<Item> {
    let wanted = target.get_kind().opposite();
    let target_id = target.get_id();
    items
        .into_iter()
        .filter(|item| item.get_kind() == wanted && item.is_open() && item.get_id() != target_id)
        .collect()
}

/// Picks the `limit` candidates sharing the most tags with `target`
///
/// Ties keep their input order.
pub fn prefilter(target: &Item, candidates: &[Item], limit: usize) -> Vec<Item> {
    let mut scored: Vec<(usize, &Item)> = candidates
        .iter()
        .map(|candidate| (candidate.tag_overlap(target), candidate))
        .collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.clone())
        .collect()
}

/// Drops weak, unknown and duplicate judgements and ranks the rest
///
/// A judgement survives when its confidence is strictly above `threshold`
/// and it names one of the `compared` items. When an item is named more
/// than once, its most confident judgement is kept.
pub fn filter_matches(raw: Vec<MatchResult>, compared: &[Item], threshold: f64) -> Vec<MatchResult> {
    let known: HashSet<String> = compared.iter().map(Item::get_id).collect();

    let mut matches: Vec<MatchResult> = raw
        .into_iter()
        .filter(|m| m.confidence > threshold)
        .filter(|m| {
            let known_id = known.contains(&m.item_id);
            if !known_id {
                warn!(item_id = %m.item_id, "Discarding judgement for an item that was not compared");
            }
            known_id
        })
        .collect();

    matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut seen = HashSet::new();
    matches.retain(|m| seen.insert(m.item_id.clone()));
    matches
}

/// Asks the vision service which candidates are the same object as `target`
///
/// Service failures are logged and treated as "no matches".
#[instrument(skip_all, fields(target_id = %target.get_id(), candidate_count = candidates.len()))]
pub async fn find_matches(
    vision: &dyn VisionService,
    target: &Item,
    candidates: &[Item],
    settings: &MatchSettings,
) -> Vec<MatchResult> {
    if candidates.is_empty() {
        debug!("No candidates to compare");
        return Vec::new();
    }

    let shortlist = prefilter(target, candidates, settings.candidate_limit);
    if shortlist.is_empty() {
        return Vec::new();
    }

    match vision.compare(target, &shortlist).await {
        Ok(raw) => {
            let matches = filter_matches(raw, &shortlist, settings.confidence_threshold);
            info!("{} of {} shortlisted candidates matched", matches.len(), shortlist.len());
            matches
        }
        Err(err) => {
            warn!("Visual match failed: {}", err);
            Vec::new()
        }
    }
}

/// Builds the user-facing text of a match notification
pub fn match_message(trigger: MatchTrigger, target: &Item, matches: &[MatchResult], candidates: &[Item]) -> String {
    match (trigger, target.get_kind()) {
        (MatchTrigger::ManualScan, _) => format!(
            "Deep-scan successful: {} probable match(es) for {}.",
            matches.len(),
            target.get_title()
        ),
        (MatchTrigger::NewReport, ItemKind::Lost) => format!(
            "High confidence match! Your {} may have been found.",
            target.get_title()
        ),
        (MatchTrigger::NewReport, ItemKind::Found) => {
            let lost_title = matches
                .first()
                .and_then(|best| candidates.iter().find(|c| c.get_id() == best.item_id))
                .map(Item::get_title)
                .unwrap_or_else(|| "item".to_string());
            format!(
                "Registry Update: A reported lost \"{}\" matches your discovery.",
                lost_title
            )
        }
    }
}

/// Matches `target` against the stored reports and records any matches
///
/// ### Returns
///
/// The number of matches and the notification created for them
///
/// ### Errors
///
/// Returns an error if the candidates cannot be loaded or the notification
/// cannot be stored. AI failures are not errors.
#[instrument(skip(state, target), fields(target_id = %target.get_id()))]
pub async fn run_matching(state: &AppState, target: &Item, trigger: MatchTrigger) -> Result<MatchOutcome> {
    let stored = repo::list_open_items_of_kind(&state.pool, target.get_kind().opposite())?;
    let candidates = select_candidates(target, stored);

    if candidates.is_empty() {
        info!("No open {} reports to match against", target.get_kind().opposite());
        return Ok(MatchOutcome::empty());
    }

    let matches = find_matches(state.vision.as_ref(), target, &candidates, &state.settings.matching).await;
    if matches.is_empty() {
        return Ok(MatchOutcome::empty());
    }

    let message = match_message(trigger, target, &matches, &candidates);
    let match_count = matches.len();
    let notification = repo::create_notification(&state.pool, Notification::match_found(target, message, matches)).await?;

    info!("Recorded notification {} with {} match(es)", notification.get_id(), match_count);
    Ok(MatchOutcome {
        match_count,
        notification: Some(notification),
    })
}

/// Runs matching for a newly filed report without blocking the caller
pub fn spawn_matching(state: AppState, target: Item) -> JoinHandle<()> {
    let span = info_span!("background_matching", item_id = %target.get_id());
    tokio::spawn(
        async move {
            if let Err(err) = run_matching(&state, &target, MatchTrigger::NewReport).await {
                error!("Matching failed: {:#}", err);
            }
        }
        .instrument(span),
    )
}
