//! Idea collection view-model.
//!
//! Holds the last fetched collection, the filter query and the operator's
//! selection. The collection is only ever replaced wholesale by a refresh;
//! nothing here patches individual ideas.

use std::collections::HashSet;

use tracing::{debug, warn};

use vgen_models::{Idea, IdeaId, InvariantViolation, StatusGroup};

/// Ideas matching `query`, in collection order.
///
/// Case-insensitive substring match over title, keywords and status (wire
/// value and display label). An empty or blank query returns everything.
pub fn filter_ideas(ideas: &[Idea], query: &str) -> Vec<Idea> {
    let needle = query.trim().to_lowercase();
    ideas.iter().filter(|idea| idea.matches(&needle)).cloned().collect()
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub rejected: usize,
}

/// What changed in the view-model on the last refresh.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshReport {
    pub total: usize,
    /// Selected ids that no longer exist and were dropped
    pub pruned: Vec<IdeaId>,
    pub violations: Vec<(IdeaId, InvariantViolation)>,
}

/// Ids split into those present in the collection and those that are not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedIds {
    pub known: Vec<IdeaId>,
    pub unknown: Vec<IdeaId>,
}

#[derive(Debug, Default, Clone)]
pub struct IdeaCollection {
    ideas: Vec<Idea>,
    query: String,
    /// Ordered set; order is the order ids were selected in
    selection: Vec<IdeaId>,
}

impl IdeaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh fetch.
    ///
    /// The selection is pruned of ids that disappeared.
    pub fn replace_all(&mut self, ideas: Vec<Idea>) -> RefreshReport {
        let mut violations = Vec::new();
        for idea in &ideas {
            for violation in idea.invariant_violations() {
                warn!(idea_id = %idea.id, status = %idea.status, "Backend invariant broken: {}", violation);
                violations.push((idea.id.clone(), violation));
            }
        }

        self.ideas = ideas;

        let present: HashSet<&IdeaId> = self.ideas.iter().map(|i| &i.id).collect();
        let (kept, pruned): (Vec<IdeaId>, Vec<IdeaId>) = std::mem::take(&mut self.selection)
            .into_iter()
            .partition(|id| present.contains(id));
        self.selection = kept;

        if !pruned.is_empty() {
            debug!(count = pruned.len(), "Pruned vanished ideas from selection");
        }

        RefreshReport {
            total: self.ideas.len(),
            pruned,
            violations,
        }
    }

    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    pub fn get(&self, idea_id: &IdeaId) -> Option<&Idea> {
        self.ideas.iter().find(|i| &i.id == idea_id)
    }

    // =========================================================================
    // Filter
    // =========================================================================

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The filtered view.
    pub fn visible(&self) -> Vec<&Idea> {
        let needle = self.query.trim().to_lowercase();
        self.ideas.iter().filter(|idea| idea.matches(&needle)).collect()
    }

    fn visible_ids(&self) -> Vec<IdeaId> {
        self.visible().into_iter().map(|i| i.id.clone()).collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn is_selected(&self, idea_id: &IdeaId) -> bool {
        self.selection.contains(idea_id)
    }

    /// Flip one idea in or out of the selection.
    ///
    /// Returns the new membership. Ids absent from the collection are ignored.
    pub fn toggle(&mut self, idea_id: &IdeaId) -> bool {
        if let Some(pos) = self.selection.iter().position(|id| id == idea_id) {
            self.selection.remove(pos);
            return false;
        }
        if self.get(idea_id).is_none() {
            debug!(idea_id = %idea_id, "Ignoring selection of unknown idea");
            return false;
        }
        self.selection.push(idea_id.clone());
        true
    }

    /// Whether the filtered view is non-empty and fully selected.
    pub fn all_selected(&self) -> bool {
        let visible = self.visible_ids();
        !visible.is_empty() && visible.iter().all(|id| self.selection.contains(id))
    }

    /// Select-all over the filtered view only.
    ///
    /// Deselects the filtered ids when they are all selected already,
    /// otherwise adds the missing ones. Selected ids outside the view stay.
    pub fn toggle_select_all(&mut self) {
        let visible = self.visible_ids();
        if visible.iter().all(|id| self.selection.contains(id)) {
            self.selection.retain(|id| !visible.contains(id));
        } else {
            for id in visible {
                if !self.selection.contains(&id) {
                    self.selection.push(id);
                }
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<IdeaId> {
        self.selection.clone()
    }

    /// Split `ids` against the current collection, keeping order and
    /// dropping duplicates.
    pub fn resolve_ids(&self, ids: &[IdeaId]) -> ResolvedIds {
        let mut resolved = ResolvedIds::default();
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if self.get(id).is_some() {
                resolved.known.push(id.clone());
            } else {
                resolved.unknown.push(id.clone());
            }
        }
        resolved
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.ideas.len(),
            ..Default::default()
        };
        for idea in &self.ideas {
            match idea.status.group() {
                StatusGroup::Pending => counts.pending += 1,
                StatusGroup::InProgress => counts.in_progress += 1,
                StatusGroup::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}
