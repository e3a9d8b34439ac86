// Explicit reactive dependency graph for session state
use std::collections::{BTreeSet, HashMap};

/// A piece of session state (or a raw UI input) that reactions can depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    PredictionsRelayout,
    FeaturesRelayout,
    LookbackHours,
    SelectedFeatures,
    SharedAxisRange,
    InferenceTrigger,
    Refresh,
}

/// Session handlers run in response to signals.
///
/// Variants are declared in dependency order: a reaction may only emit
/// signals consumed by reactions declared after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reaction {
    SyncAxisRange,
    UpdateFigures,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    subscriptions: HashMap<Signal, Vec<Reaction>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dashboard wiring: relayouts feed the axis sync, everything the
    /// plots read feeds the figure update.
    pub fn dashboard() -> Self {
        let mut graph = Self::new();
        graph.subscribe(
            Reaction::SyncAxisRange,
            &[Signal::PredictionsRelayout, Signal::FeaturesRelayout],
        );
        graph.subscribe(
            Reaction::UpdateFigures,
            &[
                Signal::LookbackHours,
                Signal::SelectedFeatures,
                Signal::SharedAxisRange,
                Signal::InferenceTrigger,
                Signal::Refresh,
            ],
        );
        graph
    }

    pub fn subscribe(&mut self, reaction: Reaction, signals: &[Signal]) {
        for signal in signals {
            let dependents = self.subscriptions.entry(*signal).or_default();
            if !dependents.contains(&reaction) {
                dependents.push(reaction);
            }
        }
    }

    pub fn dependents(&self, signal: Signal) -> &[Reaction] {
        self.subscriptions
            .get(&signal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Signals changed by one UI event, and the reactions they schedule.
/// Each reaction runs at most once per batch.
#[derive(Debug, Default)]
pub struct ChangeBatch {
    changed: Vec<Signal>,
    pending: BTreeSet<Reaction>,
    ran: BTreeSet<Reaction>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, graph: &DependencyGraph, signal: Signal) {
        self.changed.retain(|s| *s != signal);
        self.changed.push(signal);

        for reaction in graph.dependents(signal) {
            if self.ran.contains(reaction) {
                tracing::warn!(?signal, ?reaction, "signal emitted after its dependent already ran");
                continue;
            }
            self.pending.insert(*reaction);
        }
    }

    /// Next reaction in dependency order
    pub fn next(&mut self) -> Option<Reaction> {
        let reaction = self.pending.pop_first()?;
        self.ran.insert(reaction);
        Some(reaction)
    }

    /// Most recently changed signal among `candidates`
    pub fn last_fired(&self, candidates: &[Signal]) -> Option<Signal> {
        self.changed
            .iter()
            .rev()
            .find(|s| candidates.contains(s))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(batch: &mut ChangeBatch) -> Vec<Reaction> {
        std::iter::from_fn(|| batch.next()).collect()
    }

    #[test]
    fn test_simultaneous_changes_collapse() {
        let graph = DependencyGraph::dashboard();
        let mut batch = ChangeBatch::new();
        batch.mark(&graph, Signal::LookbackHours);
        batch.mark(&graph, Signal::SelectedFeatures);
        batch.mark(&graph, Signal::InferenceTrigger);

        assert_eq!(drain(&mut batch), vec![Reaction::UpdateFigures]);
    }

    #[test]
    fn test_reactions_run_in_dependency_order() {
        let graph = DependencyGraph::dashboard();
        let mut batch = ChangeBatch::new();
        batch.mark(&graph, Signal::LookbackHours);
        batch.mark(&graph, Signal::FeaturesRelayout);

        assert_eq!(batch.next(), Some(Reaction::SyncAxisRange));
        // axis sync emits a downstream change; the figure update is already queued once
        batch.mark(&graph, Signal::SharedAxisRange);
        assert_eq!(drain(&mut batch), vec![Reaction::UpdateFigures]);
    }

    #[test]
    fn test_signal_after_dependent_ran_is_dropped() {
        let graph = DependencyGraph::dashboard();
        let mut batch = ChangeBatch::new();
        batch.mark(&graph, Signal::Refresh);
        assert_eq!(drain(&mut batch), vec![Reaction::UpdateFigures]);

        batch.mark(&graph, Signal::SelectedFeatures);
        assert_eq!(batch.next(), None);
    }

    #[test]
    fn test_last_fired() {
        let graph = DependencyGraph::dashboard();
        let mut batch = ChangeBatch::new();
        assert_eq!(
            batch.last_fired(&[Signal::PredictionsRelayout, Signal::FeaturesRelayout]),
            None
        );

        batch.mark(&graph, Signal::FeaturesRelayout);
        batch.mark(&graph, Signal::LookbackHours);
        assert_eq!(
            batch.last_fired(&[Signal::PredictionsRelayout, Signal::FeaturesRelayout]),
            Some(Signal::FeaturesRelayout)
        );
    }

    #[test]
    fn test_unsubscribed_signal_schedules_nothing() {
        let graph = DependencyGraph::new();
        let mut batch = ChangeBatch::new();
        batch.mark(&graph, Signal::LookbackHours);
        assert!(!batch.is_empty());
        assert_eq!(batch.next(), None);
    }
}
