use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::error::{DegenerateForceWarning, FilterError};
use crate::filter::{Filters, WorkingSubgraph, apply_filters};
use crate::graph::GraphSnapshot;
use crate::interaction::InteractionController;
use crate::simulation::{Scheduler, TickReport};

/// Owns one dataset snapshot and everything needed to lay out a filtered view
/// of it.
pub struct LayoutEngine {
    snapshot: GraphSnapshot,
    filters: Filters,
    scheduler: Scheduler,
    interaction: InteractionController,
}

impl LayoutEngine {
    /// Filters `snapshot` and starts a run on the result.
    pub fn new(
        snapshot: GraphSnapshot,
        config: SimulationConfig,
        filters: Filters,
    ) -> Result<Self, FilterError> {
        let subgraph = apply_filters(&snapshot, &filters)?;
        let mut scheduler = Scheduler::new(config);
        let interaction = InteractionController::new(&scheduler);

        info!(
            nodes = subgraph.node_count(),
            edges = subgraph.edge_count(),
            "layout engine ready"
        );
        scheduler.start(subgraph);

        Ok(Self {
            snapshot,
            filters,
            scheduler,
            interaction,
        })
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionController {
        &mut self.interaction
    }

    pub fn subgraph(&self) -> Option<&WorkingSubgraph> {
        self.scheduler.subgraph()
    }

    /// Replaces the working subgraph. On error the current run continues
    /// untouched; on success surviving nodes keep their position and pin and
    /// the scheduler restarts.
    pub fn set_filters(&mut self, filters: Filters) -> Result<(), FilterError> {
        let mut subgraph = match apply_filters(&self.snapshot, &filters) {
            Ok(subgraph) => subgraph,
            Err(err) => {
                warn!(%err, "filter change rejected; keeping previous subgraph");
                return Err(err);
            }
        };

        let carried = self
            .scheduler
            .nodes()
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        for node in &mut subgraph.nodes {
            if let Some(previous) = carried.get(&node.id) {
                node.x = previous.x;
                node.y = previous.y;
                node.fx = previous.fx;
                node.fy = previous.fy;
            }
        }

        info!(
            nodes = subgraph.node_count(),
            edges = subgraph.edge_count(),
            "filters changed; restarting layout"
        );
        self.filters = filters;
        self.scheduler.start(subgraph);
        self.interaction.refresh_highlight(&mut self.scheduler);
        Ok(())
    }

    pub fn frame(&mut self) -> Option<TickReport> {
        self.scheduler.frame()
    }

    pub fn run_until_settled(&mut self) -> Vec<DegenerateForceWarning> {
        self.scheduler.run_until_settled()
    }

    pub fn highlight(&mut self, query: &str) -> usize {
        self.interaction.highlight(&mut self.scheduler, query)
    }
}
