use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui::Pos2;
use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::error::DegenerateForceWarning;
use crate::filter::WorkingSubgraph;
use crate::graph::Node;
use crate::physics::{Integrator, PhysicsScratch, accumulate_forces};

use super::commands::{CommandSender, LayoutCommand};
use super::state::LayoutState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Converged,
    Stopped,
}

/// Delivered to subscribers after every frame that changed something.
#[derive(Clone, Debug)]
pub struct LayoutFrame {
    pub tick: u64,
    pub alpha: f32,
    pub state: SchedulerState,
    pub positions: HashMap<String, Pos2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub alpha: f32,
    pub state: SchedulerState,
    /// Whether forces and integration ran this frame.
    pub advanced: bool,
    pub commands_applied: usize,
    pub warnings: Vec<DegenerateForceWarning>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&LayoutFrame)>;

/// Frame-driven owner of the simulation. The host calls [`Scheduler::frame`]
/// once per scheduled callback; nothing runs between calls.
pub struct Scheduler {
    config: SimulationConfig,
    state: SchedulerState,
    integrator: Integrator,
    layout: Option<LayoutState>,
    tick: u64,
    run_ticks: u64,
    commands_tx: Sender<LayoutCommand>,
    commands_rx: Receiver<LayoutCommand>,
    accepting: Arc<AtomicBool>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    scratch: PhysicsScratch,
}

impl Scheduler {
    pub fn new(config: SimulationConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel();
        Self {
            integrator: Integrator::new(config.integrator),
            config,
            state: SchedulerState::Idle,
            layout: None,
            tick: 0,
            run_ticks: 0,
            commands_tx,
            commands_rx,
            accepting: Arc::new(AtomicBool::new(true)),
            subscribers: Vec::new(),
            next_subscription: 0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.integrator.alpha()
    }

    /// Total ticks advanced since this scheduler was created.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Handle for queueing commands from input handlers.
    pub fn commands(&self) -> CommandSender {
        CommandSender::new(self.commands_tx.clone(), Arc::clone(&self.accepting))
    }

    /// Takes ownership of `subgraph`, discarding any previous run.
    pub fn start(&mut self, subgraph: WorkingSubgraph) {
        let stale = self.commands_rx.try_iter().count();
        if stale > 0 {
            debug!(stale, "dropping commands queued before start");
        }

        let layout = LayoutState::seed(
            subgraph,
            &self.config.forces,
            self.config.seed,
            self.config.seed_spacing,
        );
        debug!(
            nodes = layout.nodes.len(),
            links = layout.links.len(),
            "starting layout run"
        );

        self.layout = Some(layout);
        self.accepting.store(true, Ordering::Release);
        self.integrator.reheat();
        self.run_ticks = 0;
        self.state = SchedulerState::Running;
    }

    pub fn pause(&mut self) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }
        self.state = SchedulerState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != SchedulerState::Paused {
            return false;
        }
        self.state = SchedulerState::Running;
        true
    }

    /// Resets alpha to its initial value and resumes motion. Calling it twice
    /// is the same as calling it once.
    pub fn reheat(&mut self) -> bool {
        if matches!(self.state, SchedulerState::Idle | SchedulerState::Stopped) {
            return false;
        }
        self.integrator.reheat();
        self.run_ticks = 0;
        self.state = SchedulerState::Running;
        true
    }

    /// Ends the run from any state. Subscribers are released, command handles
    /// refuse new commands, and no later frame does any work until the next
    /// `start`.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.accepting.store(false, Ordering::Release);
        self.commands_rx.try_iter().for_each(drop);
        self.subscribers.clear();
        self.layout = None;
        self.state = SchedulerState::Stopped;
        debug!(tick = self.tick, "scheduler stopped");
    }

    /// Whether the host should schedule another frame.
    pub fn needs_frame(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&LayoutFrame) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// One scheduled callback: apply queued commands, then advance the
    /// simulation once if running. `None` when there is no active run.
    pub fn frame(&mut self) -> Option<TickReport> {
        if matches!(self.state, SchedulerState::Idle | SchedulerState::Stopped) {
            return None;
        }
        let layout = self.layout.as_mut()?;

        let mut commands_applied = 0;
        while let Ok(command) = self.commands_rx.try_recv() {
            if layout.apply(command) {
                commands_applied += 1;
            }
        }

        let mut advanced = false;
        let mut warnings = Vec::new();
        if self.state == SchedulerState::Running {
            if self.integrator.is_converged() {
                self.state = SchedulerState::Converged;
            } else {
                accumulate_forces(
                    &layout.nodes,
                    &layout.links,
                    &self.config.forces,
                    &mut self.scratch,
                );
                self.integrator.integrate(&mut layout.nodes, &self.scratch.forces);
                self.tick += 1;
                self.run_ticks += 1;
                warnings = layout.recover_non_finite(self.tick);
                self.integrator.decay();
                advanced = true;

                if self.integrator.is_converged() {
                    self.state = SchedulerState::Converged;
                    debug!(tick = self.tick, alpha = self.integrator.alpha(), "layout converged");
                } else if self.run_ticks >= self.config.max_ticks {
                    self.state = SchedulerState::Converged;
                    warn!(
                        ticks = self.run_ticks,
                        alpha = self.integrator.alpha(),
                        "tick ceiling reached before convergence"
                    );
                }
            }
        }

        if (advanced || commands_applied > 0) && !self.subscribers.is_empty() {
            let frame = LayoutFrame {
                tick: self.tick,
                alpha: self.integrator.alpha(),
                state: self.state,
                positions: layout.positions(),
            };
            for (_, subscriber) in &mut self.subscribers {
                subscriber(&frame);
            }
        }

        Some(TickReport {
            tick: self.tick,
            alpha: self.integrator.alpha(),
            state: self.state,
            advanced,
            commands_applied,
            warnings,
        })
    }

    /// Drives frames until the run stops needing them. Returns every
    /// degenerate-value warning raised on the way.
    pub fn run_until_settled(&mut self) -> Vec<DegenerateForceWarning> {
        let mut warnings = Vec::new();
        let mut frames = 0u64;
        while self.needs_frame() && frames <= self.config.max_ticks {
            let Some(report) = self.frame() else {
                break;
            };
            warnings.extend(report.warnings);
            frames += 1;
        }
        warnings
    }

    /// Marks nodes accepted by `matches`. Positions are untouched.
    pub(crate) fn set_highlights(&mut self, mut matches: impl FnMut(&Node) -> bool) -> usize {
        let Some(layout) = self.layout.as_mut() else {
            return 0;
        };

        let mut count = 0;
        for (node, flag) in layout.subgraph.nodes.iter().zip(layout.highlighted.iter_mut()) {
            *flag = matches(node);
            count += usize::from(*flag);
        }
        count
    }

    pub fn is_highlighted(&self, node_id: &str) -> bool {
        self.layout
            .as_ref()
            .and_then(|layout| layout.index_of(node_id).map(|index| layout.highlighted[index]))
            .unwrap_or(false)
    }

    pub fn position(&self, node_id: &str) -> Option<Pos2> {
        let layout = self.layout.as_ref()?;
        let index = layout.index_of(node_id)?;
        Some(layout.nodes[index].world_pos.to_pos2())
    }

    pub fn positions(&self) -> HashMap<String, Pos2> {
        self.layout
            .as_ref()
            .map(LayoutState::positions)
            .unwrap_or_default()
    }

    /// Active pins, including those set through interaction.
    pub fn pins(&self) -> HashMap<String, Pos2> {
        let Some(layout) = self.layout.as_ref() else {
            return HashMap::new();
        };
        layout
            .subgraph
            .nodes
            .iter()
            .zip(&layout.nodes)
            .filter_map(|(node, sim)| sim.pin.map(|pin| (node.id.clone(), pin.to_pos2())))
            .collect()
    }

    pub fn is_pinned(&self, node_id: &str) -> bool {
        self.layout
            .as_ref()
            .and_then(|layout| layout.index_of(node_id).map(|index| layout.nodes[index].pin))
            .flatten()
            .is_some()
    }

    /// The working subgraph with current positions, velocities, pins and
    /// highlight flags written back.
    pub fn nodes(&self) -> Vec<Node> {
        self.layout
            .as_ref()
            .map(LayoutState::export_nodes)
            .unwrap_or_default()
    }

    pub fn subgraph(&self) -> Option<&WorkingSubgraph> {
        self.layout.as_ref().map(|layout| &layout.subgraph)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
