//! Simulation driver
//!
//! Owns the rail system, the scenario blocks still to be applied and the
//! event log, and runs the tick loop until the system finishes, deadlocks
//! or the tick limit is reached.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::fmt;

use super::entity::LoggableEntity;
use super::event::Event;
use super::event_log::EventLog;
use super::rail_system::RailSystem;
use super::scenario::{Scenario, ScenarioBlock};
use super::types::{Tick, TrainStatus};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// Every train completed its route
    Finished,
    /// Trains remain that can no longer move
    Deadlocked,
    /// The tick limit was reached first
    TickLimit,
}

impl fmt::Display for SimulationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SimulationOutcome::Finished => "finished",
            SimulationOutcome::Deadlocked => "deadlocked",
            SimulationOutcome::TickLimit => "tick limit reached",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub ticks: Tick,
    pub events: usize,
    /// Events stamped with a tick other than the one they were produced in
    pub flagged: Vec<String>,
    pub outcome: SimulationOutcome,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Simulation {} after {} ticks with {} events ({} flagged)",
            self.outcome,
            self.ticks,
            self.events,
            self.flagged.len()
        )
    }
}

pub struct Simulator {
    system: RailSystem,
    pending: VecDeque<ScenarioBlock>,
    log: EventLog,
    flagged: Vec<String>,
    outcome: Option<SimulationOutcome>,
}

impl Simulator {
    /// Drive an already built system with no scheduled blocks
    pub fn new(system: RailSystem) -> Self {
        Self {
            system,
            pending: VecDeque::new(),
            log: EventLog::new(),
            flagged: Vec::new(),
            outcome: None,
        }
    }

    /// Build a system from the scenario's tick 0 block and queue the rest
    pub fn from_scenario(scenario: Scenario) -> Result<Self> {
        let mut simulator = Self::new(RailSystem::new());
        let mut blocks: VecDeque<ScenarioBlock> = scenario.into_blocks().into();

        if blocks.front().is_some_and(|block| block.tick == 0) {
            if let Some(initial) = blocks.pop_front() {
                let events = initial
                    .apply(&mut simulator.system)
                    .context("building the initial network")?;
                simulator.log.extend(events);
            }
        }

        simulator.pending = blocks;
        Ok(simulator)
    }

    pub fn system(&self) -> &RailSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut RailSystem {
        &mut self.system
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Mutable log access, e.g. to subscribe before running
    pub fn log_mut(&mut self) -> &mut EventLog {
        &mut self.log
    }

    pub fn flagged_events(&self) -> &[String] {
        &self.flagged
    }

    pub fn pending_blocks(&self) -> usize {
        self.pending.len()
    }

    pub fn outcome(&self) -> Option<SimulationOutcome> {
        self.outcome
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// Run one tick and return the events it produced
    pub fn step(&mut self) -> Result<Vec<Event>> {
        if self.is_done() {
            return Ok(Vec::new());
        }
        self.system.set_to_working()?;

        let tick = self.system.increment_time();
        let mut events = Vec::new();

        while self.pending.front().is_some_and(|block| block.tick <= tick) {
            if let Some(block) = self.pending.pop_front() {
                if block.tick < tick {
                    warn!("Applying block for tick {} late at tick {}", block.tick, tick);
                }
                events.extend(
                    block
                        .apply(&mut self.system)
                        .with_context(|| format!("applying scenario block for tick {}", block.tick))?,
                );
            }
        }

        let advanced = self
            .system
            .advance()
            .with_context(|| format!("advancing tick {}", tick))?;
        // A block may already have opened a route that a starting train reopens
        for event in advanced {
            if !events.contains(&event) {
                events.push(event);
            }
        }

        for event in &events {
            if event.tick() != tick {
                warn!("Event stamped {} produced at tick {}: {}", event.tick(), tick, event);
                self.flagged.push(event.to_string());
            }
            self.log.push(event.clone());
        }
        debug!("Tick {}: {} events logged", tick, events.len());

        if self.pending.is_empty() {
            if self.system.closure_hindering_movement() {
                self.system.set_deadlocked();
                info!("Deadlock detected at tick {}", tick);
                self.outcome = Some(SimulationOutcome::Deadlocked);
            } else if self.system.registered_train_count() == 0 {
                // No block remains that could register a train still waiting
                for train in self.system.trains() {
                    if train.status() == TrainStatus::Initialised {
                        warn!("Train {} was never registered", train.name());
                    }
                }
                self.system.set_stopped();
                info!("All trains completed by tick {}", tick);
                self.outcome = Some(SimulationOutcome::Finished);
            }
        }

        Ok(events)
    }

    /// Step until the run ends or `max_ticks` ticks have passed
    pub fn run(&mut self, max_ticks: Tick) -> Result<SimulationReport> {
        let mut ticks = 0;
        while !self.is_done() && ticks < max_ticks {
            self.step()?;
            ticks += 1;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            ticks: self.system.current_time(),
            events: self.log.len(),
            flagged: self.flagged.clone(),
            outcome: self.outcome.unwrap_or(SimulationOutcome::TickLimit),
        }
    }
}
