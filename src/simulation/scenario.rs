//! Scenario files
//!
//! A scenario is a line-oriented text file grouped into per-tick blocks. A
//! line holding only an integer starts the block for that tick; everything
//! before the first such line belongs to tick 0.
//!
//! ```text
//! Stations: 2
//! A
//! B
//! Segments: 1
//! S1:A:B
//! Routes: 1
//! R1:false:S1
//! Trains: 1
//! T1:0:R1:all
//! 1
//! Trains: 1
//! T1:0:R1:all
//! ```
//!
//! In block 0 `Trains` records add trains; in later blocks they register
//! them. Blank lines and lines starting with `#` are ignored.

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::iter::{Enumerate, Peekable};
use std::path::Path;
use std::str::Lines;

use super::event::Event;
use super::rail_system::RailSystem;
use super::types::{Action, EntityKind, Tick};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    pub name: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub name: String,
    pub is_round_trip: bool,
    pub segments: Vec<String>,
}

/// An open or close request for a named station, segment or route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEvent {
    pub action: Action,
    pub kind: EntityKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSpec {
    pub name: String,
    pub start_delay: Tick,
    pub route: String,
    /// Empty when the train stops nowhere in particular
    pub stops: Vec<String>,
}

/// Everything scheduled for one tick, in file order per section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioBlock {
    pub tick: Tick,
    pub stations: Vec<String>,
    pub segments: Vec<SegmentSpec>,
    pub routes: Vec<RouteSpec>,
    pub events: Vec<EntityEvent>,
    pub trains: Vec<TrainSpec>,
}

impl ScenarioBlock {
    fn new(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
            && self.segments.is_empty()
            && self.routes.is_empty()
            && self.events.is_empty()
            && self.trains.is_empty()
    }

    /// Apply the block to `system`, returning the open/close events it produced.
    ///
    /// Topology is built first, then events, then trains.
    pub fn apply(&self, system: &mut RailSystem) -> Result<Vec<Event>> {
        for station in &self.stations {
            system
                .add_station(station)
                .with_context(|| format!("tick {}: adding station {}", self.tick, station))?;
        }
        for segment in &self.segments {
            system
                .add_segment(&segment.name, &segment.start, &segment.end)
                .with_context(|| format!("tick {}: adding segment {}", self.tick, segment.name))?;
        }
        for route in &self.routes {
            let segments: Vec<&str> = route.segments.iter().map(String::as_str).collect();
            system
                .add_route(&route.name, route.is_round_trip, &segments)
                .with_context(|| format!("tick {}: adding route {}", self.tick, route.name))?;
        }

        let mut events = Vec::new();
        for event in &self.events {
            let produced = match event.action {
                Action::Open => system.open_entity(event.kind, &event.name),
                Action::Close => system.close_entity(event.kind, &event.name),
                Action::Start | Action::Finish => None,
            };
            match produced {
                Some(produced) => events.push(produced),
                None => warn!(
                    "Tick {}: {} {} {} had no effect",
                    self.tick, event.action, event.kind, event.name
                ),
            }
        }

        for train in &self.trains {
            if self.tick == 0 {
                system
                    .add_train(&train.name, train.start_delay)
                    .with_context(|| format!("tick 0: adding train {}", train.name))?;
            } else {
                let stops: Vec<&str> = train.stops.iter().map(String::as_str).collect();
                let registered = system
                    .register_train(&train.name, &train.route, &stops)
                    .with_context(|| {
                        format!("tick {}: registering train {}", self.tick, train.name)
                    })?;
                if !registered {
                    warn!(
                        "Tick {}: train {} was not registered on {}",
                        self.tick, train.name, train.route
                    );
                }
            }
        }

        Ok(events)
    }
}

/// A parsed scenario: blocks in increasing tick order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    blocks: Vec<ScenarioBlock>,
}

type Cursor<'a> = Peekable<Enumerate<Lines<'a>>>;

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario =
            Self::parse(&text).with_context(|| format!("parsing scenario {}", path.display()))?;
        info!(
            "Loaded scenario {} with {} blocks",
            path.display(),
            scenario.blocks.len()
        );
        Ok(scenario)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut blocks = vec![ScenarioBlock::new(0)];
        let mut cursor: Cursor<'_> = text.lines().enumerate().peekable();

        while let Some((index, line)) = next_record(&mut cursor) {
            let line_no = index + 1;

            if line.chars().all(|c| c.is_ascii_digit()) {
                let tick: Tick = line
                    .parse()
                    .with_context(|| format!("line {}: bad tick {:?}", line_no, line))?;
                let current = blocks.last().map_or(0, |block| block.tick);
                if tick < current {
                    bail!("line {}: tick {} comes after tick {}", line_no, tick, current);
                }
                if tick > current {
                    blocks.push(ScenarioBlock::new(tick));
                }
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| anyhow!("line {}: expected `Section: count`, got {:?}", line_no, line))?;
            let count: usize = value
                .trim()
                .parse()
                .with_context(|| format!("line {}: bad count {:?}", line_no, value.trim()))?;

            let block = blocks
                .last_mut()
                .ok_or_else(|| anyhow!("line {}: no block to add to", line_no))?;

            for _ in 0..count {
                let (index, record) = next_record(&mut cursor).ok_or_else(|| {
                    anyhow!("line {}: {} expects {} records", line_no, key.trim(), count)
                })?;
                let record_no = index + 1;
                let fields: Vec<&str> = record.split(':').map(str::trim).collect();

                match key.trim() {
                    "Stations" => block.stations.push(record.to_string()),
                    "Segments" => block.segments.push(
                        parse_segment(&fields).with_context(|| format!("line {}", record_no))?,
                    ),
                    "Routes" => block.routes.push(
                        parse_route(&fields).with_context(|| format!("line {}", record_no))?,
                    ),
                    "Events" => block.events.push(
                        parse_event(&fields).with_context(|| format!("line {}", record_no))?,
                    ),
                    "Trains" => block.trains.push(
                        parse_train(&fields).with_context(|| format!("line {}", record_no))?,
                    ),
                    other => bail!("line {}: unknown section {:?}", line_no, other),
                }
            }
        }

        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[ScenarioBlock] {
        &self.blocks
    }

    pub fn block_at(&self, tick: Tick) -> Option<&ScenarioBlock> {
        self.blocks.iter().find(|block| block.tick == tick)
    }

    /// The last tick that has a block
    pub fn last_tick(&self) -> Tick {
        self.blocks.last().map_or(0, |block| block.tick)
    }

    pub fn into_blocks(self) -> Vec<ScenarioBlock> {
        self.blocks
    }
}

/// Next non-blank, non-comment line, trimmed
fn next_record<'a>(cursor: &mut Cursor<'a>) -> Option<(usize, &'a str)> {
    for (index, line) in cursor.by_ref() {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            return Some((index, line));
        }
    }
    None
}

fn parse_segment(fields: &[&str]) -> Result<SegmentSpec> {
    let [name, start, end] = fields else {
        bail!("segment record must be name:start:end");
    };
    Ok(SegmentSpec {
        name: name.to_string(),
        start: start.to_string(),
        end: end.to_string(),
    })
}

fn parse_route(fields: &[&str]) -> Result<RouteSpec> {
    let [name, round_trip, segments] = fields else {
        bail!("route record must be name:roundtrip:seg;seg;...");
    };
    let is_round_trip = round_trip
        .parse::<bool>()
        .with_context(|| format!("bad round trip flag {:?}", round_trip))?;
    Ok(RouteSpec {
        name: name.to_string(),
        is_round_trip,
        segments: split_list(segments),
    })
}

fn parse_event(fields: &[&str]) -> Result<EntityEvent> {
    let [action, kind, name] = fields else {
        bail!("event record must be Open|Close:Station|Segment|Route:name");
    };
    let action = match *action {
        "Open" => Action::Open,
        "Close" => Action::Close,
        other => bail!("unknown event action {:?}", other),
    };
    let kind = match *kind {
        "Station" => EntityKind::Station,
        "Segment" => EntityKind::Segment,
        "Route" => EntityKind::Route,
        other => bail!("unknown event target {:?}", other),
    };
    Ok(EntityEvent {
        action,
        kind,
        name: name.to_string(),
    })
}

fn parse_train(fields: &[&str]) -> Result<TrainSpec> {
    let (name, delay, route, stops) = match fields {
        [name, delay, route] => (name, delay, route, ""),
        [name, delay, route, stops] => (name, delay, route, *stops),
        _ => bail!("train record must be name:start_delay:route:stop;stop|all"),
    };
    let start_delay = delay
        .parse::<Tick>()
        .with_context(|| format!("bad start delay {:?}", delay))?;
    let stops = if stops.eq_ignore_ascii_case("all") {
        Vec::new()
    } else {
        split_list(stops)
    };
    Ok(TrainSpec {
        name: name.to_string(),
        start_delay,
        route: route.to_string(),
        stops,
    })
}

fn split_list(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
