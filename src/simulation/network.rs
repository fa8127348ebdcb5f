//! Track topology graph
//!
//! Stations are nodes and segments are directed edges. The graph answers
//! connectivity questions; entity state lives in the rail system's arenas.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::types::{SegmentId, StationId};

#[derive(Default, Debug)]
pub struct RailNetwork {
    /// The underlying petgraph directed graph (single-track, one direction per segment)
    graph: DiGraph<StationId, SegmentId>,

    /// Maps station IDs to their node indices in the graph
    station_to_node: HashMap<StationId, NodeIndex>,
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station node; adding the same station twice is a no-op
    pub fn add_station(&mut self, station: StationId) {
        if self.station_to_node.contains_key(&station) {
            return;
        }
        let node = self.graph.add_node(station);
        self.station_to_node.insert(station, node);
    }

    /// Adds a directed edge between two known stations
    pub fn add_segment(&mut self, segment: SegmentId, start: StationId, end: StationId) -> bool {
        let (Some(&start_node), Some(&end_node)) = (
            self.station_to_node.get(&start),
            self.station_to_node.get(&end),
        ) else {
            return false;
        };
        self.graph.add_edge(start_node, end_node, segment);
        true
    }

    pub fn remove_segment(&mut self, segment: SegmentId) {
        let edge = self
            .graph
            .edge_indices()
            .find(|edge| self.graph[*edge] == segment);
        if let Some(edge) = edge {
            self.graph.remove_edge(edge);
        }
    }

    /// Removes a station node. Callers must remove its segments first.
    pub fn remove_station(&mut self, station: StationId) {
        let Some(node) = self.station_to_node.remove(&station) else {
            return;
        };
        // remove_node swaps the last node into the freed index
        let moved = self.graph.node_indices().last();
        self.graph.remove_node(node);
        if let Some(last) = moved {
            if last != node {
                if let Some(moved_station) = self.graph.node_weight(node).copied() {
                    self.station_to_node.insert(moved_station, node);
                }
            }
        }
    }

    /// The segment running directly from `from` to `to`
    pub fn find_segment_between(&self, from: StationId, to: StationId) -> Option<SegmentId> {
        let from_node = self.station_to_node.get(&from)?;
        let to_node = self.station_to_node.get(&to)?;
        self.graph
            .edges(*from_node)
            .find(|edge| edge.target() == *to_node)
            .map(|edge| *edge.weight())
    }

    /// Whether track leads from one station to another
    pub fn can_reach(&self, from: StationId, to: StationId) -> bool {
        match (self.station_to_node.get(&from), self.station_to_node.get(&to)) {
            (Some(from_node), Some(to_node)) => {
                has_path_connecting(&self.graph, *from_node, *to_node, None)
            }
            _ => false,
        }
    }

    pub fn station_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }
}
