//! Rail Simulation Library
//!
//! A discrete, tick-driven rail network simulation with segment mutual
//! exclusion, traffic lights and an append-only event log.

pub mod simulation;
