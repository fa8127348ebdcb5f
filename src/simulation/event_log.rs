//! Append-only event log
//!
//! Events are pushed by the driver after every tick and are never changed or
//! removed. Readers get restartable iterator views, and observers can
//! subscribe to a one-way stream of newly appended events.

use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use super::event::Event;
use super::types::Tick;

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
    subscribers: Vec<Sender<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event and forward it to every live subscriber
    pub fn push(&mut self, event: Event) {
        // Unbounded channels never block; a failed send means the receiver is gone
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        self.events.push(event);
    }

    pub fn extend<I: IntoIterator<Item = Event>>(&mut self, events: I) {
        for event in events {
            self.push(event);
        }
    }

    /// Stream of events appended after this call
    pub fn subscribe(&mut self) -> Receiver<Event> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// A fresh view over the whole log, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }

    /// Events appended at or after `index`, for incremental readers
    pub fn since(&self, index: usize) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().skip(index)
    }

    pub fn at_tick(&self, tick: Tick) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |event| event.tick() == tick)
    }

    pub fn for_object<'a>(&'a self, object: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter(move |event| event.object_name() == object)
    }

    /// Names of every object with at least one event, in first-seen order
    pub fn objects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(Event::object_name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn distinct_objects(&self) -> usize {
        self.objects().len()
    }

    /// True if every given event appears somewhere in the log
    pub fn contains_all(&self, events: &[Event]) -> bool {
        events.iter().all(|wanted| self.events.contains(wanted))
    }

    /// True if the given events appear contiguously and in order
    pub fn contains_in_sequence(&self, events: &[Event]) -> bool {
        if events.is_empty() {
            return true;
        }
        self.events
            .windows(events.len())
            .any(|window| window == events)
    }

    /// Events that appear more than once. A valid log has none.
    pub fn duplicates(&self) -> Vec<&Event> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .filter(|event| !seen.insert(*event))
            .collect()
    }

    pub fn validate(&self) -> bool {
        self.duplicates().is_empty()
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.events.is_empty() {
            return write!(f, "Events Log[no events]");
        }
        writeln!(f, "Events Log[")?;
        for event in &self.events {
            writeln!(f, "\t{}", event)?;
        }
        write!(f, "\t]")
    }
}
