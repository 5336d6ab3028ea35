//! Event Log
//!
//! Events raised during a tick collect in `PendingEvents` until the host
//! drains them. An `EventLog` writes drained batches as JSONL and keeps a
//! running tally per event category for the end-of-run report.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tavern_events::{generate_event_id, EventKind, EventType, SimTime, TavernEvent};

/// JSONL sink for drained events
pub struct EventLog {
    sink: Option<BufWriter<File>>,
    tally: BTreeMap<EventType, u64>,
}

impl EventLog {
    /// Starts a fresh log, replacing any file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_sink(Some(file)))
    }

    /// Continues an existing log, as when resuming from a save.
    pub fn append(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_sink(Some(file)))
    }

    /// Tallies events without writing them anywhere.
    pub fn tally_only() -> Self {
        Self::with_sink(None)
    }

    fn with_sink(file: Option<File>) -> Self {
        Self {
            sink: file.map(BufWriter::new),
            tally: BTreeMap::new(),
        }
    }

    /// Writes a drained batch in order.
    pub fn record(&mut self, events: &[TavernEvent]) -> io::Result<()> {
        for event in events {
            *self.tally.entry(event.event_type()).or_insert(0) += 1;
            if let Some(sink) = self.sink.as_mut() {
                writeln!(sink, "{}", event.to_jsonl()?)?;
            }
        }
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.tally.values().sum()
    }

    pub fn count_of(&self, event_type: EventType) -> u64 {
        self.tally.get(&event_type).copied().unwrap_or(0)
    }

    /// Per-category counts, in category order.
    pub fn tally(&self) -> impl Iterator<Item = (EventType, u64)> + '_ {
        self.tally.iter().map(|(t, n)| (*t, *n))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Event log lost its tail: {}", e);
        }
    }
}

/// Resource: events raised since the last drain
#[derive(Resource, Debug, Default)]
pub struct PendingEvents {
    events: Vec<TavernEvent>,
    /// Ids keep counting across drains
    issued: u64,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps an id on a new event and queues it.
    pub fn emit(&mut self, timestamp: SimTime, kind: EventKind) {
        self.issued += 1;
        let id = generate_event_id(self.issued);
        self.events.push(TavernEvent::new(id, timestamp, kind));
    }

    pub fn drain(&mut self) -> Vec<TavernEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TavernEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
