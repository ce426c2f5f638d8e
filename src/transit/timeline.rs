use crate::types::Checkpoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an event within a finished route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Stop {
    Departure,
    /// Interior checkpoint, numbered from 1
    Checkpoint(usize),
    Arrival,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Departure => write!(f, "Departure"),
            Stop::Checkpoint(n) => write!(f, "Checkpoint {}", n),
            Stop::Arrival => write!(f, "Arrival"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub stop: Stop,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEvent {
    fn new(stop: Stop, timestamp: DateTime<Utc>) -> Self {
        Self {
            stop,
            label: stop.to_string(),
            timestamp,
        }
    }
}

/// Project a checkpoint sequence onto labelled events.
///
/// A route needs both a departure and an arrival, so fewer than two
/// checkpoints produce no events at all.
pub fn build_timeline(checkpoints: &[Checkpoint]) -> Vec<TimelineEvent> {
    let (first, last) = match checkpoints {
        [first, .., last] => (first, last),
        _ => return Vec::new(),
    };

    let interior = &checkpoints[1..checkpoints.len() - 1];
    let mut events = Vec::with_capacity(checkpoints.len());

    events.push(TimelineEvent::new(Stop::Departure, first.timestamp));
    events.extend(
        interior
            .iter()
            .enumerate()
            .map(|(i, checkpoint)| TimelineEvent::new(Stop::Checkpoint(i + 1), checkpoint.timestamp)),
    );
    events.push(TimelineEvent::new(Stop::Arrival, last.timestamp));

    events
}
