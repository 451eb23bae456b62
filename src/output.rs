//! Output formatting for sensor snapshots.
//!
//! A [`SensorReport`] is what a host reads back after each poll: the
//! display metadata together with the current state and attributes.

use serde::Serialize;
use tracing::{debug, info};

use crate::arrivals::Arrival;
use crate::fetch::FeedSource;
use crate::sensor::{Attributes, NextBusSensor, SensorSnapshot, SensorState};

#[derive(Debug, Serialize)]
pub struct SensorReport<'a> {
    pub name: &'a str,
    pub unit: &'static str,
    pub icon: &'static str,
    pub attribution: &'static str,
    pub state: SensorState,
    pub attributes: &'a Attributes,
}

impl<'a> SensorReport<'a> {
    pub fn new<S: FeedSource>(sensor: &'a NextBusSensor<S>) -> Self {
        Self::for_snapshot(sensor.name(), sensor.snapshot())
    }

    pub fn for_snapshot(name: &'a str, snapshot: &'a SensorSnapshot) -> Self {
        Self {
            name,
            unit: crate::sensor::UNIT,
            icon: crate::sensor::ICON,
            attribution: crate::sensor::ATTRIBUTION,
            state: snapshot.state,
            attributes: &snapshot.attributes,
        }
    }
}

/// Logs a snapshot using Rust's debug pretty-print format.
pub fn print_pretty(snapshot: &SensorSnapshot) {
    debug!("{:#?}", snapshot);
}

/// Logs a report as a single JSON line.
pub fn print_json(report: &SensorReport<'_>) -> serde_json::Result<()> {
    info!("{}", serde_json::to_string(report)?);
    Ok(())
}

/// Renders ranked arrivals as a plain-text table, soonest first.
pub fn arrivals_table(arrivals: &[Arrival]) -> String {
    let mut table = format!("{:<10} {:>7} {:>6}\n", "ROUTE", "DUE IN", "AT");
    for a in arrivals {
        table.push_str(&format!(
            "{:<10} {:>7} {:>6}\n",
            a.route,
            format!("{} min", a.due_in),
            a.due_at
        ));
    }
    table
}
