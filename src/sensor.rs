//! The next-bus sensor: one poll cycle from feed bytes to a displayable state.
//!
//! Each update builds a fresh [`SensorSnapshot`] and swaps it in whole. A
//! failed fetch or decode yields the `Error` snapshot, never the previous one.

use chrono::{DateTime, Local, TimeZone};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::arrivals::{Arrival, arrivals_for_stop, rank};
use crate::config::{AttributeStyle, SensorConfig};
use crate::error::{ConfigError, UpdateError};
use crate::fetch::FeedSource;
use crate::parser::parse_feed;

pub const ATTR_STOP_ID: &str = "Stop ID";
pub const ATTR_ROUTE: &str = "Route";
pub const ATTR_DUE_IN: &str = "Due in";
pub const ATTR_DUE_AT: &str = "Due at";
pub const ATTR_NEXT_UP: &str = "Later Bus";
pub const ATTR_ARRIVALS: &str = "Arrivals";

pub const NO_BUSES: &str = "No buses";
pub const ERROR: &str = "Error";
pub const NOT_AVAILABLE: &str = "N/A";
const NO_LATER_BUS: &str = "None";

pub const UNIT: &str = "min";
pub const ICON: &str = "mdi:bus";
pub const ATTRIBUTION: &str = "Data provided by NTA GTFS-Realtime";

pub type Attributes = BTreeMap<&'static str, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SensorState {
    /// No update has run yet.
    #[default]
    Unknown,
    /// Minutes until the nearest arrival.
    Nominal(i64),
    /// The feed was read but lists nothing for the stop.
    Empty,
    Error,
}

impl SensorState {
    pub fn primary_value(&self) -> Option<String> {
        match self {
            SensorState::Unknown => None,
            SensorState::Nominal(due_in) => Some(due_in.to_string()),
            SensorState::Empty => Some(NO_BUSES.to_string()),
            SensorState::Error => Some(ERROR.to_string()),
        }
    }
}

impl Serialize for SensorState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.primary_value().serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub state: SensorState,
    pub attributes: Attributes,
}

impl SensorSnapshot {
    /// Presents ranked arrivals. The first is the headline value; the second,
    /// if any, becomes the "Later Bus" summary.
    pub fn from_arrivals(stop_id: &str, arrivals: &[Arrival], style: AttributeStyle) -> Self {
        let Some(nearest) = arrivals.first() else {
            return Self::empty();
        };

        let later = arrivals
            .get(1)
            .map(|a| format!("{} in {}", a.route, a.due_in))
            .unwrap_or_else(|| NO_LATER_BUS.to_string());

        let mut attributes = Attributes::new();
        attributes.insert(ATTR_STOP_ID, Value::from(stop_id));
        attributes.insert(ATTR_ROUTE, Value::from(nearest.route.as_str()));
        attributes.insert(ATTR_DUE_IN, Value::from(nearest.due_in.to_string()));
        attributes.insert(ATTR_DUE_AT, Value::from(nearest.due_at.as_str()));
        attributes.insert(ATTR_NEXT_UP, Value::from(later));

        if style == AttributeStyle::Full {
            let listed = arrivals
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "route": a.route,
                        "due_in": a.due_in,
                        "due_at": a.due_at,
                    })
                })
                .collect();
            attributes.insert(ATTR_ARRIVALS, Value::Array(listed));
        }

        Self {
            state: SensorState::Nominal(nearest.due_in),
            attributes,
        }
    }

    pub fn empty() -> Self {
        Self {
            state: SensorState::Empty,
            attributes: Attributes::new(),
        }
    }

    /// The degraded state shown after any failed poll: placeholders only.
    pub fn error() -> Self {
        let attributes = [ATTR_ROUTE, ATTR_DUE_AT, ATTR_DUE_IN]
            .into_iter()
            .map(|key| (key, Value::from(NOT_AVAILABLE)))
            .collect();

        Self {
            state: SensorState::Error,
            attributes,
        }
    }

    pub fn primary_value(&self) -> Option<String> {
        self.state.primary_value()
    }
}

/// Polls one stop and holds the latest [`SensorSnapshot`].
pub struct NextBusSensor<S> {
    source: S,
    config: SensorConfig,
    snapshot: SensorSnapshot,
}

impl<S: FeedSource> NextBusSensor<S> {
    pub fn new(source: S, config: SensorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            snapshot: SensorSnapshot::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn stop_id(&self) -> &str {
        &self.config.stop_id
    }

    pub fn unit(&self) -> &'static str {
        UNIT
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    pub fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    /// Runs one poll cycle against the local clock without touching the held snapshot.
    pub async fn refresh(&self) -> Result<SensorSnapshot, UpdateError> {
        self.refresh_with(Local::now).await
    }

    /// Runs one poll cycle. `now` is read once the feed has been decoded, so
    /// minutes-until reflect the moment the data was interpreted.
    #[tracing::instrument(skip_all, fields(stop_id = %self.config.stop_id))]
    pub async fn refresh_with<Tz, F>(&self, now: F) -> Result<SensorSnapshot, UpdateError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
        F: FnOnce() -> DateTime<Tz>,
    {
        let bytes = self.source.fetch_feed().await?;
        let feed = parse_feed(&bytes)?;

        let arrivals = arrivals_for_stop(&feed, &self.config.stop_id, &now());
        let ranked = rank(arrivals, self.config.max_arrivals);

        Ok(SensorSnapshot::from_arrivals(
            &self.config.stop_id,
            &ranked,
            self.config.attributes,
        ))
    }

    /// Host entry point: refreshes against the local clock and replaces the
    /// held snapshot. Never fails; errors become the `Error` state.
    pub async fn update(&mut self) -> &SensorSnapshot {
        self.update_with(Local::now).await
    }

    pub async fn update_with<Tz, F>(&mut self, now: F) -> &SensorSnapshot
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
        F: FnOnce() -> DateTime<Tz>,
    {
        let snapshot = match self.refresh_with(now).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(
                    stop_id = %self.config.stop_id,
                    stage = e.stage(),
                    error = %e,
                    "Sensor update failed"
                );
                SensorSnapshot::error()
            }
        };

        if std::mem::discriminant(&snapshot.state) != std::mem::discriminant(&self.snapshot.state) {
            info!(
                stop_id = %self.config.stop_id,
                state = snapshot.primary_value().as_deref().unwrap_or_default(),
                "Sensor state changed"
            );
        }

        self.snapshot = snapshot;
        &self.snapshot
    }
}
