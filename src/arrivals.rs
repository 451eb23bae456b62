//! Arrival predictions for a single stop.
//!
//! Turns a decoded [`FeedMessage`] into the [`Arrival`]s of one stop, with
//! the minutes-until and clock time derived from `now`, then ranks them.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;

/// 24-hour clock used for `due_at`.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    /// Route identifier as published in the feed; empty when the feed omits it.
    pub route: String,
    pub due_at: String,
    /// Whole minutes until arrival, truncated toward zero. Negative when overdue.
    pub due_in: i64,
    pub arrival_epoch: i64,
}

impl Arrival {
    /// Derives the clock time and minutes-until of `arrival_epoch` relative to `now`.
    ///
    /// Returns `None` when the epoch is outside the range chrono can represent.
    pub fn at<Tz: TimeZone>(route: String, arrival_epoch: i64, now: &DateTime<Tz>) -> Option<Self>
    where
        Tz::Offset: std::fmt::Display,
    {
        let arrives = now.timezone().timestamp_opt(arrival_epoch, 0).single()?;

        Some(Self {
            route,
            due_at: arrives.format(TIME_FORMAT).to_string(),
            due_in: due_in_minutes(&arrives, now),
            arrival_epoch,
        })
    }
}

/// Minutes from `now` until `arrives`, truncated toward zero (599 s is 9, -90 s is -1).
pub fn due_in_minutes<Tz: TimeZone>(arrives: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
    arrives.clone().signed_duration_since(now.clone()).num_milliseconds() / 60_000
}

/// Collects every predicted arrival at `stop_id`, in feed order.
///
/// Entities without a trip update and stop-time updates without an arrival
/// time are skipped. An empty result means nothing is scheduled for the stop.
pub fn arrivals_for_stop<Tz: TimeZone>(
    feed: &FeedMessage,
    stop_id: &str,
    now: &DateTime<Tz>,
) -> Vec<Arrival>
where
    Tz::Offset: std::fmt::Display,
{
    let mut arrivals = Vec::new();
    let mut trip_updates = 0usize;

    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        trip_updates += 1;

        for stop_time_update in &trip_update.stop_time_update {
            if stop_time_update.stop_id.as_deref() != Some(stop_id) {
                continue;
            }

            let Some(arrival_epoch) = stop_time_update.arrival.as_ref().and_then(|a| a.time)
            else {
                debug!(entity_id = %entity.id, "Stop-time update has no arrival time");
                continue;
            };

            let route = trip_update.trip.route_id.clone().unwrap_or_default();
            match Arrival::at(route, arrival_epoch, now) {
                Some(arrival) => arrivals.push(arrival),
                None => debug!(arrival_epoch, "Arrival time out of range"),
            }
        }
    }

    debug!(
        entity_count = feed.entity.len(),
        trip_updates,
        matched = arrivals.len(),
        stop_id,
        "Filtered feed for stop"
    );

    arrivals
}

/// Orders arrivals soonest first and keeps at most `limit`.
///
/// The sort is stable, so arrivals due in the same minute keep feed order.
pub fn rank(mut arrivals: Vec<Arrival>, limit: usize) -> Vec<Arrival> {
    arrivals.sort_by_key(|a| a.due_in);
    arrivals.truncate(limit);
    arrivals
}
