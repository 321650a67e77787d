//! Outbound zone events for the persistence collaborator.
//!
//! Delivery is fire-and-forget: in-memory state is already updated by the
//! time an event is published, and a failed publish is logged and dropped.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::geo::GeoPoint;
use crate::zone::CoverRating;
use crate::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEventKind {
    Captured,
    Reinforced,
    /// Decay took the zone back to neutral; the player fields name the previous owner.
    Neutralized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEvent {
    pub kind: ZoneEventKind,
    pub zone_id: String,
    pub player_id: String,
    pub display_name: String,
    pub position: GeoPoint,
    pub cover_rating: CoverRating,
    pub hp: f64,
    pub timestamp: Timestamp,
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: &ZoneEvent) -> Result<()>;
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &ZoneEvent) -> Result<()> {
        Ok(())
    }
}

/// Forwards events to an async consumer without waiting on it.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ZoneEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ZoneEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &ZoneEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow!("event consumer for {} has gone away", event.zone_id))
    }
}

/// Keeps every event; handy for replays and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ZoneEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ZoneEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, kind: ZoneEventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &ZoneEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn event(kind: ZoneEventKind) -> ZoneEvent {
        ZoneEvent {
            kind,
            zone_id: "zone_1_2".into(),
            player_id: "p1".into(),
            display_name: "Scout".into(),
            position: GeoPoint { lat: 1.0, lng: 2.0 },
            cover_rating: CoverRating::Unknown,
            hp: 100.0,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_channel_sink_reports_closed_consumer() {
        let (sink, mut rx) = ChannelSink::new();
        sink.publish(&event(ZoneEventKind::Captured)).unwrap();
        assert_eq!(rx.try_recv().unwrap().kind, ZoneEventKind::Captured);

        drop(rx);
        assert!(sink.publish(&event(ZoneEventKind::Reinforced)).is_err());
    }

    #[test]
    fn test_memory_sink_counts_by_kind() {
        let sink = MemorySink::new();
        sink.publish(&event(ZoneEventKind::Captured)).unwrap();
        sink.publish(&event(ZoneEventKind::Reinforced)).unwrap();
        sink.publish(&event(ZoneEventKind::Reinforced)).unwrap();
        assert_eq!(sink.count(ZoneEventKind::Reinforced), 2);
        assert_eq!(sink.events().len(), 3);
    }

    #[test]
    fn test_event_payload_shape() {
        let json = serde_json::to_value(event(ZoneEventKind::Captured)).unwrap();
        assert_eq!(json["kind"], "captured");
        assert_eq!(json["zoneId"], "zone_1_2");
        assert_eq!(json["coverRating"], "unknown");
    }
}
