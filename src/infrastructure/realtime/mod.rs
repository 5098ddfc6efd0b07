//! Realtime fan-out: broadcaster implementations and the event publisher

pub mod broadcaster;
pub mod publisher;

pub use broadcaster::{BroadcastRecord, RecordingBroadcaster, TracingBroadcaster};
pub use publisher::RealtimePublisher;
