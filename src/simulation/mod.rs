//! Simulated live grid readings.

pub mod realtime;

pub use realtime::{hour_factor, RealtimeSimulator, LIVE_BASE_DEMAND_MW};
