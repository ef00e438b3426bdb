//! Grid demand forecasting service: pattern-based forecasts, alerting,
//! household estimates and operator analytics over a JSON HTTP API.

pub mod alerts;
pub mod api;
pub mod chatbot;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod insights;
pub mod ml;
pub mod repo;
pub mod reports;
pub mod simulation;
pub mod state;
pub mod telemetry;
pub mod utils;
