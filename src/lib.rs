//! Intake Agent - conversational data collection
//!
//! Runs a configurable agent that collects a fixed set of fields from a user
//! one turn at a time. It handles corrections and off-topic replies, and it
//! escalates to a human when a policy fires.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
