//! LipaChat Agents - conversation orchestration for LipaChat customer channels.
//!
//! Inbound customer messages are classified, scored for sentiment and either
//! answered by a support, marketing or general agent or handed off to a human
//! queue. Conversations are kept per customer and channel, with a serialised
//! history that survives restarts when PostgreSQL is configured.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
