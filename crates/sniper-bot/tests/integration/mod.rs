//! Integration tests for sniper-bot.
//!
//! These tests drive a full `Application` run against local mocks:
//! - Signed REST order entry (mock exchange)
//! - Public trade stream (mock WebSocket server)
//! - Run outcome, sell placement and run report

pub mod common;
