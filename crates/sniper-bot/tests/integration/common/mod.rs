//! Shared test servers.

pub mod mock_exchange;
pub mod mock_ws;
