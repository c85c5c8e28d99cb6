//! HTTP gateways for the orchestration and canary APIs

pub mod canary;
pub mod client;
pub mod orchestration;
