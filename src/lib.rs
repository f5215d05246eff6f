//! spot-launch - multi-region EC2 spot capacity launcher
//!
//! Reads a region catalog and a per-run launch plan, then concurrently
//! requests one batch of instances per plan entry and polls each region
//! until public addresses are assigned.

pub mod addresses;
pub mod aws;
pub mod config;
pub mod launcher;
pub mod logs;
pub mod orchestrator;
pub mod user_data;
pub mod wait;
