//! AWS service clients

pub mod ec2;

pub use ec2::{BatchRequest, Ec2Client, InstanceNetworking};
