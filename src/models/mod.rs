//! Domain models for the VPN topology.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Ipv4`] - IPv4 network with CIDR notation support
//! - [`Resource`] - declarative cloud resource descriptors
//! - [`Output`] - literal values and references between resources

mod ipv4;
mod resource;

// Re-export public types
pub use ipv4::{broadcast_addr, cut_addr, get_cidr_mask, Ipv4, MAX_LENGTH};
pub use resource::{
    name_tag, AuthenticationOption, ConnectionLogOptions, Output, Resource, ResourceKind, Route,
    RuleDirection, SecurityRule, Tags,
};
