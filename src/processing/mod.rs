//! Topology construction logic.
//!
//! - [`carve`] - Address carving of the VPC block into per-zone subnets
//! - [`topology`] - The declaration pass that builds the resource graph

mod carve;
mod topology;

// Re-export public functions
pub use carve::{
    carve_zone_subnets, check_for_overlapping_subnets, first_two_octets, vpc_dns_resolver,
    ZoneSubnets,
};
pub use topology::{
    build_topology, Topology, ZoneHandles, EXPORT_TEST_INSTANCE_ID,
    EXPORT_TEST_INSTANCE_PRIVATE_IP, EXPORT_VPC_ID, EXPORT_VPN_ENDPOINT_DNS_NAME,
    EXPORT_VPN_ENDPOINT_ID,
};
