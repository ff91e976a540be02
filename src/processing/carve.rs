//! Address carving.
//!
//! Splits the VPC block into consecutive /24 subnets, three per availability
//! zone, by counting up the third octet from zero.

use crate::config::{DEFAULT_SUBNET_MASK, VPC_DNS_HOST_OFFSET};
use crate::models::Ipv4;
use itertools::Itertools;
use std::error::Error;

/// Subnets carved for one availability zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSubnets {
    /// Zone suffix as configured, e.g. `a`.
    pub az: String,
    pub public_compute: Ipv4,
    pub private_compute: Ipv4,
    pub private_db: Ipv4,
}

impl ZoneSubnets {
    /// Carved blocks in allocation order.
    pub fn cidrs(&self) -> [Ipv4; 3] {
        [self.public_compute, self.private_compute, self.private_db]
    }
}

/// Return `"A.B"` for a CIDR `"A.B.C.D/len"`.
///
/// # Examples
/// ```
/// use vpn_topology::processing::first_two_octets;
/// assert_eq!(first_two_octets("172.16.0.0/16").unwrap(), "172.16");
/// ```
pub fn first_two_octets(cidr: &str) -> Result<String, Box<dyn Error>> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!("invalid CIDR format: {cidr}").into());
    }

    let octets: Vec<&str> = parts[0].split('.').collect();
    if octets.len() < 2 {
        return Err(format!("invalid IP address in CIDR: {cidr}").into());
    }

    Ok(format!("{}.{}", octets[0], octets[1]))
}

/// Resolver address the VPN hands to clients, fixed at `.0.2` in the VPC.
pub fn vpc_dns_resolver(prefix: &str) -> String {
    format!("{prefix}.{VPC_DNS_HOST_OFFSET}")
}

/// Allocate public-compute, private-compute and private-db /24s per zone.
///
/// The counter is shared across zones, so zone order decides every address.
pub fn carve_zone_subnets(
    prefix: &str,
    azs: &[String],
) -> Result<Vec<ZoneSubnets>, Box<dyn Error>> {
    let mut third_octet: u32 = 0;
    let mut next = || -> Result<Ipv4, Box<dyn Error>> {
        if third_octet > u8::MAX as u32 {
            return Err(format!("Third octet overflow carving {prefix}.{third_octet}.0").into());
        }
        let cidr = Ipv4::new(&format!("{prefix}.{third_octet}.0/{DEFAULT_SUBNET_MASK}"))?;
        third_octet += 1;
        Ok(cidr)
    };

    let mut zones = Vec::with_capacity(azs.len());
    for az in azs {
        zones.push(ZoneSubnets {
            az: az.clone(),
            public_compute: next()?,
            private_compute: next()?,
            private_db: next()?,
        });
    }
    log::debug!(
        "carved {} subnets across {} zones from {prefix}",
        zones.len() * 3,
        zones.len()
    );
    Ok(zones)
}

/// Return error if any two carved subnets overlap.
pub fn check_for_overlapping_subnets(zones: &[ZoneSubnets]) -> Result<(), Box<dyn Error>> {
    let sorted: Vec<Ipv4> = zones.iter().flat_map(|z| z.cidrs()).sorted().collect();
    for (a, b) in sorted.iter().tuple_windows() {
        if a.overlaps(b)? {
            return Err(format!("Overlapping subnets found: {a} and {b}").into());
        }
    }
    Ok(())
}
