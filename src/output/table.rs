//! Terminal subnet table.

use crate::engine::Plan;
use crate::models::{Resource, ResourceKind};
use crate::processing::Topology;
use colored::Colorize;
use std::error::Error;

/// One declared subnet as shown in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetRow {
    pub name: String,
    pub cidr: String,
    pub availability_zone: String,
    pub public: bool,
    /// Name of the route table associated with the subnet.
    pub route_table: String,
    pub default_route: bool,
    pub vpn_associated: bool,
}

/// Left-align `value` in a column of `width`, never truncating.
fn pad_field<T: ToString>(value: T, width: usize) -> String {
    format!("{:<width$}", value.to_string())
}

/// Collect every declared subnet with its routing and VPN association.
pub fn subnet_rows(plan: &Plan) -> Vec<SubnetRow> {
    let route_table_of = |subnet: &str| -> Option<String> {
        plan.of_kind(ResourceKind::RouteTableAssociation)
            .find_map(|d| match &d.resource {
                Resource::RouteTableAssociation {
                    subnet_id,
                    route_table_id,
                } if subnet_id.dependency() == Some(subnet) => {
                    route_table_id.dependency().map(str::to_string)
                }
                _ => None,
            })
    };
    let vpn_associated = |subnet: &str| -> bool {
        plan.of_kind(ResourceKind::ClientVpnNetworkAssociation)
            .any(|d| match &d.resource {
                Resource::ClientVpnNetworkAssociation { subnet_id, .. } => {
                    subnet_id.dependency() == Some(subnet)
                }
                _ => false,
            })
    };

    plan.of_kind(ResourceKind::Subnet)
        .filter_map(|d| match &d.resource {
            Resource::Subnet {
                cidr_block,
                availability_zone,
                map_public_ip_on_launch,
                ..
            } => {
                let route_table = route_table_of(&d.name).unwrap_or_default();
                let default_route = plan
                    .get(&route_table)
                    .map(|rt| rt.routes().iter().any(|r| r.cidr_block == "0.0.0.0/0"))
                    .unwrap_or(false);
                Some(SubnetRow {
                    name: d.name.clone(),
                    cidr: cidr_block.to_string(),
                    availability_zone: availability_zone.clone(),
                    public: *map_public_ip_on_launch,
                    route_table,
                    default_route,
                    vpn_associated: vpn_associated(&d.name),
                })
            }
            _ => None,
        })
        .collect()
}

/// Render one table row without colors.
pub fn format_subnet_row(row: &SubnetRow) -> String {
    format!(
        "{name} {cidr} {az} {access} {rt} {route} {vpn}",
        name = pad_field(&row.name, 20),
        cidr = pad_field(&row.cidr, 16),
        az = pad_field(&row.availability_zone, 12),
        access = pad_field(if row.public { "public" } else { "private" }, 8),
        rt = pad_field(&row.route_table, 24),
        route = pad_field(if row.default_route { "0.0.0.0/0" } else { "-" }, 10),
        vpn = if row.vpn_associated { "vpn" } else { "" },
    )
}

/// Print the subnet layout to stdout.
pub fn print_subnets(plan: &Plan, topology: &Topology) -> Result<(), Box<dyn Error>> {
    let rows = subnet_rows(plan);
    log::info!("#Start print_subnets() {} subnets", rows.len());
    if rows.len() != topology.layout.len() * 3 {
        return Err(format!(
            "Expected {} subnets in plan, found {}",
            topology.layout.len() * 3,
            rows.len()
        )
        .into());
    }

    println!(
        "{}",
        format!(
            "{} {} {} {} {} {} {}",
            pad_field("subnet", 20),
            pad_field("cidr", 16),
            pad_field("zone", 12),
            pad_field("access", 8),
            pad_field("route_table", 24),
            pad_field("default", 10),
            "vpn"
        )
        .bold()
    );
    for row in &rows {
        let line = format_subnet_row(row);
        if row.public {
            println!("{}", line.green());
        } else if row.vpn_associated {
            println!("{}", line.cyan());
        } else {
            println!("{}", line.yellow());
        }
    }
    println!(
        "#{}# VPN DNS resolver {} client CIDR via {}",
        "NOTE".on_blue(),
        topology.vpn_dns_server,
        topology.vpn_endpoint.name()
    );
    Ok(())
}
