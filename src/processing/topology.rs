//! Topology builder.
//!
//! One linear declaration pass: VPC and gateway, per-zone subnets with their
//! route tables, then the client VPN endpoint and a test instance.

use super::carve::{carve_zone_subnets, first_two_octets, vpc_dns_resolver, ZoneSubnets};
use super::check_for_overlapping_subnets;
use crate::config::TopologyConfig;
use crate::engine::{Provisioner, ResourceHandle};
use crate::models::{
    name_tag, AuthenticationOption, ConnectionLogOptions, Ipv4, Resource, Route, RuleDirection,
    SecurityRule,
};
use std::collections::HashMap;
use std::error::Error;

/// Export names published by [`build_topology`].
pub const EXPORT_VPC_ID: &str = "vpcId";
pub const EXPORT_VPN_ENDPOINT_ID: &str = "vpnEndpointId";
pub const EXPORT_VPN_ENDPOINT_DNS_NAME: &str = "vpnEndpointDnsName";
pub const EXPORT_TEST_INSTANCE_ID: &str = "testInstanceId";
pub const EXPORT_TEST_INSTANCE_PRIVATE_IP: &str = "testInstancePrivateIp";

/// Handles for one availability zone's subnets.
#[derive(Debug, Clone)]
pub struct ZoneHandles {
    pub public_compute: ResourceHandle,
    pub private_compute: ResourceHandle,
    pub private_db: ResourceHandle,
    pub private_route_table: ResourceHandle,
}

/// Everything the builder declared, keyed the way callers look it up.
#[derive(Debug)]
pub struct Topology {
    pub vpc: ResourceHandle,
    pub internet_gateway: ResourceHandle,
    pub public_route_table: ResourceHandle,
    /// Carved layout in zone order.
    pub layout: Vec<ZoneSubnets>,
    pub zones: HashMap<String, ZoneHandles>,
    pub vpn_security_group: ResourceHandle,
    pub vpn_endpoint: ResourceHandle,
    pub vpn_dns_server: String,
    pub test_instance: ResourceHandle,
}

/// Validate the config, then declare the whole topology into `ctx`.
///
/// Validation failures return before the first declaration; any declaration
/// error is returned as-is and aborts the rest of the pass.
pub fn build_topology<P: Provisioner>(
    ctx: &mut P,
    config: &TopologyConfig,
) -> Result<Topology, Box<dyn Error>> {
    config.validate().map_err(|e| {
        log::error!("Invalid topology parameters: {e}");
        e
    })?;
    let prefix = first_two_octets(&config.vpc_cidr_block)?;
    let layout = carve_zone_subnets(&prefix, &config.azs)?;
    check_for_overlapping_subnets(&layout)?;
    let vpn_dns_server = vpc_dns_resolver(&prefix);
    let name_prefix = &config.resource_name_prefix;
    log::info!(
        "#Start build_topology() vpc={} zones={:?} dns={vpn_dns_server}",
        config.vpc_cidr_block,
        config.azs
    );

    // VPC
    let vpc_name = format!("{name_prefix}-vpc");
    let vpc = ctx.declare(
        &vpc_name,
        Resource::Vpc {
            cidr_block: Ipv4::new(&config.vpc_cidr_block)?,
            instance_tenancy: "default".to_string(),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            tags: name_tag(&vpc_name),
        },
    )?;

    let igw_name = format!("{name_prefix}-igw");
    let internet_gateway = ctx.declare(
        &igw_name,
        Resource::InternetGateway {
            vpc_id: vpc.id(),
            tags: name_tag(&igw_name),
        },
    )?;

    let public_route_table = ctx.declare(
        "public-route-table",
        Resource::RouteTable {
            vpc_id: vpc.id(),
            routes: vec![Route {
                cidr_block: "0.0.0.0/0".to_string(),
                gateway_id: internet_gateway.id(),
            }],
            tags: name_tag(format!("{name_prefix}-public-rt")),
        },
    )?;

    // Subnets and route table associations
    let mut zones = HashMap::new();
    for zone in &layout {
        let handles = declare_zone(ctx, config, &vpc, &public_route_table, zone)?;
        zones.insert(zone.az.clone(), handles);
    }
    let first_az = &layout
        .first()
        .ok_or("At least one availability zone is required")?
        .az;
    let first_private_compute = zones
        .get(first_az)
        .map(|z: &ZoneHandles| z.private_compute.clone())
        .ok_or_else(|| format!("No subnets declared for zone {first_az}"))?;

    // Client VPN
    let log_group = ctx.declare(
        "clientvpnLogGroup",
        Resource::LogGroup {
            retention_in_days: config.log_retention_days,
        },
    )?;

    let vpn_security_group = ctx.declare(
        "vpnSecurityGroup",
        Resource::SecurityGroup {
            vpc_id: vpc.id(),
            description: "Allow all inbound traffic".to_string(),
            ingress: vec![SecurityRule::allow_all()],
            egress: vec![SecurityRule::allow_all()],
        },
    )?;

    let vpn_endpoint = ctx.declare(
        "vpnEndpoint",
        Resource::ClientVpnEndpoint {
            vpc_id: vpc.id(),
            security_group_ids: vec![vpn_security_group.id()],
            client_cidr_block: Ipv4::new(&config.client_cidr_block)?,
            dns_servers: vec![vpn_dns_server.clone()],
            server_certificate_arn: config.server_certificate_arn.clone(),
            connection_log_options: ConnectionLogOptions {
                enabled: true,
                cloudwatch_log_group: log_group.attr("name"),
            },
            authentication_options: vec![AuthenticationOption::FederatedAuthentication {
                saml_provider_arn: config.saml_provider_arn.clone(),
                self_service_saml_provider_arn: config.self_service_saml_provider_arn.clone(),
            }],
            split_tunnel: true,
            tags: name_tag("AWS SSO Client VPN"),
        },
    )?;

    ctx.declare(
        "vpnSubnetAssociation",
        Resource::ClientVpnNetworkAssociation {
            client_vpn_endpoint_id: vpn_endpoint.id(),
            subnet_id: first_private_compute.id(),
        },
    )?;

    ctx.declare(
        "vpnNetworkAuthorization",
        Resource::ClientVpnAuthorizationRule {
            client_vpn_endpoint_id: vpn_endpoint.id(),
            target_network_cidr: first_private_compute.attr("cidr_block"),
            authorize_all_groups: true,
        },
    )?;

    // Reachability test instance
    ctx.declare(
        "vpnSecurityGroupAllowICMP",
        Resource::SecurityGroupRule {
            direction: RuleDirection::Ingress,
            security_group_id: vpn_security_group.id(),
            protocol: "icmp".to_string(),
            from_port: -1,
            to_port: -1,
            source_security_group_id: Some(vpn_security_group.id()),
            description: "Allow ICMP (ping) traffic from VPN".to_string(),
        },
    )?;

    let test_instance = ctx.declare(
        "testInstance",
        Resource::Instance {
            ami: config.test_instance.ami.clone(),
            instance_type: config.test_instance.instance_type.clone(),
            subnet_id: first_private_compute.id(),
            vpc_security_group_ids: vec![vpn_security_group.id()],
            tags: name_tag(format!("{name_prefix}-al2023-testinstance-samevpc")),
        },
    )?;

    ctx.export(EXPORT_TEST_INSTANCE_ID, test_instance.id())?;
    ctx.export(EXPORT_TEST_INSTANCE_PRIVATE_IP, test_instance.attr("private_ip"))?;
    ctx.export(EXPORT_VPC_ID, vpc.id())?;
    ctx.export(EXPORT_VPN_ENDPOINT_ID, vpn_endpoint.id())?;
    ctx.export(EXPORT_VPN_ENDPOINT_DNS_NAME, vpn_endpoint.attr("dns_name"))?;

    log::info!(
        "Declared topology: {} zones, {} subnets",
        layout.len(),
        layout.len() * 3
    );

    Ok(Topology {
        vpc,
        internet_gateway,
        public_route_table,
        layout,
        zones,
        vpn_security_group,
        vpn_endpoint,
        vpn_dns_server,
        test_instance,
    })
}

fn declare_zone<P: Provisioner>(
    ctx: &mut P,
    config: &TopologyConfig,
    vpc: &ResourceHandle,
    public_route_table: &ResourceHandle,
    zone: &ZoneSubnets,
) -> Result<ZoneHandles, Box<dyn Error>> {
    let az = &zone.az;
    let name_prefix = &config.resource_name_prefix;
    let availability_zone = config.availability_zone(az);

    let public_compute = declare_subnet(
        ctx,
        vpc,
        &format!("public-compute-{az}"),
        zone.public_compute,
        &availability_zone,
        true,
        format!("{name_prefix}-pub-subnet-compute-{az}"),
    )?;
    associate(
        ctx,
        &format!("public-rt-assoc-{az}"),
        &public_compute,
        public_route_table,
    )?;

    // No default route: private subnets stay isolated.
    let private_route_table = ctx.declare(
        &format!("private-route-table-{az}"),
        Resource::RouteTable {
            vpc_id: vpc.id(),
            routes: vec![],
            tags: name_tag(format!("{name_prefix}-private-rt")),
        },
    )?;

    let private_compute = declare_subnet(
        ctx,
        vpc,
        &format!("private-compute-{az}"),
        zone.private_compute,
        &availability_zone,
        false,
        format!("{name_prefix}-priv-subnet-compute-{az}"),
    )?;
    associate(
        ctx,
        &format!("private-compute-rt-assoc-{az}"),
        &private_compute,
        &private_route_table,
    )?;

    let private_db = declare_subnet(
        ctx,
        vpc,
        &format!("private-db-{az}"),
        zone.private_db,
        &availability_zone,
        false,
        format!("{name_prefix}-priv-subnet-db-{az}"),
    )?;
    associate(
        ctx,
        &format!("private-db-rt-assoc-{az}"),
        &private_db,
        &private_route_table,
    )?;

    Ok(ZoneHandles {
        public_compute,
        private_compute,
        private_db,
        private_route_table,
    })
}

fn declare_subnet<P: Provisioner>(
    ctx: &mut P,
    vpc: &ResourceHandle,
    name: &str,
    cidr_block: Ipv4,
    availability_zone: &str,
    public: bool,
    name_tag_value: String,
) -> Result<ResourceHandle, Box<dyn Error>> {
    let handle = ctx.declare(
        name,
        Resource::Subnet {
            vpc_id: vpc.id(),
            cidr_block,
            availability_zone: availability_zone.to_string(),
            map_public_ip_on_launch: public,
            tags: name_tag(name_tag_value),
        },
    )?;
    Ok(handle)
}

fn associate<P: Provisioner>(
    ctx: &mut P,
    name: &str,
    subnet: &ResourceHandle,
    route_table: &ResourceHandle,
) -> Result<(), Box<dyn Error>> {
    ctx.declare(
        name,
        Resource::RouteTableAssociation {
            subnet_id: subnet.id(),
            route_table_id: route_table.id(),
        },
    )?;
    Ok(())
}
