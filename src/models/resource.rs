//! Declarative resource descriptors.
//!
//! Each [`Resource`] maps to one remote cloud object once the plan is applied.
//! Values that depend on another resource are carried as [`Output`] references
//! so the engine can order declarations and resolve them later.

use super::Ipv4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-keyed tag map, ordered for stable output.
pub type Tags = BTreeMap<String, String>;

/// Build a tag map holding only a `Name` tag.
pub fn name_tag(name: impl Into<String>) -> Tags {
    Tags::from([("Name".to_string(), name.into())])
}

/// A value passed into a declaration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    /// Known at declaration time.
    Literal(String),
    /// Attribute of a previously declared resource, e.g. its `id`.
    Attribute { resource: String, attribute: String },
}

impl Output {
    pub fn literal(value: impl Into<String>) -> Output {
        Output::Literal(value.into())
    }

    /// Name of the resource this output depends on, if any.
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Output::Literal(_) => None,
            Output::Attribute { resource, .. } => Some(resource),
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Output::Literal(value) => write!(f, "{value}"),
            Output::Attribute {
                resource,
                attribute,
            } => write!(f, "${{{resource}.{attribute}}}"),
        }
    }
}

/// Kind of resource, used for handles and log lines.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    InternetGateway,
    RouteTable,
    RouteTableAssociation,
    Subnet,
    SecurityGroup,
    SecurityGroupRule,
    LogGroup,
    ClientVpnEndpoint,
    ClientVpnNetworkAssociation,
    ClientVpnAuthorizationRule,
    Instance,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::InternetGateway => "internet_gateway",
            ResourceKind::RouteTable => "route_table",
            ResourceKind::RouteTableAssociation => "route_table_association",
            ResourceKind::Subnet => "subnet",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::SecurityGroupRule => "security_group_rule",
            ResourceKind::LogGroup => "log_group",
            ResourceKind::ClientVpnEndpoint => "client_vpn_endpoint",
            ResourceKind::ClientVpnNetworkAssociation => "client_vpn_network_association",
            ResourceKind::ClientVpnAuthorizationRule => "client_vpn_authorization_rule",
            ResourceKind::Instance => "instance",
        };
        f.write_str(s)
    }
}

/// Route table entry: destination CIDR to next hop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Route {
    pub cidr_block: String,
    pub gateway_id: Output,
}

/// Inline security group rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecurityRule {
    /// `"-1"` means all protocols.
    pub protocol: String,
    pub from_port: i32,
    pub to_port: i32,
    pub cidr_blocks: Vec<String>,
}

impl SecurityRule {
    /// Every protocol, every port, from anywhere.
    pub fn allow_all() -> SecurityRule {
        SecurityRule {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: 0,
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    Ingress,
    Egress,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConnectionLogOptions {
    pub enabled: bool,
    pub cloudwatch_log_group: Output,
}

/// Client VPN authentication method.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthenticationOption {
    FederatedAuthentication {
        saml_provider_arn: String,
        self_service_saml_provider_arn: String,
    },
}

/// A single declarative resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resource {
    Vpc {
        cidr_block: Ipv4,
        instance_tenancy: String,
        enable_dns_support: bool,
        enable_dns_hostnames: bool,
        tags: Tags,
    },
    InternetGateway {
        vpc_id: Output,
        tags: Tags,
    },
    RouteTable {
        vpc_id: Output,
        routes: Vec<Route>,
        tags: Tags,
    },
    RouteTableAssociation {
        subnet_id: Output,
        route_table_id: Output,
    },
    Subnet {
        vpc_id: Output,
        cidr_block: Ipv4,
        availability_zone: String,
        map_public_ip_on_launch: bool,
        tags: Tags,
    },
    SecurityGroup {
        vpc_id: Output,
        description: String,
        ingress: Vec<SecurityRule>,
        egress: Vec<SecurityRule>,
    },
    SecurityGroupRule {
        direction: RuleDirection,
        security_group_id: Output,
        protocol: String,
        from_port: i32,
        to_port: i32,
        source_security_group_id: Option<Output>,
        description: String,
    },
    LogGroup {
        retention_in_days: u32,
    },
    ClientVpnEndpoint {
        vpc_id: Output,
        security_group_ids: Vec<Output>,
        client_cidr_block: Ipv4,
        dns_servers: Vec<String>,
        server_certificate_arn: String,
        connection_log_options: ConnectionLogOptions,
        authentication_options: Vec<AuthenticationOption>,
        split_tunnel: bool,
        tags: Tags,
    },
    ClientVpnNetworkAssociation {
        client_vpn_endpoint_id: Output,
        subnet_id: Output,
    },
    ClientVpnAuthorizationRule {
        client_vpn_endpoint_id: Output,
        target_network_cidr: Output,
        authorize_all_groups: bool,
    },
    Instance {
        ami: String,
        instance_type: String,
        subnet_id: Output,
        vpc_security_group_ids: Vec<Output>,
        tags: Tags,
    },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Vpc { .. } => ResourceKind::Vpc,
            Resource::InternetGateway { .. } => ResourceKind::InternetGateway,
            Resource::RouteTable { .. } => ResourceKind::RouteTable,
            Resource::RouteTableAssociation { .. } => ResourceKind::RouteTableAssociation,
            Resource::Subnet { .. } => ResourceKind::Subnet,
            Resource::SecurityGroup { .. } => ResourceKind::SecurityGroup,
            Resource::SecurityGroupRule { .. } => ResourceKind::SecurityGroupRule,
            Resource::LogGroup { .. } => ResourceKind::LogGroup,
            Resource::ClientVpnEndpoint { .. } => ResourceKind::ClientVpnEndpoint,
            Resource::ClientVpnNetworkAssociation { .. } => {
                ResourceKind::ClientVpnNetworkAssociation
            }
            Resource::ClientVpnAuthorizationRule { .. } => ResourceKind::ClientVpnAuthorizationRule,
            Resource::Instance { .. } => ResourceKind::Instance,
        }
    }

    /// Every [`Output`] this resource takes as input.
    pub fn inputs(&self) -> Vec<&Output> {
        match self {
            Resource::Vpc { .. } | Resource::LogGroup { .. } => vec![],
            Resource::InternetGateway { vpc_id, .. } => vec![vpc_id],
            Resource::RouteTable { vpc_id, routes, .. } => std::iter::once(vpc_id)
                .chain(routes.iter().map(|r| &r.gateway_id))
                .collect(),
            Resource::RouteTableAssociation {
                subnet_id,
                route_table_id,
            } => vec![subnet_id, route_table_id],
            Resource::Subnet { vpc_id, .. } => vec![vpc_id],
            Resource::SecurityGroup { vpc_id, .. } => vec![vpc_id],
            Resource::SecurityGroupRule {
                security_group_id,
                source_security_group_id,
                ..
            } => std::iter::once(security_group_id)
                .chain(source_security_group_id.iter())
                .collect(),
            Resource::ClientVpnEndpoint {
                vpc_id,
                security_group_ids,
                connection_log_options,
                ..
            } => std::iter::once(vpc_id)
                .chain(security_group_ids.iter())
                .chain(std::iter::once(&connection_log_options.cloudwatch_log_group))
                .collect(),
            Resource::ClientVpnNetworkAssociation {
                client_vpn_endpoint_id,
                subnet_id,
            } => vec![client_vpn_endpoint_id, subnet_id],
            Resource::ClientVpnAuthorizationRule {
                client_vpn_endpoint_id,
                target_network_cidr,
                ..
            } => vec![client_vpn_endpoint_id, target_network_cidr],
            Resource::Instance {
                subnet_id,
                vpc_security_group_ids,
                ..
            } => std::iter::once(subnet_id)
                .chain(vpc_security_group_ids.iter())
                .collect(),
        }
    }

    /// Attribute value already known before apply.
    ///
    /// Computed attributes such as `id` or `dns_name` return `None`.
    pub fn known_attribute(&self, attribute: &str) -> Option<String> {
        match (self, attribute) {
            (Resource::Vpc { cidr_block, .. }, "cidr_block") => Some(cidr_block.to_string()),
            (Resource::Subnet { cidr_block, .. }, "cidr_block") => Some(cidr_block.to_string()),
            _ => None,
        }
    }

    /// Default route entries carried by a route table, empty for other kinds.
    pub fn routes(&self) -> &[Route] {
        match self {
            Resource::RouteTable { routes, .. } => routes,
            _ => &[],
        }
    }
}
