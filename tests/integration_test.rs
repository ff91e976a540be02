//! Integration tests for vpn-topology
//!
//! These tests verify the complete workflow from parameters to a built plan.

use vpn_topology::{
    config::TopologyConfig,
    engine::{DeclareError, Plan, Provisioner},
    models::{Output, Resource, ResourceKind},
    plan_topology,
    processing::{
        build_topology, EXPORT_TEST_INSTANCE_ID, EXPORT_TEST_INSTANCE_PRIVATE_IP, EXPORT_VPC_ID,
        EXPORT_VPN_ENDPOINT_DNS_NAME, EXPORT_VPN_ENDPOINT_ID,
    },
};

fn subnet_cidrs(plan: &Plan) -> Vec<(String, String, bool)> {
    plan.of_kind(ResourceKind::Subnet)
        .map(|d| match &d.resource {
            Resource::Subnet {
                cidr_block,
                map_public_ip_on_launch,
                ..
            } => (d.name.clone(), cidr_block.to_string(), *map_public_ip_on_launch),
            other => panic!("not a subnet: {other:?}"),
        })
        .collect()
}

/// Route table each subnet is associated with.
fn route_table_of<'a>(plan: &'a Plan, subnet: &str) -> &'a Resource {
    let rt_name = plan
        .of_kind(ResourceKind::RouteTableAssociation)
        .find_map(|d| match &d.resource {
            Resource::RouteTableAssociation {
                subnet_id,
                route_table_id,
            } if subnet_id.dependency() == Some(subnet) => route_table_id.dependency(),
            _ => None,
        })
        .expect("subnet has no route table association");
    plan.get(rt_name).expect("route table not declared")
}

#[test]
fn test_full_workflow_with_defaults() {
    let (plan, topology) = plan_topology(&TopologyConfig::default()).expect("Failed to plan");

    let subnets = subnet_cidrs(&plan);
    assert_eq!(subnets.len(), 9, "Expected 3 subnets per zone");
    assert_eq!(
        subnets[..3],
        [
            ("public-compute-a".to_string(), "172.16.0.0/24".to_string(), true),
            ("private-compute-a".to_string(), "172.16.1.0/24".to_string(), false),
            ("private-db-a".to_string(), "172.16.2.0/24".to_string(), false),
        ]
    );
    assert_eq!(topology.vpn_dns_server, "172.16.0.2");
    assert_eq!(topology.zones.len(), 3);
    // vpc, igw, public rt + 7 per zone + 7 for the VPN and test instance
    assert_eq!(plan.len(), 3 + 3 * 7 + 7);
}

#[test]
fn test_third_octets_strictly_increase() {
    for n in 1..=5 {
        let config = TopologyConfig {
            azs: (0..n).map(|i| format!("z{i}")).collect(),
            ..Default::default()
        };
        let (plan, _) = plan_topology(&config).expect("Failed to plan");
        let octets: Vec<u8> = plan
            .of_kind(ResourceKind::Subnet)
            .map(|d| match &d.resource {
                Resource::Subnet { cidr_block, .. } => cidr_block.addr.octets()[2],
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(octets.len(), 3 * n);
        assert_eq!(octets, (0..(3 * n) as u8).collect::<Vec<u8>>());
    }
}

#[test]
fn test_default_route_only_on_public_subnets() {
    let (plan, _) = plan_topology(&TopologyConfig::default()).expect("Failed to plan");

    for (name, _, public) in subnet_cidrs(&plan) {
        let routes = route_table_of(&plan, &name).routes();
        let has_default = routes.iter().any(|r| {
            r.cidr_block == "0.0.0.0/0"
                && r.gateway_id.dependency() == Some("blog-us-east-2-igw")
        });
        assert_eq!(has_default, public, "subnet {name}");
        if !public {
            assert!(routes.is_empty(), "private subnet {name} has routes");
        }
    }
}

#[test]
fn test_only_first_private_compute_gets_vpn() {
    let (plan, _) = plan_topology(&TopologyConfig::default()).expect("Failed to plan");

    let associations: Vec<&Resource> = plan
        .of_kind(ResourceKind::ClientVpnNetworkAssociation)
        .map(|d| &d.resource)
        .collect();
    assert_eq!(associations.len(), 1);
    match associations[0] {
        Resource::ClientVpnNetworkAssociation { subnet_id, .. } => {
            assert_eq!(subnet_id.dependency(), Some("private-compute-a"))
        }
        other => panic!("unexpected {other:?}"),
    }

    let rules: Vec<&Resource> = plan
        .of_kind(ResourceKind::ClientVpnAuthorizationRule)
        .map(|d| &d.resource)
        .collect();
    assert_eq!(rules.len(), 1);
    match rules[0] {
        Resource::ClientVpnAuthorizationRule {
            target_network_cidr,
            authorize_all_groups,
            ..
        } => {
            assert!(*authorize_all_groups);
            assert_eq!(
                plan.resolve(target_network_cidr),
                Some("172.16.1.0/24".to_string())
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_test_instance_placement() {
    let (plan, topology) = plan_topology(&TopologyConfig::default()).expect("Failed to plan");
    match plan.get(topology.test_instance.name()).unwrap() {
        Resource::Instance {
            subnet_id,
            vpc_security_group_ids,
            instance_type,
            ..
        } => {
            assert_eq!(subnet_id.dependency(), Some("private-compute-a"));
            assert_eq!(vpc_security_group_ids, &vec![topology.vpn_security_group.id()]);
            assert_eq!(instance_type, "t4g.micro");
        }
        other => panic!("unexpected {other:?}"),
    }

    let icmp = plan
        .of_kind(ResourceKind::SecurityGroupRule)
        .next()
        .expect("ICMP rule missing");
    match &icmp.resource {
        Resource::SecurityGroupRule {
            protocol,
            source_security_group_id,
            ..
        } => {
            assert_eq!(protocol, "icmp");
            assert_eq!(
                source_security_group_id.as_ref(),
                Some(&topology.vpn_security_group.id())
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_exports() {
    let (plan, _) = plan_topology(&TopologyConfig::default()).expect("Failed to plan");
    let names: Vec<&str> = plan.exports.keys().map(String::as_str).collect();
    let mut expected = vec![
        EXPORT_TEST_INSTANCE_ID,
        EXPORT_TEST_INSTANCE_PRIVATE_IP,
        EXPORT_VPC_ID,
        EXPORT_VPN_ENDPOINT_DNS_NAME,
        EXPORT_VPN_ENDPOINT_ID,
    ];
    expected.sort();
    assert_eq!(names, expected);
    assert_eq!(
        plan.exports[EXPORT_VPN_ENDPOINT_DNS_NAME],
        Output::Attribute {
            resource: "vpnEndpoint".to_string(),
            attribute: "dns_name".to_string()
        }
    );
    assert_eq!(plan.resolve(&plan.exports[EXPORT_VPC_ID]), None);
}

#[test]
fn test_invalid_cidr_declares_nothing() {
    for cidr in ["not-a-cidr", "10.0.0.0"] {
        let mut plan = Plan::new();
        let config = TopologyConfig {
            vpc_cidr_block: cidr.to_string(),
            ..Default::default()
        };
        let err = build_topology(&mut plan, &config).unwrap_err().to_string();
        assert!(err.starts_with("invalid CIDR format"), "{err}");
        assert!(plan.is_empty());
    }
}

#[test]
fn test_rebuild_into_same_plan_fails() {
    let config = TopologyConfig::default();
    let mut plan = Plan::new();
    build_topology(&mut plan, &config).expect("first build");
    let before = plan.len();

    let err = build_topology(&mut plan, &config).unwrap_err();
    assert_eq!(
        err.to_string(),
        DeclareError::DuplicateName("blog-us-east-2-vpc".to_string()).to_string()
    );
    assert_eq!(plan.len(), before);
    assert!(plan
        .declare(
            "orphan-igw",
            Resource::InternetGateway {
                vpc_id: Output::Attribute {
                    resource: "missing-vpc".to_string(),
                    attribute: "id".to_string()
                },
                tags: Default::default(),
            }
        )
        .is_err());
}

#[test]
fn test_config_file_two_zones() {
    let config = TopologyConfig::from_file("tests/test_data/topology_two_zones.json")
        .expect("Failed to read config fixture");
    assert_eq!(config.saml_provider_arn, TopologyConfig::default().saml_provider_arn);

    let (plan, topology) = plan_topology(&config).expect("Failed to plan");
    let subnets = subnet_cidrs(&plan);
    assert_eq!(subnets.len(), 6);
    // zone order decides addressing: "b" is listed first
    assert_eq!(subnets[0], ("public-compute-b".to_string(), "10.40.0.0/24".to_string(), true));
    assert_eq!(subnets[3], ("public-compute-a".to_string(), "10.40.3.0/24".to_string(), true));
    assert_eq!(topology.vpn_dns_server, "10.40.0.2");

    match plan.get("private-compute-b").unwrap() {
        Resource::Subnet {
            availability_zone, ..
        } => assert_eq!(availability_zone, "eu-west-1b"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(plan.get("lab-eu-west-1-vpc").is_some());
    assert_eq!(
        plan.of_kind(ResourceKind::ClientVpnNetworkAssociation).count(),
        1
    );
    assert_eq!(topology.zones["b"].private_compute.name(), "private-compute-b");
}
