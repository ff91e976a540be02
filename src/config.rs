//! Topology parameters.
//!
//! [`TopologyConfig::default`] carries the literal parameter set; a JSON file may
//! override any subset of fields.

use crate::models::Ipv4;
use crate::processing::{carve_zone_subnets, first_two_octets};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use std::sync::OnceLock;

/// Prefix length of every carved subnet.
pub const DEFAULT_SUBNET_MASK: u8 = 24;

/// Host part of the VPC resolver address, appended to the first two octets.
pub const VPC_DNS_HOST_OFFSET: &str = "0.2";

/// Environment variable naming an optional JSON override file.
pub const CONFIG_PATH_ENV: &str = "TOPOLOGY_CONFIG";

static ARN_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_arn_regex() -> &'static Regex {
    ARN_REGEX.get_or_init(|| {
        Regex::new(r"^arn:aws[a-zA-Z-]*:[a-z0-9-]+:[a-z0-9-]*:\d*:.+$").expect("Invalid Regex")
    })
}

/// Test instance placed in the first zone's private compute subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TestInstanceConfig {
    pub ami: String,
    pub instance_type: String,
}

impl Default for TestInstanceConfig {
    fn default() -> Self {
        TestInstanceConfig {
            // AL2023 arm64 in us-east-2
            ami: "ami-0a9f08a6603f3338e".to_string(),
            instance_type: "t4g.micro".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TopologyConfig {
    pub resource_name_prefix: String,
    pub vpc_cidr_block: String,
    pub client_cidr_block: String,
    pub region: String,
    /// Zone suffixes, e.g. `a` for `us-east-2a`. Order decides subnet addressing.
    pub azs: Vec<String>,
    pub server_certificate_arn: String,
    pub saml_provider_arn: String,
    pub self_service_saml_provider_arn: String,
    pub test_instance: TestInstanceConfig,
    pub log_retention_days: u32,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig {
            resource_name_prefix: "blog-us-east-2".to_string(),
            vpc_cidr_block: "172.16.0.0/16".to_string(),
            client_cidr_block: "10.255.252.0/22".to_string(),
            region: "us-east-2".to_string(),
            azs: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            server_certificate_arn:
                "arn:aws:acm:us-east-2:318168271290:certificate/9e709430-a008-4d6a-9599-265c3e5f24dc"
                    .to_string(),
            saml_provider_arn: "arn:aws:iam::318168271290:saml-provider/aws-client-vpn"
                .to_string(),
            self_service_saml_provider_arn:
                "arn:aws:iam::318168271290:saml-provider/aws-client-vpn-self-service".to_string(),
            test_instance: TestInstanceConfig::default(),
            log_retention_days: 7,
        }
    }
}

impl TopologyConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &str) -> Result<TopologyConfig, Box<dyn Error>> {
        if !Path::new(path).exists() {
            return Err(format!("Config file does not exist: {path}").into());
        }
        log::info!("Reading topology config: {path}");
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading config file {path}: {e}"))?;
        TopologyConfig::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<TopologyConfig, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let config = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            format!(
                "Error parsing config JSON: path={} error={}",
                e.path(),
                e
            )
        })?;
        Ok(config)
    }

    /// Load from the file named by `TOPOLOGY_CONFIG`, else the defaults.
    pub fn load() -> Result<TopologyConfig, Box<dyn Error>> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => TopologyConfig::from_file(&path),
            Err(_) => {
                log::info!("{CONFIG_PATH_ENV} not set, using built-in parameters");
                Ok(TopologyConfig::default())
            }
        }
    }

    /// Availability zone name for a zone suffix.
    pub fn availability_zone(&self, az: &str) -> String {
        format!("{}{}", self.region, az)
    }

    /// Check every input before anything is declared.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        for (field, cidr) in [
            ("vpc_cidr_block", &self.vpc_cidr_block),
            ("client_cidr_block", &self.client_cidr_block),
        ] {
            if cidr.trim() != cidr.as_str() {
                return Err(format!("Surrounding whitespace in {field}: '{cidr}'").into());
            }
        }
        let prefix = first_two_octets(&self.vpc_cidr_block)?;
        let vpc_cidr = Ipv4::new(&self.vpc_cidr_block)
            .map_err(|e| format!("Invalid VPC CIDR {}: {e}", self.vpc_cidr_block))?;
        Ipv4::new(&self.client_cidr_block)
            .map_err(|e| format!("Invalid client CIDR {}: {e}", self.client_cidr_block))?;

        if self.azs.is_empty() {
            return Err("At least one availability zone is required".into());
        }
        let mut seen = HashSet::new();
        for az in &self.azs {
            if az.is_empty() || az.chars().any(char::is_whitespace) {
                return Err(format!("Invalid availability zone suffix: '{az}'").into());
            }
            if !seen.insert(az.as_str()) {
                return Err(format!("Duplicate availability zone: {az}").into());
            }
        }

        for zone in carve_zone_subnets(&prefix, &self.azs)? {
            for cidr in zone.cidrs() {
                if !vpc_cidr.contains(&cidr)? {
                    return Err(
                        format!("Subnet {cidr} ({}) is outside VPC {vpc_cidr}", zone.az).into(),
                    );
                }
            }
        }

        for (field, arn) in [
            ("server_certificate_arn", &self.server_certificate_arn),
            ("saml_provider_arn", &self.saml_provider_arn),
            (
                "self_service_saml_provider_arn",
                &self.self_service_saml_provider_arn,
            ),
        ] {
            if !get_arn_regex().is_match(arn) {
                return Err(format!("Invalid ARN in {field}: {arn}").into());
            }
        }

        Ok(())
    }
}
