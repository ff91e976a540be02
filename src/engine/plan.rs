//! In-memory resource graph.
//!
//! Records declarations in order and checks every reference points backwards,
//! so the recorded order is always a valid apply order.

use super::{DeclareError, Provisioner, ResourceHandle};
use crate::models::{Output, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;

/// One recorded declaration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeclaredResource {
    pub name: String,
    #[serde(flatten)]
    pub resource: Resource,
}

/// Ordered resource graph plus named exports.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Plan {
    pub resources: Vec<DeclaredResource>,
    pub exports: BTreeMap<String, Output>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Plan {
    pub fn new() -> Plan {
        Plan::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.index.get(name).map(|&i| &self.resources[i].resource)
    }

    /// All declarations of one kind, in declaration order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &DeclaredResource> {
        self.resources
            .iter()
            .filter(move |d| d.resource.kind() == kind)
    }

    /// Resolve an output to a concrete value when it is known before apply.
    pub fn resolve(&self, output: &Output) -> Option<String> {
        match output {
            Output::Literal(value) => Some(value.clone()),
            Output::Attribute {
                resource,
                attribute,
            } => {
                let value = self.get(resource)?.known_attribute(attribute);
                log::trace!("resolve {output} => {value:?}");
                value
            }
        }
    }

    /// Pretty JSON of resources and exports.
    pub fn to_json(&self) -> Result<String, Box<dyn Error>> {
        serde_json::to_string_pretty(self)
            .map_err(|e| format!("Error serializing plan: {e}").into())
    }

    /// Load a plan from JSON, rebuilding the name index.
    pub fn from_json(json: &str) -> Result<Plan, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let mut plan: Plan = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing plan JSON: path={} error={}", e.path(), e))?;
        plan.index = plan
            .resources
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        if plan.index.len() != plan.resources.len() {
            return Err("Plan JSON contains duplicate resource names".into());
        }
        Ok(plan)
    }
}

impl Provisioner for Plan {
    fn declare(&mut self, name: &str, resource: Resource) -> Result<ResourceHandle, DeclareError> {
        if self.index.contains_key(name) {
            return Err(DeclareError::DuplicateName(name.to_string()));
        }
        if let Some(missing) = resource
            .inputs()
            .into_iter()
            .filter_map(|o| o.dependency())
            .find(|dep| !self.index.contains_key(*dep))
        {
            return Err(DeclareError::UnknownReference {
                resource: name.to_string(),
                missing: missing.to_string(),
            });
        }

        let kind = resource.kind();
        log::debug!("declare {kind} '{name}'");
        self.index.insert(name.to_string(), self.resources.len());
        self.resources.push(DeclaredResource {
            name: name.to_string(),
            resource,
        });
        Ok(ResourceHandle::new(name, kind))
    }

    fn export(&mut self, name: &str, value: Output) -> Result<(), DeclareError> {
        if self.exports.contains_key(name) {
            return Err(DeclareError::DuplicateExport(name.to_string()));
        }
        if let Some(missing) = value.dependency().filter(|d| !self.index.contains_key(*d)) {
            return Err(DeclareError::UnknownExportReference {
                export: name.to_string(),
                missing: missing.to_string(),
            });
        }
        log::debug!("export {name} = {value}");
        self.exports.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{name_tag, Ipv4};

    fn vpc() -> Resource {
        Resource::Vpc {
            cidr_block: Ipv4::new("172.16.0.0/16").unwrap(),
            instance_tenancy: "default".to_string(),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            tags: name_tag("test-vpc"),
        }
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut plan = Plan::new();
        let vpc = plan.declare("test-vpc", vpc()).unwrap();
        let igw = plan
            .declare(
                "test-igw",
                Resource::InternetGateway {
                    vpc_id: vpc.id(),
                    tags: name_tag("test-igw"),
                },
            )
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(igw.kind(), ResourceKind::InternetGateway);
        assert_eq!(
            plan.resolve(&vpc.attr("cidr_block")),
            Some("172.16.0.0/16".to_string())
        );
        assert_eq!(plan.resolve(&vpc.id()), None);
        assert_eq!(plan.resolve(&Output::literal("x")), Some("x".to_string()));
    }

    #[test]
    fn test_duplicate_name() {
        let mut plan = Plan::new();
        plan.declare("test-vpc", vpc()).unwrap();
        assert_eq!(
            plan.declare("test-vpc", vpc()).unwrap_err(),
            DeclareError::DuplicateName("test-vpc".to_string())
        );
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_unknown_reference() {
        let mut plan = Plan::new();
        let ghost = ResourceHandle::new("ghost-vpc", ResourceKind::Vpc);
        let err = plan
            .declare(
                "igw",
                Resource::InternetGateway {
                    vpc_id: ghost.id(),
                    tags: name_tag("igw"),
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            DeclareError::UnknownReference {
                resource: "igw".to_string(),
                missing: "ghost-vpc".to_string()
            }
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_exports() {
        let mut plan = Plan::new();
        let vpc = plan.declare("test-vpc", vpc()).unwrap();
        plan.export("vpcId", vpc.id()).unwrap();
        assert_eq!(
            plan.export("vpcId", vpc.id()).unwrap_err(),
            DeclareError::DuplicateExport("vpcId".to_string())
        );
        let ghost = ResourceHandle::new("ghost", ResourceKind::Instance);
        assert!(matches!(
            plan.export("ghostId", ghost.id()),
            Err(DeclareError::UnknownExportReference { .. })
        ));
        assert_eq!(plan.exports.len(), 1);
    }

    #[test]
    fn test_json_round_trip_keeps_index() {
        let mut plan = Plan::new();
        let vpc = plan.declare("test-vpc", vpc()).unwrap();
        plan.export("vpcId", vpc.id()).unwrap();
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"type\": \"vpc\""));

        let loaded = Plan::from_json(&json).unwrap();
        assert_eq!(loaded.resources, plan.resources);
        assert!(loaded.get("test-vpc").is_some());
    }

    #[test]
    fn test_from_json_reports_path() {
        let err = Plan::from_json(r#"{"resources": [{"name": "x", "type": "vpc"}], "exports": {}}"#)
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Error parsing plan JSON"), "{err}");
    }
}
