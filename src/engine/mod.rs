//! Provisioning engine interface.
//!
//! This module holds the seam between the topology builder and whatever applies it:
//! - [`Provisioner`] - declare-by-name and export interface
//! - [`ResourceHandle`] - opaque handle returned for each declaration
//! - [`Plan`] - in-memory resource graph implementing [`Provisioner`]

mod plan;

use crate::models::{Output, Resource, ResourceKind};

pub use plan::{DeclaredResource, Plan};

/// Errors raised while declaring resources or exports.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeclareError {
    #[error("resource name already declared: {0}")]
    DuplicateName(String),

    #[error("resource '{resource}' references undeclared resource '{missing}'")]
    UnknownReference { resource: String, missing: String },

    #[error("export already defined: {0}")]
    DuplicateExport(String),

    #[error("export '{export}' references undeclared resource '{missing}'")]
    UnknownExportReference { export: String, missing: String },
}

/// Handle to a declared resource, usable as input to later declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    name: String,
    kind: ResourceKind,
}

impl ResourceHandle {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> ResourceHandle {
        ResourceHandle {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Reference to an attribute of this resource.
    pub fn attr(&self, attribute: &str) -> Output {
        Output::Attribute {
            resource: self.name.clone(),
            attribute: attribute.to_string(),
        }
    }

    /// Reference to the provider-assigned identifier.
    pub fn id(&self) -> Output {
        self.attr("id")
    }
}

/// Declarative provisioning interface.
///
/// Implementations record or apply each declaration; ordering and retries of
/// remote calls belong to the implementation, not the caller.
pub trait Provisioner {
    /// Declare a resource under a unique logical name.
    fn declare(&mut self, name: &str, resource: Resource) -> Result<ResourceHandle, DeclareError>;

    /// Publish a named stack output.
    fn export(&mut self, name: &str, value: Output) -> Result<(), DeclareError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_refs() {
        let h = ResourceHandle::new("blog-vpc", ResourceKind::Vpc);
        assert_eq!(
            h.id(),
            Output::Attribute {
                resource: "blog-vpc".to_string(),
                attribute: "id".to_string()
            }
        );
        assert_eq!(h.attr("cidr_block").dependency(), Some("blog-vpc"));
        assert_eq!(h.kind(), ResourceKind::Vpc);
    }

    #[test]
    fn test_error_messages() {
        let e = DeclareError::UnknownReference {
            resource: "igw".to_string(),
            missing: "vpc".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "resource 'igw' references undeclared resource 'vpc'"
        );
    }
}
