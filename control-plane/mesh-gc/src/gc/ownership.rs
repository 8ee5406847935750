use kube::core::DynamicObject;

use crate::config::types::MANAGED_BY_KEY;
use crate::error::Error;
use crate::store::{ObjectKey, ResourceKind};

/// Label pair marking an object as created by a particular controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribution {
    pub key: String,
    pub value: String,
}

impl Attribution {
    /// `app.kubernetes.io/managed-by=<value>`
    pub fn managed_by(value: impl Into<String>) -> Self {
        Self {
            key: MANAGED_BY_KEY.to_string(),
            value: value.into(),
        }
    }

    /// Read this attribution's label from a fetched object. Objects without
    /// a name did not come back as proper API objects and are rejected.
    pub fn actual<'a>(
        &self,
        obj: &'a DynamicObject,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<Option<&'a str>, Error> {
        if obj.metadata.name.is_none() {
            return Err(Error::MissingMetadata {
                kind,
                key: key.clone(),
            });
        }
        Ok(obj
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(&self.key))
            .map(String::as_str))
    }
}

/// Exact match only; a missing label never matches.
pub fn ownership_matches(expected: &Attribution, actual: Option<&str>) -> bool {
    actual == Some(expected.value.as_str())
}
