use crate::store::{ObjectKey, ResourceKind};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{kind} {key} not found")]
    NotFound { kind: ResourceKind, key: ObjectKey },

    #[error("conflict writing {kind} {key}: object was modified")]
    Conflict { kind: ResourceKind, key: ObjectKey },

    #[error("failed to get object metadata for {kind} {key}")]
    MissingMetadata { kind: ResourceKind, key: ObjectKey },

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Classify a kube client error for the object it was issued against.
    pub fn from_kube(err: kube::Error, kind: ResourceKind, key: &ObjectKey) -> Self {
        if let kube::Error::Api(ae) = &err {
            match ae.code {
                404 => {
                    return Error::NotFound {
                        kind,
                        key: key.clone(),
                    };
                }
                409 => {
                    return Error::Conflict {
                        kind,
                        key: key.clone(),
                    };
                }
                _ => {}
            }
        }
        Error::Kube(err)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
