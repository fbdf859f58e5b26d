use alloc::boxed::Box;
use core::any::TypeId;

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::key::ServiceKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No registered factory for {key}")]
    NoFactory { key: ServiceKey },
    #[error("{key} is registered as a singleton, so it can't be resolved as an owned transient value")]
    NotTransient { key: ServiceKey },
    #[error("Incorrect factory provides type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: ServiceKey, actual: TypeId },
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}

impl ResolveErrorKind {
    /// Key of the missing service, if the error is caused by a missing registration
    /// of the requested service itself (not one of its dependencies).
    #[must_use]
    pub const fn missing_key(&self) -> Option<&ServiceKey> {
        match self {
            Self::NoFactory { key } => Some(key),
            _ => None,
        }
    }
}

impl From<InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>> for ResolveErrorKind {
    fn from(err: InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>) -> Self {
        match err {
            InstantiatorErrorKind::Deps(err) => Self::Instantiator(InstantiatorErrorKind::Deps(Box::new(err))),
            InstantiatorErrorKind::Factory(err) => Self::Instantiator(InstantiatorErrorKind::Factory(err)),
        }
    }
}
