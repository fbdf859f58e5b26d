#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod config;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod module;
pub(crate) mod registry;
pub(crate) mod service;

pub mod utils;

pub use config::Config;
pub use dependency_resolver::DependencyResolver;
pub use errors::{InstantiateErrorKind, InstantiatorErrorKind, InstantiatorResult, ResolveErrorKind};
pub use inject::{Inject, InjectHandle, InjectTransient};
pub use instantiator::{instance, Instantiator};
pub use key::ServiceKey;
pub use module::{start, start_with_config, Module, Registrar};
pub use registry::{Registry, WeakRegistry};
