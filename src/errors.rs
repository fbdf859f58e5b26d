mod dependency_resolver;
mod instantiate;
mod instantiator;

pub use dependency_resolver::ResolveErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;

/// Result returned by factories.
pub type InstantiatorResult<T, E = InstantiateErrorKind> = Result<T, E>;
