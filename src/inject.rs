use alloc::sync::Arc;
use core::{any::type_name, fmt, marker::PhantomData, panic::Location};
use tracing::error;

use crate::{
    dependency_resolver::DependencyResolver,
    registry::{Registry, WeakRegistry},
    ResolveErrorKind,
};

/// Factory parameter resolved with [`Registry::resolve`].
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        registry.resolve_from(None).map(Self)
    }
}

/// Factory parameter resolved with [`Registry::resolve_transient`].
pub struct InjectTransient<Dep>(pub Dep);

impl<Dep: 'static> DependencyResolver for InjectTransient<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        registry.resolve_transient_from(None).map(Self)
    }
}

/// Accessor that resolves a service from a registry each time it's read.
///
/// The handle doesn't keep the registry alive and doesn't cache anything:
/// a transient service gives a fresh value per [`Self::get`], a singleton gives the cached one.
///
/// # Examples
/// ```rust
/// use locator::{InjectHandle, Registry};
///
/// struct Clock(u64);
///
/// let registry = Registry::new();
/// registry.single(|| Ok(Clock(42)));
///
/// let clock = InjectHandle::<Clock>::new(&registry);
/// assert_eq!(clock.get().unwrap().0, 42);
/// ```
pub struct InjectHandle<T> {
    registry: WeakRegistry,
    location: &'static Location<'static>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> InjectHandle<T> {
    /// Binds the handle to the registry. The call site is reported in the logs of every resolution.
    #[track_caller]
    #[must_use]
    pub fn new(registry: &Registry) -> Self {
        Self {
            registry: registry.downgrade(),
            location: Location::caller(),
            _marker: PhantomData,
        }
    }

    /// Returns `false` if the bound registry has been dropped.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.registry.upgrade().is_some()
    }
}

impl<T: Send + Sync + 'static> InjectHandle<T> {
    /// Resolves the service from the bound registry.
    ///
    /// # Errors
    /// Same as [`Registry::resolve`].
    ///
    /// # Panics
    /// Panics if the bound registry has been dropped: the handle outlived the registry it was created from.
    pub fn get(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let Some(registry) = self.registry.upgrade() else {
            error!(service = type_name::<T>(), location = %self.location, "Registry is dropped");
            panic!(
                "Registry is dropped. Ensure it outlives `InjectHandle<{}>` created at {}",
                type_name::<T>(),
                self.location
            );
        };
        registry.resolve_from(Some(self.location))
    }
}

impl<T> Clone for InjectHandle<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            location: self.location,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for InjectHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectHandle")
            .field("service", &type_name::<T>())
            .field("location", &self.location)
            .field("is_bound", &self.is_bound())
            .finish()
    }
}
