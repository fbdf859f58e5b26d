use alloc::{
    collections::BTreeMap,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::{
    any::type_name,
    fmt::{self, Debug, Formatter},
    panic::Location,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, debug_span, error, field, warn};

use crate::{
    config::Config,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, ResolveErrorKind},
    instantiator::{boxed_instantiator, boxed_singleton_instantiator, Instantiator, RcAny, SingletonInstantiator, TransientInstantiator},
    key::ServiceKey,
    module::{Module, Registrar},
    service::Service as _,
};

/// Thread-safe map from service keys to their factories and materialized singletons.
///
/// `Registry` is a cheap handle, clones share the same entries.
/// The entries are dropped when the last handle is dropped.
///
/// # Singletons resolved before [`Self::build`]
/// A singleton which isn't built yet is materialized on its first resolution and cached.
/// [`Self::build`] skips it later. Resolution never fails because a singleton isn't built.
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

/// Non-owning reference to a [`Registry`].
#[derive(Clone, Default)]
pub struct WeakRegistry {
    inner: Weak<RegistryInner>,
}

impl WeakRegistry {
    /// Returns the registry if at least one [`Registry`] handle is still alive.
    #[inline]
    #[must_use]
    pub fn upgrade(&self) -> Option<Registry> {
        self.inner.upgrade().map(|inner| Registry { inner })
    }
}

pub(crate) struct RegistryInner {
    state: RwLock<State>,
    config: Config,
}

struct State {
    entries: BTreeMap<ServiceKey, Entry>,
    next_order: u64,
}

impl State {
    const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_order: 0,
        }
    }
}

#[derive(Clone)]
enum Entry {
    Transient(TransientInstantiator),
    Singleton(Arc<SingletonSlot>),
}

enum SlotState {
    Pending(SingletonInstantiator),
    Materialized(RcAny),
}

/// Singleton storage with its own init guard, so construction is serialized per key
/// and never under the entries lock.
struct SingletonSlot {
    order: u64,
    init: Mutex<()>,
    state: RwLock<SlotState>,
}

impl SingletonSlot {
    fn pending(order: u64, instantiator: SingletonInstantiator) -> Self {
        Self {
            order,
            init: Mutex::new(()),
            state: RwLock::new(SlotState::Pending(instantiator)),
        }
    }

    fn materialized(order: u64, value: RcAny) -> Self {
        Self {
            order,
            init: Mutex::new(()),
            state: RwLock::new(SlotState::Materialized(value)),
        }
    }

    fn get(&self) -> Option<RcAny> {
        match &*self.state.read() {
            SlotState::Materialized(value) => Some(value.clone()),
            SlotState::Pending(_) => None,
        }
    }

    fn is_materialized(&self) -> bool {
        matches!(&*self.state.read(), SlotState::Materialized(_))
    }

    /// Returns the cached value or constructs it.
    /// Concurrent callers wait on the init guard and get the value committed by the first one.
    fn get_or_materialize(&self, registry: &Registry) -> Result<RcAny, ResolveErrorKind> {
        if let Some(value) = self.get() {
            debug!("Found materialized");
            return Ok(value);
        }

        let _init = self.init.lock();
        let instantiator = match &*self.state.read() {
            SlotState::Materialized(value) => {
                debug!("Materialized by another resolver");
                return Ok(value.clone());
            }
            SlotState::Pending(instantiator) => instantiator.clone(),
        };

        match instantiator.call(registry.clone()) {
            Ok(value) => {
                *self.state.write() = SlotState::Materialized(value.clone());
                debug!("Materialized");
                Ok(value)
            }
            Err(err) => {
                let err = ResolveErrorKind::from(err);
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: RwLock::new(State::new()),
                config,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    #[inline]
    #[must_use]
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Registers a transient service: the factory is called on every resolution and its result is never cached.
    ///
    /// # Panics
    /// Panics if the service is already registered in this registry, with any lifecycle.
    #[track_caller]
    pub fn factory<Inst, Deps>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver<Error = ResolveErrorKind> + 'static,
    {
        let key = ServiceKey::of::<Inst::Provides>();
        self.insert(key, "factory", |_| Entry::Transient(boxed_instantiator(instantiator)));
        debug!(service = key.name(), "Transient registered");
        self
    }

    /// Registers a singleton service: the factory is called once, by [`Self::build`] or by the first resolution,
    /// whichever comes first. The value is cached and shared by all resolutions.
    ///
    /// # Panics
    /// Panics if the service is already registered in this registry, with any lifecycle.
    #[track_caller]
    pub fn single<Inst, Deps>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind> + 'static,
    {
        let key = ServiceKey::of::<Inst::Provides>();
        let slot = self.insert(key, "single", |order| {
            Entry::Singleton(Arc::new(SingletonSlot::pending(order, boxed_singleton_instantiator(instantiator))))
        });
        debug!(service = key.name(), "Singleton registered");

        if self.inner.config.materialize_on_register {
            if let Entry::Singleton(slot) = slot {
                let span = debug_span!("materialize_on_register", service = key.name());
                let _guard = span.enter();

                if let Err(err) = slot.get_or_materialize(self) {
                    warn!(%err, "Singleton stays pending");
                }
            }
        }
        self
    }

    /// Registers an already constructed value as a materialized singleton.
    ///
    /// # Panics
    /// Panics if the service is already registered in this registry, with any lifecycle.
    #[track_caller]
    pub fn instance<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        let key = ServiceKey::of::<T>();
        let value: RcAny = Arc::new(value);
        self.insert(key, "instance", |order| Entry::Singleton(Arc::new(SingletonSlot::materialized(order, value))));
        debug!(service = key.name(), "Instance registered");
        self
    }

    /// Applies a module to this registry.
    /// The module registers its services and nested modules through the passed [`Registrar`].
    pub fn module<M: Module>(&self, module: M) -> &Self {
        let span = debug_span!("module", name = module.name());
        let _guard = span.enter();

        module.configure(&Registrar::new(self));
        debug!("Module applied");
        self
    }

    /// Materializes all pending singletons in their registration order.
    ///
    /// Singletons already materialized, by a previous call or by a resolution, are skipped,
    /// so calling it several times is harmless.
    ///
    /// # Errors
    /// Returns the error of the first singleton that fails to build.
    /// It stays pending, as do the singletons registered after it.
    pub fn build(&self) -> Result<(), ResolveErrorKind> {
        let span = debug_span!("build");
        let _guard = span.enter();

        let mut slots: Vec<(ServiceKey, Arc<SingletonSlot>)> = self
            .inner
            .state
            .read()
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Singleton(slot) => Some((*key, slot.clone())),
                Entry::Transient(_) => None,
            })
            .collect();
        slots.sort_unstable_by_key(|(_, slot)| slot.order);

        let mut built = 0usize;
        for (key, slot) in slots {
            let span = debug_span!("build_singleton", service = key.name(), order = slot.order);
            let _guard = span.enter();

            if slot.is_materialized() {
                debug!("Already materialized");
                continue;
            }
            slot.get_or_materialize(self)?;
            built += 1;
        }

        debug!(built, "Built");
        Ok(())
    }

    /// Resolves a service.
    ///
    /// - Singleton: returns the cached value, materializing it first if needed.
    ///   Concurrent first resolutions wait for a single construction and share its result.
    /// - Transient: calls the factory and returns its fresh value.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoFactory`] if the service isn't registered
    /// - Returns [`ResolveErrorKind::Instantiator`] if the factory or one of its dependencies fails
    #[track_caller]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_from::<T>(Some(Location::caller()))
    }

    /// Resolves an owned value of a transient service.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoFactory`] if the service isn't registered
    /// - Returns [`ResolveErrorKind::NotTransient`] if the service is a singleton
    /// - Returns [`ResolveErrorKind::Instantiator`] if the factory or one of its dependencies fails
    #[track_caller]
    pub fn resolve_transient<T: 'static>(&self) -> Result<T, ResolveErrorKind> {
        self.resolve_transient_from::<T>(Some(Location::caller()))
    }

    #[inline]
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.state.read().entries.contains_key(&ServiceKey::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.read().entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.read().entries.is_empty()
    }

    /// Removes all entries and returns the registry to its initial state.
    ///
    /// # Warning
    /// Resolutions that are in flight finish with the entries they already hold,
    /// their results are not visible through the registry after reset.
    pub fn reset(&self) {
        let previous = core::mem::replace(&mut *self.inner.state.write(), State::new());
        debug!(removed = previous.entries.len(), "Registry reset");
        // Entries may own services with their own `Drop`, don't run it under the lock
        drop(previous);
    }
}

impl Registry {
    #[track_caller]
    fn insert(&self, key: ServiceKey, operation: &'static str, entry: impl FnOnce(u64) -> Entry) -> Entry {
        let mut state = self.inner.state.write();
        if state.entries.contains_key(&key) {
            drop(state);
            error!(service = key.name(), operation, "Duplicate registration");
            panic!("[{operation}] Factory for {key} already registered");
        }

        let order = state.next_order;
        state.next_order += 1;

        let entry = entry(order);
        state.entries.insert(key, entry.clone());
        entry
    }

    fn entry(&self, key: &ServiceKey) -> Option<Entry> {
        self.inner.state.read().entries.get(key).cloned()
    }

    pub(crate) fn resolve_from<T: Send + Sync + 'static>(
        &self,
        caller: Option<&'static Location<'static>>,
    ) -> Result<Arc<T>, ResolveErrorKind> {
        let key = ServiceKey::of::<T>();
        let span = debug_span!("resolve", service = key.name(), caller = field::Empty);
        if let Some(caller) = caller {
            span.record("caller", field::display(caller));
        }
        let _guard = span.enter();

        let Some(entry) = self.entry(&key) else {
            let err = ResolveErrorKind::NoFactory { key };
            warn!("{}", err);
            return Err(err);
        };

        match entry {
            Entry::Singleton(slot) => slot.get_or_materialize(self)?.downcast::<T>().map_err(|value| {
                let err = ResolveErrorKind::IncorrectType {
                    expected: key,
                    actual: (*value).type_id(),
                };
                error!("{}", err);
                err
            }),
            Entry::Transient(instantiator) => self.call_transient::<T>(&key, &instantiator).map(Arc::new),
        }
    }

    pub(crate) fn resolve_transient_from<T: 'static>(&self, caller: Option<&'static Location<'static>>) -> Result<T, ResolveErrorKind> {
        let key = ServiceKey::of::<T>();
        let span = debug_span!("resolve_transient", service = key.name(), caller = field::Empty);
        if let Some(caller) = caller {
            span.record("caller", field::display(caller));
        }
        let _guard = span.enter();

        match self.entry(&key) {
            Some(Entry::Transient(instantiator)) => self.call_transient::<T>(&key, &instantiator),
            Some(Entry::Singleton(_)) => {
                let err = ResolveErrorKind::NotTransient { key };
                error!("{}", err);
                Err(err)
            }
            None => {
                let err = ResolveErrorKind::NoFactory { key };
                warn!("{}", err);
                Err(err)
            }
        }
    }

    fn call_transient<T: 'static>(&self, key: &ServiceKey, instantiator: &TransientInstantiator) -> Result<T, ResolveErrorKind> {
        match instantiator.call(self.clone()) {
            Ok(dependency) => match dependency.downcast::<T>() {
                Ok(dependency) => Ok(*dependency),
                Err(incorrect_type) => {
                    let err = ResolveErrorKind::IncorrectType {
                        expected: *key,
                        actual: (*incorrect_type).type_id(),
                    };
                    error!("{}", err);
                    Err(err)
                }
            },
            Err(err) => {
                let err = ResolveErrorKind::from(err);
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct(type_name::<Self>())
            .field("entries", &state.entries.keys().map(ServiceKey::short_name).collect::<Vec<_>>())
            .field("config", &self.inner.config)
            .finish()
    }
}
