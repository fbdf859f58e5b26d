use alloc::sync::Arc;
use core::{any::type_name, panic::Location};
use tracing::{debug, info_span};

use crate::{
    config::Config,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, ResolveErrorKind},
    instantiator::Instantiator,
    registry::Registry,
};

/// A named group of registrations.
///
/// Implement it for a type to group the services of one feature, or pass a closure
/// `Fn(&Registrar)`. Modules can apply nested modules through [`Registrar::module`].
///
/// # Examples
/// ```rust
/// use locator::{Inject, Module, Registrar, Registry};
///
/// struct Config(&'static str);
/// struct Client(std::sync::Arc<Config>);
///
/// struct NetworkModule;
///
/// impl Module for NetworkModule {
///     fn configure(&self, registrar: &Registrar) {
///         registrar
///             .single(|| Ok(Config("localhost")))
///             .factory(|Inject(config): Inject<Config>| Ok(Client(config)));
///     }
/// }
///
/// let registry = Registry::new();
/// registry.module(NetworkModule);
///
/// assert_eq!(registry.resolve::<Client>().unwrap().0 .0, "localhost");
/// ```
pub trait Module {
    fn configure(&self, registrar: &Registrar);

    #[must_use]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F> Module for F
where
    F: Fn(&Registrar),
{
    #[inline]
    fn configure(&self, registrar: &Registrar) {
        self(registrar);
    }
}

/// The registry a module is bound to while it's being applied.
///
/// Every method forwards to the bound [`Registry`].
pub struct Registrar {
    registry: Registry,
}

impl Registrar {
    #[inline]
    #[must_use]
    pub(crate) fn new(registry: &Registry) -> Self {
        Self {
            registry: registry.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// See [`Registry::factory`].
    ///
    /// # Panics
    /// Panics if the service is already registered.
    #[track_caller]
    pub fn factory<Inst, Deps>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver<Error = ResolveErrorKind> + 'static,
    {
        self.registry.factory(instantiator);
        self
    }

    /// See [`Registry::single`].
    ///
    /// # Panics
    /// Panics if the service is already registered.
    #[track_caller]
    pub fn single<Inst, Deps>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind> + 'static,
    {
        self.registry.single(instantiator);
        self
    }

    /// See [`Registry::instance`].
    ///
    /// # Panics
    /// Panics if the service is already registered.
    #[track_caller]
    pub fn instance<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        self.registry.instance(value);
        self
    }

    /// See [`Registry::resolve`].
    ///
    /// # Errors
    /// Same as [`Registry::resolve`].
    #[track_caller]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.registry.resolve_from(Some(Location::caller()))
    }

    /// See [`Registry::resolve_transient`].
    ///
    /// # Errors
    /// Same as [`Registry::resolve_transient`].
    #[track_caller]
    pub fn resolve_transient<T: 'static>(&self) -> Result<T, ResolveErrorKind> {
        self.registry.resolve_transient_from(Some(Location::caller()))
    }

    /// Applies a nested module to the same registry.
    pub fn module<M: Module>(&self, module: M) -> &Self {
        self.registry.module(module);
        self
    }
}

/// Creates a registry and applies the root module to it.
///
/// Singletons aren't built, call [`Registry::build`] to construct them before the application runs.
#[must_use]
pub fn start<M: Module>(module: M) -> Registry {
    start_with_config(Config::default(), module)
}

/// Same as [`start`], with a custom registry config.
#[must_use]
pub fn start_with_config<M: Module>(config: Config, module: M) -> Registry {
    let span = info_span!("start", module = module.name());
    let _guard = span.enter();

    let registry = Registry::with_config(config);
    registry.module(module);

    debug!(services = registry.len(), "Registry started");
    registry
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{start, start_with_config, Module, Registrar};
    use crate::{
        config::Config,
        inject::{Inject, InjectTransient},
        registry::Registry,
        utils::AtomicCounter,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
        vec::Vec,
    };
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    struct Database(&'static str);
    struct UserRepo(Arc<Database>);
    struct UserService(Arc<UserRepo>);
    struct RequestId(u64);

    struct StorageModule;

    impl Module for StorageModule {
        fn configure(&self, registrar: &Registrar) {
            registrar
                .single(|| Ok(Database("postgres")))
                .single(|Inject(db): Inject<Database>| Ok(UserRepo(db)));
        }
    }

    struct AppModule;

    impl Module for AppModule {
        fn configure(&self, registrar: &Registrar) {
            registrar
                .module(StorageModule)
                .factory(|Inject(repo): Inject<UserRepo>| Ok(UserService(repo)));
        }

        fn name(&self) -> &'static str {
            "app"
        }
    }

    #[test]
    #[traced_test]
    fn test_nested_modules() {
        let registry = start(AppModule);
        assert_eq!(registry.len(), 3);

        registry.build().unwrap();

        let service_1 = registry.resolve::<UserService>().unwrap();
        let service_2 = registry.resolve::<UserService>().unwrap();

        assert!(!Arc::ptr_eq(&service_1, &service_2));
        assert!(Arc::ptr_eq(&service_1.0, &service_2.0));
        assert_eq!(service_1.0 .0 .0, "postgres");
        assert!(logs_contain("Module applied"));
    }

    #[test]
    #[traced_test]
    fn test_closure_module() {
        let registry = Registry::new();
        registry.module(|registrar: &Registrar| {
            registrar.instance(Database("sqlite"));
            registrar.module(|registrar: &Registrar| {
                registrar.single(|Inject(db): Inject<Database>| Ok(UserRepo(db)));
            });
        });

        assert_eq!(registry.resolve::<UserRepo>().unwrap().0 .0, "sqlite");
    }

    #[test]
    #[traced_test]
    fn test_module_resolves_registered_services() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let registry = start({
            let seen = seen.clone();
            move |registrar: &Registrar| {
                registrar.instance(Database("primary"));
                let db = registrar.resolve::<Database>().unwrap();
                seen.lock().push(db.0);

                assert!(registrar.resolve::<UserRepo>().is_err());
            }
        });

        assert_eq!(*seen.lock(), vec!["primary"]);
        assert!(Arc::ptr_eq(
            &registry.resolve::<Database>().unwrap(),
            &registry.resolve::<Database>().unwrap()
        ));
    }

    #[test]
    #[traced_test]
    fn test_registrar_is_bound_to_applying_registry() {
        let first = Registry::new();
        let second = Registry::new();

        let module = |registrar: &Registrar| {
            registrar.factory(|| Ok(RequestId(7)));
        };
        first.module(module);
        second.module(module);

        assert_eq!(first.resolve_transient::<RequestId>().unwrap().0, 7);
        assert_eq!(second.resolve_transient::<RequestId>().unwrap().0, 7);
    }

    #[test]
    #[traced_test]
    fn test_start_with_config_materializes_on_register() {
        let constructed = Arc::new(AtomicCounter::new(0));

        let registry = start_with_config(Config { materialize_on_register: true }, {
            let constructed = constructed.clone();
            move |registrar: &Registrar| {
                let constructed = constructed.clone();
                registrar.single(move || {
                    constructed.increment();
                    Ok(Database("eager"))
                });
            }
        });

        assert_eq!(constructed.get(), 1);
        registry.build().unwrap();
        let _ = registry.resolve::<Database>().unwrap();
        assert_eq!(constructed.get(), 1);
    }

    #[test]
    #[traced_test]
    fn test_transient_through_module() {
        let registry = start(|registrar: &Registrar| {
            registrar
                .factory(|| Ok(RequestId(1)))
                .factory(|InjectTransient(RequestId(id)): InjectTransient<RequestId>| Ok(format!("request-{id}")));
        });

        assert_eq!(registry.resolve_transient::<String>().unwrap(), "request-1");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_across_modules() {
        let registry = Registry::new();
        registry.module(StorageModule);
        registry.module(StorageModule);
    }
}
