use alloc::{boxed::Box, sync::Arc};
use core::any::Any;
use tracing::debug;

use super::{
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    service::{service_fn, SharedService},
};
use crate::Registry;

/// Factory logic of a service.
///
/// Implemented for every `Fn(Deps...) -> Result<T, E>` closure whose parameters are [`DependencyResolver`]s.
/// The factory may be called from several threads at once, so it must be [`Fn`], [`Send`] and [`Sync`].
pub trait Instantiator<Deps>: Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;

pub(crate) type BoxedInstantiator<Response> =
    SharedService<Registry, Response, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>;

/// Produces a fresh owned value on every call.
pub(crate) type TransientInstantiator = BoxedInstantiator<Box<dyn Any>>;

/// Produces the shared value of a singleton, called at most once per successful materialization.
pub(crate) type SingletonInstantiator = BoxedInstantiator<RcAny>;

fn instantiate<Inst, Deps>(
    instantiator: &Inst,
    registry: &Registry,
) -> Result<Inst::Provides, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver,
{
    let dependencies = match Deps::resolve(registry) {
        Ok(dependencies) => dependencies,
        Err(err) => return Err(InstantiatorErrorKind::Deps(err.into())),
    };
    let dependency = match instantiator.instantiate(dependencies) {
        Ok(dependency) => dependency,
        Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
    };

    debug!("Instantiated");

    Ok(dependency)
}

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> TransientInstantiator
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver + 'static,
{
    SharedService::new(service_fn(move |registry: Registry| {
        instantiate(&instantiator, &registry).map(|dependency| Box::new(dependency) as Box<dyn Any>)
    }))
}

#[must_use]
pub(crate) fn boxed_singleton_instantiator<Inst, Deps>(instantiator: Inst) -> SingletonInstantiator
where
    Inst: Instantiator<Deps>,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver + 'static,
{
    SharedService::new(service_fn(move |registry: Registry| {
        instantiate(&instantiator, &registry).map(|dependency| Arc::new(dependency) as RcAny)
    }))
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Result<Response, Err> + Send + Sync + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

/// Wrapper to create an instantiator that just returns a clone of passed value.
/// It can be used when the value was created outside the registry.
/// To share one value instead of cloning it, use [`Registry::instance`].
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok::<_, InstantiateErrorKind>(val.clone())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_instantiator, boxed_singleton_instantiator, instance, InstantiateErrorKind, Instantiator};
    use crate::{
        errors::{InstantiatorErrorKind, ResolveErrorKind},
        inject::{Inject, InjectTransient},
        service::Service as _,
        Registry,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use tracing_test::traced_test;

    use crate::utils::AtomicCounter;

    #[derive(Clone)]
    struct DatabaseUrl(String);
    struct Pool {
        url: String,
    }
    struct Session {
        pool: Arc<Pool>,
        id: i64,
    }

    fn accepts<Deps, Inst: Instantiator<Deps>>(_instantiator: Inst)
    where
        Deps: crate::DependencyResolver,
    {
    }

    #[test]
    fn test_closures_are_instantiators() {
        accepts(|| Ok::<_, InstantiateErrorKind>(0u8));
        accepts(|_: Registry| Ok::<_, InstantiateErrorKind>(0u8));
        accepts(|Inject(pool): Inject<Pool>, InjectTransient(id): InjectTransient<i64>| {
            Ok::<_, InstantiateErrorKind>(Session { pool, id })
        });
        accepts(instance(DatabaseUrl::default_url()));
    }

    impl DatabaseUrl {
        fn default_url() -> Self {
            Self("postgres://localhost".to_string())
        }
    }

    #[test]
    #[traced_test]
    fn test_transient_instantiator_calls_dependencies_every_time() {
        let ids = Arc::new(AtomicCounter::new(0));

        let registry = Registry::new();
        registry
            .instance(Pool {
                url: "postgres://localhost".to_string(),
            })
            .factory({
                let ids = ids.clone();
                move || Ok(ids.increment())
            });

        let session = boxed_instantiator(|Inject(pool): Inject<Pool>, InjectTransient(id): InjectTransient<i64>| {
            Ok::<_, InstantiateErrorKind>(Session { pool, id })
        });

        let first = session.call(registry.clone()).unwrap().downcast::<Session>().unwrap();
        let second = session.call(registry).unwrap().downcast::<Session>().unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert!(Arc::ptr_eq(&first.pool, &second.pool));
        assert_eq!(first.pool.url, "postgres://localhost");
        assert_eq!(ids.get(), 2);
    }

    #[test]
    #[traced_test]
    fn test_singleton_instantiator_does_not_cache() {
        let pools = Arc::new(AtomicCounter::new(0));

        let registry = Registry::new();
        registry.instance(DatabaseUrl::default_url());

        let pool = boxed_singleton_instantiator({
            let pools = pools.clone();
            move |Inject(url): Inject<DatabaseUrl>| {
                pools.increment();
                Ok::<_, InstantiateErrorKind>(Pool { url: url.0.clone() })
            }
        });

        let first = pool.call(registry.clone()).unwrap();
        let second = pool.call(registry).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.downcast::<Pool>().unwrap().url, "postgres://localhost");
        // Caching is the registry's job
        assert_eq!(pools.get(), 2);
    }

    #[test]
    #[traced_test]
    fn test_instance_clones_value() {
        let registry = Registry::new();
        let url = boxed_instantiator(instance(DatabaseUrl::default_url()));

        let value = url.call(registry).unwrap().downcast::<DatabaseUrl>().unwrap();
        assert_eq!(value.0, "postgres://localhost");
    }

    #[test]
    #[traced_test]
    fn test_instantiator_errors() {
        let registry = Registry::new();

        let missing_dependency = boxed_instantiator(|Inject(url): Inject<DatabaseUrl>| Ok::<_, InstantiateErrorKind>(Pool { url: url.0.clone() }));
        assert!(matches!(
            missing_dependency.call(registry.clone()),
            Err(InstantiatorErrorKind::Deps(ResolveErrorKind::NoFactory { .. }))
        ));

        let failed_factory = boxed_instantiator(|| Err::<Pool, _>(InstantiateErrorKind::from(anyhow::anyhow!("connection refused"))));
        let Err(InstantiatorErrorKind::Factory(err)) = failed_factory.call(registry) else {
            panic!("factory error expected");
        };
        assert_eq!(err.to_string(), "connection refused");
    }
}
