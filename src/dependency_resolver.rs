use crate::{errors::ResolveErrorKind, registry::Registry};

/// A factory parameter resolved from the registry right before the factory is called.
///
/// Implemented for [`crate::Inject`], [`crate::InjectTransient`], [`Registry`] itself
/// and tuples of resolvers.
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(registry: &Registry) -> Result<Self, Self::Error>;
}

/// Gives the factory a handle to the registry it's resolved from.
///
/// # Warning
/// Storing the handle in a singleton creates a reference cycle and the registry is never dropped.
/// Use [`Registry::downgrade`] or [`crate::InjectHandle`] if the service needs the registry later.
impl DependencyResolver for Registry {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
        Ok(registry.clone())
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(registry: &Registry) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(registry).map_err(Into::<ResolveErrorKind>::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
