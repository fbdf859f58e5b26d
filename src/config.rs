/// Config for a registry
/// ## Fields
/// - `materialize_on_register`:
///   If `true`, a singleton is constructed as soon as it is registered instead of waiting
///   for [`crate::Registry::build`] or its first resolution.
///
///   The factory can only resolve services registered before it.
///   A failed construction is logged and the singleton stays pending,
///   so the error is returned again by the next resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub materialize_on_register: bool,
}
