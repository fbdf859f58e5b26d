use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

/// Identity of a service contract.
///
/// Two keys are equal only if they were derived from the same type,
/// the name is a human-readable label used in logs and errors.
/// Keys are only created by [`ServiceKey::of`], so the name always belongs to the id.
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    name: &'static str,
    id: TypeId,
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl PartialOrd for ServiceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl ServiceKey {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name without its module path. Generic arguments are kept as is.
    /// Tuples, slices, arrays and references are returned unchanged.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        if self.name.starts_with(['(', '[', '&', '*']) {
            return self.name;
        }
        let path = self.name.split_once('<').map_or(self.name, |(path, _)| path);
        match path.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}
