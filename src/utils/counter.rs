use parking_lot::Mutex;

/// Lock-protected integer for counting constructions across threads.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: Mutex<i64>,
}

impl AtomicCounter {
    #[inline]
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value: Mutex::new(value) }
    }

    /// Returns the value after increment.
    #[inline]
    pub fn increment(&self) -> i64 {
        let mut value = self.value.lock();
        *value += 1;
        *value
    }

    /// Returns the value after decrement.
    #[inline]
    pub fn decrement(&self) -> i64 {
        let mut value = self.value.lock();
        *value -= 1;
        *value
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> i64 {
        *self.value.lock()
    }

    #[inline]
    pub fn set(&self, value: i64) {
        *self.value.lock() = value;
    }
}
