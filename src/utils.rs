mod counter;

pub use counter::AtomicCounter;
