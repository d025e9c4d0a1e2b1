//! Registry service

mod registry;

pub use registry::Registry;
