//! Package installation inside the virtual environment
//!
//! The numeric runtime is installed through an ordered list of strategies:
//! the pinned CUDA build first, then the unpinned generic build. Manifest
//! dependencies are installed afterwards and have no fallback.

pub mod installer;
pub mod strategies;

#[cfg(test)]
mod tests;

pub use installer::{PackageInstaller, RuntimeInstall};
pub use strategies::{AcceleratedStrategy, GenericStrategy, RuntimeStrategy};

use crate::config::RuntimeConfig;

/// The default strategy list built from configuration
pub fn runtime_strategies(config: &RuntimeConfig) -> Vec<Box<dyn RuntimeStrategy>> {
    vec![
        Box::new(AcceleratedStrategy::from(&config.accelerated)),
        Box::new(GenericStrategy::from(&config.fallback)),
    ]
}
