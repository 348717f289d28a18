//! Ways of installing the numeric runtime (PyTorch)

use crate::config::{AcceleratedRuntime, FallbackRuntime};

/// Priority constants for strategies (lower number = tried first)
pub mod priority {
    /// Pinned CUDA build from the PyTorch index
    pub const ACCELERATED: u8 = 10;
    /// Whatever the default index resolves
    pub const GENERIC: u8 = 20;
}

/// One `pip install` invocation that provides the runtime
pub trait RuntimeStrategy: Send + Sync {
    /// Arguments passed after `python -m pip`
    fn pip_args(&self) -> Vec<String>;

    fn priority(&self) -> u8;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct AcceleratedStrategy {
    pub packages: Vec<String>,
    pub index_url: String,
}

impl AcceleratedStrategy {
    pub fn new(packages: Vec<String>, index_url: String) -> Self {
        Self { packages, index_url }
    }
}

impl From<&AcceleratedRuntime> for AcceleratedStrategy {
    fn from(config: &AcceleratedRuntime) -> Self {
        Self::new(config.packages.clone(), config.index_url.clone())
    }
}

impl RuntimeStrategy for AcceleratedStrategy {
    fn pip_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        args.extend(self.packages.iter().cloned());
        args.push("--index-url".to_string());
        args.push(self.index_url.clone());
        args
    }

    fn priority(&self) -> u8 {
        priority::ACCELERATED
    }

    fn name(&self) -> &'static str {
        "accelerated"
    }
}

#[derive(Debug, Clone)]
pub struct GenericStrategy {
    pub packages: Vec<String>,
}

impl GenericStrategy {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }
}

impl From<&FallbackRuntime> for GenericStrategy {
    fn from(config: &FallbackRuntime) -> Self {
        Self::new(config.packages.clone())
    }
}

impl RuntimeStrategy for GenericStrategy {
    fn pip_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        args.extend(self.packages.iter().cloned());
        args
    }

    fn priority(&self) -> u8 {
        priority::GENERIC
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}
