//! Command implementations.

pub mod resolve;
pub mod servers;
pub mod tlsa;

use walletname::ResolverConfig;

use crate::output::OutputFormat;

/// Shared state for command execution.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ResolverConfig,
    pub output_format: OutputFormat,
    pub no_color: bool,
}
