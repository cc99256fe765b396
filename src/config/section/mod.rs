//! Configuration section definitions.

mod output;
mod proxy;
mod resolve;
mod rules;
mod serve;

pub use output::OutputConfig;
pub use proxy::ProxyRuleConfig;
pub use resolve::{DEFAULT_ROOT, ResolveConfig};
pub use rules::{LoaderSpec, RuleConfig};
pub use serve::ServeConfig;
