pub mod config;
pub mod context;
mod error;
pub mod load;
pub mod locator;
pub mod pipeline;
pub mod property;
pub mod registry;
pub mod source;

pub use config::{Bootstrap, BootstrapResolver, Configuration, DefaultProperty, ResolverConfig, SourceSpec};
pub use context::{ConfigContext, ConfigContextBuilder};
pub use error::Error;
pub use load::{Properties, StructuredConfig};
pub use locator::{Locator, ResourcePath};
pub use property::{Environment, PropertyResolver};
pub use registry::StrategyRegistry;
pub use source::{Source, SupportedType};
