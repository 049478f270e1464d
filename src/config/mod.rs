//! Declarations: which sources to load and how to resolve them.

mod builder;

pub use builder::{Bootstrap, BootstrapResolver, Configuration, DefaultProperty, ResolverConfig, SourceSpec};
