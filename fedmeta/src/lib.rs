//! Turn SAML2 federation metadata into validated identity provider records.
//!
//! The pipeline is:
//! - fetch the metadata document ([source])
//! - extract every valid `md:EntityDescriptor` ([extract()])
//! - key the descriptors by a whitelist ([map_whitelist])
//!
//! Bad entries in the metadata never fail the whole run. They are dropped and
//! reported as [Diagnostic]s, logged through `tracing` unless you pass your
//! own [Sink].
pub mod config;
pub mod descriptor;
pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod source;
pub mod whitelist;
pub mod xml;

use std::collections::BTreeMap;

pub use crate::{
    descriptor::{Invalid, ProviderDescriptor, RawDescriptor, Rules, Violation},
    diagnostic::{Diagnostic, Sink, TracingSink},
    error::{Error, Result},
    extract::{extract, extract_with},
    source::Source,
    whitelist::{map_whitelist, map_whitelist_with, Whitelist},
};

/// Fetch the metadata at `location`, extract the valid descriptors and key
/// them by `whitelist`. Dropped entries are logged.
#[tracing::instrument(level = "info", skip(source, whitelist))]
pub async fn load<S: Source + Sync>(
    source: &S,
    location: &str,
    whitelist: &Whitelist,
    rules: &Rules,
) -> Result<BTreeMap<String, ProviderDescriptor>> {
    let document = source.fetch(location).await?;
    let descriptors = extract_with(&document, rules, TracingSink)?;
    let mapped = map_whitelist(descriptors, whitelist);
    tracing::info!("Loaded {} identity providers from {}", mapped.len(), location);
    Ok(mapped)
}

/// Set up logging to stderr, filtered by `RUST_LOG`.
pub fn init_logging() {
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.to_owned());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
