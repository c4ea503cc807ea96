use thiserror::Error;

/// Errors used within the crate.
///
/// Problems with individual entries in the metadata are not errors, they are
/// reported as [crate::diagnostic::Diagnostic]s. These are the failures that
/// stop the whole run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Metadata could not be parsed: {0}")]
    Parse(#[from] crate::xml::ParseError),
    #[error("Failed to fetch metadata: {0}")]
    Source(#[from] crate::source::Error),
    #[error("Failed to read whitelist {0}: {1}")]
    WhitelistRead(String, #[source] std::io::Error),
    #[error("Whitelist {0} is not a JSON object of entity ID to key: {1}")]
    WhitelistFormat(String, #[source] serde_json::Error),
    #[error("Invalid arguments: {0}")]
    Args(#[from] pico_args::Error),
    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
