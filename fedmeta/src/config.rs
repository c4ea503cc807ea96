use std::path::{Path, PathBuf};

use crate::{
    descriptor::Rules,
    error::{Error, Result},
    whitelist::Whitelist,
};

pub const HELP: &str = "
fedmeta

Extract identity providers from SAML2 federation metadata and print them as
JSON.

USAGE:
    fedmeta [options] <metadata>

ARGS:
    <metadata>                 URL (http:// or https://) or path of the metadata

FLAGS:
    -h, --help                 Print this message
        --require-certificate  Drop providers without a signing certificate

OPTIONS:
    -w, --whitelist <file>     JSON object of entity ID to key. When given the
                               output is keyed by it, otherwise every provider
                               is printed.

ENVIRONMENT:
    RUST_LOG                   Log filter (default: fedmeta=info)
";

/// Log filter used when `RUST_LOG` isn't set.
pub const DEFAULT_LOG_FILTER: &str = "fedmeta=info";

#[derive(Debug, PartialEq)]
pub struct Args {
    /// Where to load the metadata from.
    pub metadata: String,
    /// Whitelist to key the output by.
    pub whitelist: Option<PathBuf>,
    /// Validation applied to each descriptor.
    pub rules: Rules,
}

impl Args {
    /// Parse the command line. `Ok(None)` means help was asked for.
    pub fn parse(mut pargs: pico_args::Arguments) -> Result<Option<Args>> {
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let require_certificate = pargs.contains("--require-certificate");
        let whitelist = pargs.opt_value_from_str(["-w", "--whitelist"])?;
        let metadata = pargs.free_from_str()?;

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(Error::Args(pico_args::Error::ArgumentParsingFailed {
                cause: format!("unexpected arguments: {:?}", remaining),
            }));
        }

        Ok(Some(Args {
            metadata,
            whitelist,
            rules: Rules {
                require_certificate,
            },
        }))
    }
}

/// Load a whitelist from a JSON object file such as
/// `{"https://idp.example.com/metadata": "example"}`.
pub fn load_whitelist(path: &Path) -> Result<Whitelist> {
    let name = path.display().to_string();
    let contents =
        std::fs::read_to_string(path).map_err(|e| Error::WhitelistRead(name.clone(), e))?;
    serde_json::from_str(&contents).map_err(|e| Error::WhitelistFormat(name, e))
}
