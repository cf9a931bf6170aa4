//! Configuration and contract interface errors.

use alloy_json_abi::StateMutability;
use std::{collections::HashSet, error::Error, fmt, path::PathBuf};

/// The message prefix shown when the config could not be extracted from the figment.
pub const FAILED_TO_EXTRACT_CONFIG_MSG: &str = "failed to extract depositor config:";

/// Represents a failed attempt to extract `Config` from a `Figment`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractConfigError {
    /// error thrown when extracting the `Config`
    pub(crate) error: figment::Error,
}

impl ExtractConfigError {
    /// Wraps the figment error
    pub fn new(error: figment::Error) -> Self {
        Self { error }
    }
}

impl fmt::Display for ExtractConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unique = HashSet::with_capacity(self.error.count());
        writeln!(f, "{FAILED_TO_EXTRACT_CONFIG_MSG}")?;
        for err in self.error.clone() {
            let mut line = err.to_string();
            if !err.path.is_empty() {
                // the path names the offending setting, like `["contract"]`
                line.push_str(&format!(" for setting `{}`", err.path.join(".")));
            }
            if unique.insert(line.clone()) {
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}

impl Error for ExtractConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(&self.error)
    }
}

/// Errors raised while validating the contract's operation interface.
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    #[error("failed to parse contract ABI: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read contract ABI from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("contract ABI is missing the `{0}` function")]
    MissingOperation(&'static str),
    #[error("contract ABI declares `{0}` more than once")]
    Overloaded(&'static str),
    #[error("`{operation}` must be {expected:?}, but the ABI declares it {found:?}")]
    Mutability { operation: &'static str, expected: StateMutability, found: StateMutability },
    #[error("`{operation}` must be `{expected}`, but the ABI declares `{found}`")]
    Signature { operation: &'static str, expected: String, found: String },
    #[error("`{operation}` uses an unsupported type: {source}")]
    InvalidType {
        operation: &'static str,
        #[source]
        source: alloy_dyn_abi::Error,
    },
}
