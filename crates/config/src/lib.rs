//! # depositor-config
//!
//! Depositor configuration: the deployed contract, its operation interface and the JSON-RPC
//! endpoint, merged from `depositor.toml` and `DEPOSITOR_*` environment variables.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use alloy_primitives::{Address, address};
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

mod error;
pub use error::{ExtractConfigError, FAILED_TO_EXTRACT_CONFIG_MSG, InterfaceError};

pub mod interface;
pub use interface::{ContractInterface, Operation, OperationSpec};

/// Depositor configuration.
///
/// # Defaults
///
/// All configuration values have a default, documented in the [fields](#fields) section below.
/// [`Config::default()`] returns the default values for the default profile while
/// [`Config::figment()`] merges the `depositor.toml` file and `DEPOSITOR_` environment
/// variables on top of them.
///
/// ```toml
/// [default]
/// contract = "0x83ED5AAB13a3e309ff9c2A95810254F8d23fe5ab"
/// rpc_url = "http://localhost:8545"
///
/// [local]
/// rpc_url = "http://127.0.0.1:8546"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The selected profile. **(default: _default_ `default`)**
    ///
    /// **Note:** This field is never serialized nor deserialized. When a `Config` is merged into
    /// a `Figment` as a `Provider`, this profile is selected on the `Figment`. When a `Config` is
    /// extracted, this field is set to the extracting Figment's selected `Profile`.
    #[serde(skip)]
    pub profile: Profile,
    /// Address of the deposit contract.
    pub contract: Address,
    /// Path to a JSON ABI replacing the embedded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<PathBuf>,
    /// JSON-RPC endpoint used by the HTTP provider host.
    pub rpc_url: String,
    /// How often to poll for a transaction receipt, in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Config {
    /// The default profile: "default"
    pub const DEFAULT_PROFILE: Profile = Profile::Default;

    /// File name of config toml file
    pub const FILE_NAME: &'static str = "depositor.toml";

    /// Prefix of the environment variables read into the config.
    pub const ENV_PREFIX: &'static str = "DEPOSITOR_";

    /// Address of the deployed deposit contract.
    ///
    /// `0x83ED5AAB13a3e309ff9c2A95810254F8d23fe5ab`
    pub const DEFAULT_CONTRACT: Address = address!("0x83ED5AAB13a3e309ff9c2A95810254F8d23fe5ab");

    /// Default JSON-RPC endpoint.
    pub const DEFAULT_RPC_URL: &'static str = "http://localhost:8545";

    /// Loads the config from `depositor.toml` in the current directory and the environment.
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::try_from(Self::figment())
    }

    /// Attempts to extract a `Config` from `provider`, returning the result.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depositor_config::Config;
    /// use figment::providers::{Format, Toml};
    ///
    /// // Use the default `Figment`, but allow values from `other.toml`
    /// // to supersede its values.
    /// let figment = Config::figment().merge(Toml::file("other.toml").nested());
    ///
    /// let config = Config::try_from(figment);
    /// ```
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        let figment = Figment::from(provider);
        let mut config = figment.extract::<Self>().map_err(ExtractConfigError::new)?;
        config.profile = figment.profile().clone();
        trace!(target: "depositor::config", profile = %config.profile, contract = %config.contract, "loaded config");
        Ok(config)
    }

    /// Returns the default figment, reading `depositor.toml` from the current directory.
    pub fn figment() -> Figment {
        Self::figment_with_root(".")
    }

    /// Returns the default figment, reading `depositor.toml` from `root`.
    ///
    /// The following providers are merged, later ones taking precedence:
    ///   - [`Config::default()`]
    ///   - `depositor.toml` (or the file named by `DEPOSITOR_CONFIG`), nested by profile
    ///   - `DEPOSITOR_` prefixed environment variables
    ///
    /// The profile is selected by `DEPOSITOR_PROFILE`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let toml = Env::var("DEPOSITOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.as_ref().join(Self::FILE_NAME));
        Figment::from(Self::default())
            .merge(Toml::file(toml).nested())
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["PROFILE", "CONFIG"]).global())
            .select(Self::selected_profile())
    }

    /// Returns the selected profile.
    ///
    /// If the `DEPOSITOR_PROFILE` env variable is not set, this returns the `DEFAULT_PROFILE`.
    pub fn selected_profile() -> Profile {
        Profile::from_env_or("DEPOSITOR_PROFILE", Self::DEFAULT_PROFILE)
    }

    /// Returns the receipt poll interval.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Loads and validates the contract's operation interface.
    ///
    /// Uses the configured `abi` file if any, otherwise the embedded ABI.
    pub fn contract_interface(&self) -> Result<ContractInterface, InterfaceError> {
        match &self.abi {
            Some(path) => ContractInterface::from_file(path),
            None => ContractInterface::embedded(),
        }
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("Depositor Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Self::DEFAULT_PROFILE,
            contract: Self::DEFAULT_CONTRACT,
            abi: None,
            rpc_url: Self::DEFAULT_RPC_URL.to_string(),
            receipt_poll_interval_ms: 1_000,
        }
    }
}
