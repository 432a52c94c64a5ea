//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or
//! `UPCTL_CONFIG` environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **Defaults** - see [`Config::default`]
//! 2. **YAML config file** - default: `config.yaml`
//! 3. **Environment variables** - variables prefixed with `UPCTL_` override YAML values
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Point at a different processing service
//! UPCTL_BASE_URL=https://processing.internal:8443
//!
//! # Give up on requests after two minutes
//! UPCTL_REQUEST_TIMEOUT=2m
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::controller::{DEFAULT_DEBUG_PATH, DEFAULT_UPLOAD_PATH};
use crate::errors::Error;

/// Upload files to a processing service and fetch the processed result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "UPCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without sending anything.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload a file for processing and save the processed result
    Upload {
        #[command(flatten)]
        form: FormArgs,

        /// Directory for the processed file (overrides `output_dir`)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Send the form to the debug endpoint and print what the service received
    Debug {
        #[command(flatten)]
        form: FormArgs,
    },

    /// Run an upload and a debug submission at the same time
    Both {
        #[command(flatten)]
        form: FormArgs,

        /// Directory for the processed file (overrides `output_dir`)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Form fields. Values are passed through as typed; validation happens in the controller.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FormArgs {
    /// Product name
    #[arg(long, default_value = "")]
    pub product: String,

    /// Product version
    #[arg(long = "product-version", default_value = "")]
    pub version: String,

    /// Numeric application ID
    #[arg(long, default_value = "")]
    pub app_id: String,

    /// File to upload
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root URL of the processing service
    pub base_url: Url,
    /// Path of the processing endpoint, appended to `base_url`
    pub upload_path: String,
    /// Path of the debug echo endpoint, appended to `base_url`
    pub debug_path: String,
    /// Where processed files are saved
    pub output_dir: PathBuf,
    /// Optional per-request timeout (e.g. "90s"). Unset means wait indefinitely.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8000").unwrap(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            debug_path: DEFAULT_DEBUG_PATH.to_string(),
            output_dir: PathBuf::from("output"),
            request_timeout: None,
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("UPCTL_").split("__").ignore(&["CONFIG"]))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must use http or https, got '{}'",
                self.base_url.scheme()
            )));
        }

        if self.base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base_url '{}' cannot be used as a base URL", self.base_url)));
        }

        for (name, path) in [("upload_path", &self.upload_path), ("debug_path", &self.debug_path)] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!("{name} must start with '/', got '{path}'")));
            }
        }

        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                return Err(Error::Config("request_timeout must be greater than zero".to_string()));
            }
        }

        Ok(())
    }
}
