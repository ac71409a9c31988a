//! Configuration module for linkprobe
//!
//! This module defines the validated options record consumed by the
//! crawler engine, and handles loading `linkinator.config.json`-style
//! configuration files whose keys mirror the CLI long-form flags.
//!
//! # Example
//!
//! ```no_run
//! use linkprobe::config::{load_config, CheckOptions};
//! use std::path::Path;
//!
//! let mut options = CheckOptions::default();
//! let raw = load_config(Path::new("linkinator.config.json")).unwrap();
//! raw.apply_to(&mut options).unwrap();
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{load_config, RawConfig};
pub use types::{CheckOptions, LinksToSkip, SkipPredicate, UrlRewriteRule};
pub use validation::validate;
