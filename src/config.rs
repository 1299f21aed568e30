// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Session profiles.
//!
//! A profile is a TOML document describing how to configure a session
//! before any source is added:
//!
//! ```toml
//! libtcc = "/opt/tcc/lib/libtcc.so"
//! lib_path = "/opt/tcc/lib/tcc"
//! options = "-Wall"
//! output = "exe"
//! include_paths = ["include"]
//! libraries = ["m"]
//!
//! [defines]
//! VERSION = 3
//! NAME = "\"demo\""
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::engine::{Engine, OutputType};
use crate::error::SessionError;
use crate::session::{Outcome, Session};
use crate::symbol::SymbolValue;

/// Overrides the engine runtime library path of every profile.
pub const LIB_PATH_ENV: &str = "TLC_LIB_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid profile: {0}")]
    Output(#[from] crate::engine::UnknownOutputType),
    #[error("applying profile: {0}")]
    Session(#[from] SessionError),
    #[error("applying profile: context is closed")]
    Closed,
}

/// Value of a `[defines]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefineValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&DefineValue> for SymbolValue {
    fn from(v: &DefineValue) -> Self {
        match v {
            DefineValue::Flag(b) => SymbolValue::Boolean(*b),
            DefineValue::Integer(i) => SymbolValue::Integer(*i),
            DefineValue::Float(f) => SymbolValue::Float(*f),
            DefineValue::Text(s) => SymbolValue::Text(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Shared object to load the engine from.
    pub libtcc: Option<PathBuf>,
    /// Engine runtime library path (`tcc_set_lib_path`).
    pub lib_path: Option<PathBuf>,
    pub options: Option<String>,
    pub output: Option<String>,
    pub include_paths: Vec<PathBuf>,
    pub sysinclude_paths: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub defines: BTreeMap<String, DefineValue>,
    pub undefines: Vec<String>,
}

impl SessionConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: SessionConfig = toml::from_str(text)?;
        cfg.output_type()?;
        Ok(cfg)
    }

    /// Load a profile, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        debug!("profile {} loaded", path.display());
        Ok(cfg)
    }

    /// Apply `TLC_LIB_PATH` on top of the profile.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(p) = std::env::var_os(LIB_PATH_ENV).filter(|p| !p.is_empty()) {
            self.lib_path = Some(PathBuf::from(p));
        }
        self
    }

    pub fn output_type(&self) -> Result<Option<OutputType>, ConfigError> {
        self.output
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ConfigError::from)
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.include_paths.iter_mut().for_each(join);
        self.sysinclude_paths.iter_mut().for_each(join);
        self.library_paths.iter_mut().for_each(join);
        if let Some(p) = self.lib_path.as_mut() {
            join(p);
        }
    }

    /// Configure `session`. Order: library path, options, output type,
    /// include paths, symbols, link inputs.
    pub fn apply<E: Engine>(&self, session: &mut Session<E>) -> Result<(), ConfigError> {
        fn check(outcome: Outcome) -> Result<(), ConfigError> {
            outcome.applied().ok_or(ConfigError::Closed)
        }

        if let Some(p) = &self.lib_path {
            check(session.set_library_path(p)?)?;
        }
        if let Some(opts) = &self.options {
            check(session.set_options(opts)?)?;
        }
        if let Some(kind) = self.output_type()? {
            check(session.set_output_type(kind)?)?;
        }
        for p in &self.include_paths {
            check(session.add_include_path(p)?)?;
        }
        for p in &self.sysinclude_paths {
            check(session.add_system_include_path(p)?)?;
        }
        for (name, value) in &self.defines {
            check(session.define_symbol(name, value)?)?;
        }
        for name in &self.undefines {
            check(session.undefine_symbol(name)?)?;
        }
        for p in &self.library_paths {
            check(session.add_library_path(p)?)?;
        }
        for lib in &self.libraries {
            check(session.add_library(lib)?)?;
        }
        Ok(())
    }
}
