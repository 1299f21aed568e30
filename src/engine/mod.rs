// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Compilation engine seam.
//!
//! A [`Backend`] hands out fresh [`Engine`] instances. An instance is one
//! compiler/linker state: it is configured, fed sources, and finally either
//! writes an artifact or runs the result in memory. Dropping an instance
//! destroys the underlying engine state.

pub mod libtcc;

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr::NonNull;
use std::str::FromStr;

use crate::error::SessionError;

pub use libtcc::{LibTcc, TccInstance};

/// Binary status reported by the engine. It carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
}

impl Status {
    /// Map a raw engine return code (`0` success, anything else failure).
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Status::Ok
        } else {
            Status::Failed
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// Artifact produced by the compile-and-link step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputType {
    #[default]
    InMemory,
    Executable,
    SharedLibrary,
    ObjectFile,
    PreprocessOnly,
}

impl OutputType {
    pub const ALL: [OutputType; 5] = [
        OutputType::InMemory,
        OutputType::Executable,
        OutputType::SharedLibrary,
        OutputType::ObjectFile,
        OutputType::PreprocessOnly,
    ];

    /// Integer understood by `tcc_set_output_type`.
    pub fn code(self) -> i32 {
        match self {
            OutputType::InMemory => 1,
            OutputType::Executable => 2,
            OutputType::SharedLibrary => 3,
            OutputType::ObjectFile => 4,
            OutputType::PreprocessOnly => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Short name used by profiles and the command line.
    pub fn name(self) -> &'static str {
        match self {
            OutputType::InMemory => "memory",
            OutputType::Executable => "exe",
            OutputType::SharedLibrary => "dll",
            OutputType::ObjectFile => "obj",
            OutputType::PreprocessOnly => "preprocess",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output type {0:?} (expected memory, exe, dll, obj or preprocess)")]
pub struct UnknownOutputType(pub String);

impl FromStr for OutputType {
    type Err = UnknownOutputType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| UnknownOutputType(s.to_string()))
    }
}

/// One engine instance.
///
/// Methods mirror the engine's C entry points. Implementations must not
/// retain the borrowed strings beyond the call.
pub trait Engine {
    fn set_lib_path(&mut self, path: &CStr);
    fn set_options(&mut self, options: &CStr);
    fn add_include_path(&mut self, path: &CStr);
    fn add_sysinclude_path(&mut self, path: &CStr);
    /// `None` defines the symbol with the engine default value.
    fn define_symbol(&mut self, name: &CStr, value: Option<&CStr>);
    fn undefine_symbol(&mut self, name: &CStr);
    fn set_output_type(&mut self, kind: OutputType) -> Status;
    fn add_library_path(&mut self, path: &CStr) -> Status;
    fn add_library(&mut self, name: &CStr) -> Status;
    /// # Safety
    /// `addr` must stay valid for as long as compiled code may reference it.
    unsafe fn add_symbol(&mut self, name: &CStr, addr: *const c_void) -> Status;
    fn add_file(&mut self, path: &CStr) -> Status;
    fn compile_string(&mut self, source: &CStr) -> Status;
    fn output_file(&mut self, path: &CStr) -> Status;
    /// Relocate and call `main`; returns the program's exit status.
    fn run(&mut self, argv: &[&CStr]) -> i32;
    fn relocate(&mut self) -> Status;
    fn get_symbol(&mut self, name: &CStr) -> Option<NonNull<c_void>>;
    /// Drain diagnostics emitted since the previous call.
    fn take_diagnostics(&mut self) -> Vec<String>;
    /// Address identifying the native state, for display only.
    fn raw_addr(&self) -> usize;
}

/// Factory for engine instances.
pub trait Backend {
    type Instance: Engine;

    fn name(&self) -> &str;

    /// Allocate a fresh, exclusively owned engine instance.
    fn instantiate(&self) -> Result<Self::Instance, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_codes_match_engine_numbering() {
        let codes: Vec<i32> = OutputType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
        assert_eq!(OutputType::from_code(4), Some(OutputType::ObjectFile));
        assert_eq!(OutputType::from_code(0), None);
        assert_eq!(OutputType::default(), OutputType::InMemory);
    }

    #[test]
    fn output_type_parses_names() {
        assert_eq!("memory".parse::<OutputType>().unwrap(), OutputType::InMemory);
        assert_eq!(" DLL ".parse::<OutputType>().unwrap(), OutputType::SharedLibrary);
        assert_eq!("preprocess".parse::<OutputType>().unwrap(), OutputType::PreprocessOnly);
        let err = "elf".parse::<OutputType>().unwrap_err();
        assert_eq!(err, UnknownOutputType("elf".into()));
    }

    #[test]
    fn status_from_code() {
        assert!(Status::from_code(0).is_ok());
        assert_eq!(Status::from_code(-1), Status::Failed);
        assert_eq!(Status::from_code(1), Status::Failed);
    }
}
