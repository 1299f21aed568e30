// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.12
// Date Modified: 2026-10-18
// Author: Lukas Bower

//! Compiler sessions over an in-process C compiler engine.
//!
//! A [`Session`] owns one engine instance and walks it through
//! configuration, source ingestion and a single output step:
//!
//! ```no_run
//! use tlc::{LibTcc, OutputType, Session};
//!
//! # fn main() -> Result<(), tlc::SessionError> {
//! let tcc = LibTcc::load()?;
//! let mut session = Session::create(&tcc)?;
//! session.set_output_type(OutputType::InMemory)?;
//! session.define_symbol("ANSWER", 42)?;
//! session.compile_string("int main(){ return ANSWER == 42 ? 0 : 1; }")?;
//! assert_eq!(session.run(&[])?.applied(), Some(true));
//! session.close()?;
//! # Ok(())
//! # }
//! ```

/// Typed errors for session operations
pub mod error;
/// Compilation engine seam and the libtcc backend
pub mod engine;
/// Preprocessor symbol values
pub mod symbol;
/// Session lifecycle and state machine
pub mod session;
/// TOML session profiles
pub mod config;
/// Logger setup and invocation records
pub mod logging;
/// Command line front end for the tlc binary
pub mod cli;

pub use config::{ConfigError, SessionConfig};
pub use engine::{Backend, Engine, LibTcc, OutputType, Status, TccInstance};
pub use error::{SessionError, SessionResult};
pub use session::{Outcome, Session, PROGRAM_NAME};
pub use symbol::SymbolValue;

/// Session over a dynamically loaded libtcc.
pub type TccSession = Session<TccInstance>;
