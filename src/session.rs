// CLASSIFICATION: COMMUNITY
// Filename: session.rs v0.7
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Compiler session: one exclusively owned engine instance and the rules
//! for driving it.
//!
//! A session moves from configuration through source ingestion to exactly
//! one kind of output. Once closed, every operation except `close` reports
//! [`Outcome::Unavailable`] instead of raising, so batch configuration can
//! detect and skip a dead session.

use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;

use log::{debug, info, warn};

use crate::engine::{Backend, Engine, OutputType};
use crate::error::{SessionError, SessionResult};
use crate::symbol::SymbolValue;

/// Program name handed to compiled code as `argv[0]`.
pub const PROGRAM_NAME: &str = "tcc";

/// Non-raising result of a session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Applied(T),
    /// The session was closed; nothing reached the engine.
    Unavailable,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Outcome::Unavailable)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::Unavailable => None,
        }
    }

    /// Treat a closed session as an error.
    pub fn into_result(self) -> SessionResult<T> {
        self.applied().ok_or(SessionError::Closed)
    }
}

/// Open engine plus the bookkeeping the engine does not expose.
struct Live<E> {
    engine: E,
    output: OutputType,
    committed: bool,
    relocated: bool,
}

/// A compiler session over one engine instance.
pub struct Session<E: Engine> {
    live: Option<Live<E>>,
}

fn c_string(value: &str, what: &'static str) -> SessionResult<CString> {
    CString::new(value).map_err(|_| SessionError::InvalidArgument(what))
}

#[cfg(unix)]
fn c_path(path: &Path, what: &'static str) -> SessionResult<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).map_err(|_| SessionError::InvalidArgument(what))
}

#[cfg(not(unix))]
fn c_path(path: &Path, what: &'static str) -> SessionResult<CString> {
    match path.to_str() {
        Some(text) => c_string(text, what),
        None => Err(SessionError::InvalidArgument(what)),
    }
}

impl<E: Engine> Live<E> {
    /// Forward the selected output type before the engine first needs it.
    fn commit(&mut self) {
        if self.committed {
            return;
        }
        if !self.engine.set_output_type(self.output).is_ok() {
            warn!("engine rejected output type {}", self.output);
        }
        self.committed = true;
        debug!("output type {} committed", self.output);
    }

    fn require(&self, expected: OutputType) -> SessionResult<()> {
        if self.output != expected {
            return Err(SessionError::OutputTypeMismatch {
                expected,
                actual: self.output,
            });
        }
        Ok(())
    }
}

impl<E: Engine> Session<E> {
    /// Allocate a fresh engine instance from `backend`.
    pub fn create<B>(backend: &B) -> SessionResult<Self>
    where
        B: Backend<Instance = E>,
    {
        let engine = backend.instantiate().inspect_err(|e| {
            warn!("{} instance creation failed: {}", backend.name(), e);
        })?;
        info!("{} session opened", backend.name());
        Ok(Self::from_engine(engine))
    }

    /// Wrap an already allocated instance.
    pub fn from_engine(engine: E) -> Self {
        Session {
            live: Some(Live {
                engine,
                output: OutputType::default(),
                committed: false,
                relocated: false,
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }

    /// Output type currently selected, `None` once closed.
    pub fn output_type(&self) -> Option<OutputType> {
        self.live.as_ref().map(|l| l.output)
    }

    /// Release the engine instance. Valid exactly once.
    pub fn close(&mut self) -> SessionResult<()> {
        match self.live.take() {
            Some(live) => {
                drop(live);
                info!("session closed");
                Ok(())
            }
            None => Err(SessionError::AlreadyClosed),
        }
    }

    fn with_live<T>(
        &mut self,
        op: &str,
        f: impl FnOnce(&mut Live<E>) -> SessionResult<T>,
    ) -> SessionResult<Outcome<T>> {
        match self.live.as_mut() {
            Some(live) => f(live).map(Outcome::Applied),
            None => {
                debug!("{op} on closed session ignored");
                Ok(Outcome::Unavailable)
            }
        }
    }

    pub fn set_library_path(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        self.with_live("set_library_path", |l| {
            let path = c_path(path.as_ref(), "library path")?;
            l.engine.set_lib_path(&path);
            Ok(())
        })
    }

    pub fn set_options(&mut self, options: &str) -> SessionResult<Outcome> {
        self.with_live("set_options", |l| {
            let options = c_string(options, "options")?;
            l.engine.set_options(&options);
            Ok(())
        })
    }

    pub fn add_include_path(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        self.with_live("add_include_path", |l| {
            let path = c_path(path.as_ref(), "include path")?;
            l.engine.add_include_path(&path);
            Ok(())
        })
    }

    pub fn add_system_include_path(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        self.with_live("add_system_include_path", |l| {
            let path = c_path(path.as_ref(), "system include path")?;
            l.engine.add_sysinclude_path(&path);
            Ok(())
        })
    }

    /// Define a preprocessor macro. Non-text values are rendered first, so
    /// `define_symbol("FOO", 42)` defines `FOO` as `42`.
    pub fn define_symbol(
        &mut self,
        name: &str,
        value: impl Into<SymbolValue>,
    ) -> SessionResult<Outcome> {
        let value = value.into();
        self.with_live("define_symbol", |l| {
            let name = c_string(name, "symbol name")?;
            let value = value
                .to_text()
                .map(|v| c_string(&v, "symbol value"))
                .transpose()?;
            l.engine.define_symbol(&name, value.as_deref());
            Ok(())
        })
    }

    pub fn undefine_symbol(&mut self, name: &str) -> SessionResult<Outcome> {
        self.with_live("undefine_symbol", |l| {
            let name = c_string(name, "symbol name")?;
            l.engine.undefine_symbol(&name);
            Ok(())
        })
    }

    /// Select the artifact kind. The engine fixes it at first use, so a
    /// different kind after the first source or output step is rejected.
    pub fn set_output_type(&mut self, kind: OutputType) -> SessionResult<Outcome> {
        self.with_live("set_output_type", |l| {
            if l.committed && l.output != kind {
                return Err(SessionError::OutputTypeCommitted {
                    committed: l.output,
                    requested: kind,
                });
            }
            l.output = kind;
            Ok(())
        })
    }

    pub fn add_library_path(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        self.with_live("add_library_path", |l| {
            let path = c_path(path.as_ref(), "library search path")?;
            if !l.engine.add_library_path(&path).is_ok() {
                warn!("engine rejected library path {:?}", path);
            }
            Ok(())
        })
    }

    /// Link against `name` (as `-lname`).
    pub fn add_library(&mut self, name: &str) -> SessionResult<Outcome> {
        self.with_live("add_library", |l| {
            let name = c_string(name, "library name")?;
            l.commit();
            if l.engine.add_library(&name).is_ok() {
                return Ok(());
            }
            Err(SessionError::Compilation {
                what: format!("adding library {}", name.to_string_lossy()),
                diagnostics: l.engine.take_diagnostics(),
            })
        })
    }

    /// Expose a host symbol to compiled code.
    ///
    /// # Safety
    /// `addr` must point to a function or object matching the declaration
    /// the compiled code uses, and stay valid while that code can run.
    pub unsafe fn add_symbol(
        &mut self,
        name: &str,
        addr: *const c_void,
    ) -> SessionResult<Outcome> {
        self.with_live("add_symbol", |l| {
            let name = c_string(name, "symbol name")?;
            l.commit();
            if unsafe { l.engine.add_symbol(&name, addr) }.is_ok() {
                return Ok(());
            }
            Err(SessionError::Compilation {
                what: format!("adding symbol {}", name.to_string_lossy()),
                diagnostics: l.engine.take_diagnostics(),
            })
        })
    }

    /// Compile or link a source, object or library file into the session.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        let display = path.as_ref().display().to_string();
        self.with_live("add_file", |l| {
            let path = c_path(path.as_ref(), "file path")?;
            l.commit();
            // Earlier warnings belong to earlier calls.
            l.engine.take_diagnostics();
            if l.engine.add_file(&path).is_ok() {
                debug!("added {}", display);
                return Ok(());
            }
            let diagnostics = l.engine.take_diagnostics();
            warn!("adding {} failed", display);
            Err(SessionError::Compilation {
                what: format!("adding file {display} to context"),
                diagnostics,
            })
        })
    }

    /// Compile an in-memory translation unit. Successive calls accumulate.
    pub fn compile_string(&mut self, source: &str) -> SessionResult<Outcome> {
        self.with_live("compile_string", |l| {
            let source = c_string(source, "source")?;
            l.commit();
            l.engine.take_diagnostics();
            if l.engine.compile_string(&source).is_ok() {
                return Ok(());
            }
            let diagnostics = l.engine.take_diagnostics();
            warn!("compiling string failed");
            Err(SessionError::Compilation {
                what: "compiling string".into(),
                diagnostics,
            })
        })
    }

    /// Write the artifact for the configured (non in-memory) output type.
    pub fn output_file(&mut self, path: impl AsRef<Path>) -> SessionResult<Outcome> {
        let display = path.as_ref().display().to_string();
        self.with_live("output_file", |l| {
            let path = c_path(path.as_ref(), "output path")?;
            if l.output == OutputType::InMemory {
                return Err(SessionError::InMemoryOutput);
            }
            l.commit();
            l.engine.take_diagnostics();
            if l.engine.output_file(&path).is_ok() {
                info!("wrote {} output to {}", l.output, display);
                return Ok(());
            }
            Err(SessionError::Output {
                path: display,
                diagnostics: l.engine.take_diagnostics(),
            })
        })
    }

    /// Relocate and run the compiled program's `main`.
    ///
    /// `argv[0]` is [`PROGRAM_NAME`]; `args` follow in order. Yields `true`
    /// when the program exits with status zero. A nonzero exit is a normal
    /// outcome, not an error. Blocks until the program returns.
    pub fn run(&mut self, args: &[&str]) -> SessionResult<Outcome<bool>> {
        self.with_live("run", |l| {
            let mut argv = Vec::with_capacity(args.len() + 1);
            argv.push(c_string(PROGRAM_NAME, "argument")?);
            for arg in args {
                argv.push(c_string(arg, "argument")?);
            }
            l.require(OutputType::InMemory)?;
            if l.relocated {
                return Err(SessionError::AlreadyRelocated);
            }
            l.commit();
            let refs: Vec<&CStr> = argv.iter().map(CString::as_c_str).collect();
            let status = l.engine.run(&refs);
            // The engine relocates as part of running.
            l.relocated = true;
            debug!("program exited with status {}", status);
            Ok(status == 0)
        })
    }

    /// Relocate the in-memory image without running it, making
    /// [`Session::symbol_address`] usable.
    pub fn relocate(&mut self) -> SessionResult<Outcome> {
        self.with_live("relocate", |l| {
            l.require(OutputType::InMemory)?;
            if l.relocated {
                return Err(SessionError::AlreadyRelocated);
            }
            l.commit();
            l.engine.take_diagnostics();
            if !l.engine.relocate().is_ok() {
                return Err(SessionError::Relocation(l.engine.take_diagnostics()));
            }
            l.relocated = true;
            Ok(())
        })
    }

    /// Address of a global in the relocated image. The address is valid
    /// until the session is closed.
    pub fn symbol_address(&mut self, name: &str) -> SessionResult<Outcome<Option<NonNull<c_void>>>> {
        self.with_live("symbol_address", |l| {
            let name = c_string(name, "symbol name")?;
            if !l.relocated {
                return Err(SessionError::NotRelocated);
            }
            Ok(l.engine.get_symbol(&name))
        })
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        // Already closed is not a fault here.
        if self.live.take().is_some() {
            debug!("session released on drop");
        }
    }
}

impl<E: Engine> fmt::Display for Session<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.live {
            Some(live) => write!(f, "tlc_context (open): {:#x}", live.engine.raw_addr()),
            None => f.write_str("tlc_context (closed)"),
        }
    }
}

impl<E: Engine> fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Session");
        s.field("open", &self.is_open());
        if let Some(live) = &self.live {
            s.field("output", &live.output)
                .field("committed", &live.committed)
                .field("relocated", &live.relocated);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TccInstance;

    #[test]
    fn outcome_helpers() {
        let done: Outcome<u8> = Outcome::Applied(7);
        assert!(done.is_applied());
        assert_eq!(done.applied(), Some(7));
        assert_eq!(done.into_result().unwrap(), 7);

        let closed: Outcome<u8> = Outcome::Unavailable;
        assert!(closed.is_unavailable());
        assert_eq!(closed.applied(), None);
        assert!(matches!(closed.into_result(), Err(SessionError::Closed)));
    }

    #[test]
    fn tcc_session_moves_between_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<Session<TccInstance>>();
    }

    #[test]
    fn paths_with_nul_are_rejected() {
        let err = c_string("a\0b", "include path").unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument("include path")));
    }
}
