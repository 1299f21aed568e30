// CLASSIFICATION: COMMUNITY
// Filename: libtcc.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Runtime binding to `libtcc` using dynamic loading.
//!
//! Every entry point is resolved when the library is opened, so a session
//! can never reach a half-bound engine. Diagnostics are captured through the
//! engine's error callback into a per-instance buffer.

use std::ffi::{c_char, c_int, c_void, CStr, OsStr, OsString};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libloading::{Library, Symbol};
use log::{debug, info, warn};
use once_cell::sync::Lazy;

use super::{Backend, Engine, OutputType, Status};
use crate::error::SessionError;

/// Environment variable naming the libtcc shared object to load.
pub const LIBTCC_ENV: &str = "TLC_LIBTCC";

/// `TCC_RELOCATE_AUTO`: let the engine allocate and manage the image.
const RELOCATE_AUTO: *mut c_void = 1 as *mut c_void;

static DEFAULT_CANDIDATES: Lazy<Vec<OsString>> = Lazy::new(|| {
    let mut names = vec![libloading::library_filename("tcc")];
    if cfg!(target_os = "linux") {
        names.push("libtcc.so.1".into());
        names.push("/usr/lib/x86_64-linux-gnu/libtcc.so".into());
        names.push("/usr/local/lib/libtcc.so".into());
    }
    names
});

#[repr(C)]
pub struct TCCState {
    _private: [u8; 0],
}

type ErrorFunc = unsafe extern "C" fn(*mut c_void, *const c_char);

struct TccApi {
    new: unsafe extern "C" fn() -> *mut TCCState,
    delete: unsafe extern "C" fn(*mut TCCState),
    set_lib_path: unsafe extern "C" fn(*mut TCCState, *const c_char),
    set_error_func: unsafe extern "C" fn(*mut TCCState, *mut c_void, Option<ErrorFunc>),
    set_options: unsafe extern "C" fn(*mut TCCState, *const c_char),
    add_include_path: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    add_sysinclude_path: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    define_symbol: unsafe extern "C" fn(*mut TCCState, *const c_char, *const c_char),
    undefine_symbol: unsafe extern "C" fn(*mut TCCState, *const c_char),
    add_file: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    compile_string: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    set_output_type: unsafe extern "C" fn(*mut TCCState, c_int) -> c_int,
    add_library_path: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    add_library: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    add_symbol: unsafe extern "C" fn(*mut TCCState, *const c_char, *const c_void) -> c_int,
    output_file: unsafe extern "C" fn(*mut TCCState, *const c_char) -> c_int,
    run: unsafe extern "C" fn(*mut TCCState, c_int, *mut *mut c_char) -> c_int,
    // Releases taking a single argument ignore the trailing pointer.
    relocate: unsafe extern "C" fn(*mut TCCState, *mut c_void) -> c_int,
    get_symbol: unsafe extern "C" fn(*mut TCCState, *const c_char) -> *mut c_void,
    // Keeps every pointer above valid.
    _lib: Library,
}

unsafe fn resolve<T: Copy>(lib: &Library, name: &str) -> Result<T, SessionError> {
    let sym: Symbol<T> = unsafe { lib.get(name.as_bytes()) }
        .map_err(|e| SessionError::EngineInit(format!("libtcc is missing {name}: {e}")))?;
    Ok(*sym)
}

impl TccApi {
    fn bind(lib: Library) -> Result<Self, SessionError> {
        unsafe {
            Ok(TccApi {
                new: resolve(&lib, "tcc_new")?,
                delete: resolve(&lib, "tcc_delete")?,
                set_lib_path: resolve(&lib, "tcc_set_lib_path")?,
                set_error_func: resolve(&lib, "tcc_set_error_func")?,
                set_options: resolve(&lib, "tcc_set_options")?,
                add_include_path: resolve(&lib, "tcc_add_include_path")?,
                add_sysinclude_path: resolve(&lib, "tcc_add_sysinclude_path")?,
                define_symbol: resolve(&lib, "tcc_define_symbol")?,
                undefine_symbol: resolve(&lib, "tcc_undefine_symbol")?,
                add_file: resolve(&lib, "tcc_add_file")?,
                compile_string: resolve(&lib, "tcc_compile_string")?,
                set_output_type: resolve(&lib, "tcc_set_output_type")?,
                add_library_path: resolve(&lib, "tcc_add_library_path")?,
                add_library: resolve(&lib, "tcc_add_library")?,
                add_symbol: resolve(&lib, "tcc_add_symbol")?,
                output_file: resolve(&lib, "tcc_output_file")?,
                run: resolve(&lib, "tcc_run")?,
                relocate: resolve(&lib, "tcc_relocate")?,
                get_symbol: resolve(&lib, "tcc_get_symbol")?,
                _lib: lib,
            })
        }
    }
}

/// A loaded libtcc. Cloning shares the library.
#[derive(Clone)]
pub struct LibTcc {
    api: Arc<TccApi>,
    path: PathBuf,
}

impl LibTcc {
    /// Load libtcc from `TLC_LIBTCC`, falling back to the platform defaults.
    pub fn load() -> Result<Self, SessionError> {
        if let Some(path) = std::env::var_os(LIBTCC_ENV).filter(|p| !p.is_empty()) {
            return Self::open(path);
        }
        let mut last = String::from("no candidates");
        for candidate in DEFAULT_CANDIDATES.iter() {
            match Self::open(candidate) {
                Ok(tcc) => return Ok(tcc),
                Err(e) => {
                    debug!("libtcc candidate {:?} rejected: {}", candidate, e);
                    last = e.to_string();
                }
            }
        }
        warn!("libtcc not found; set {} to its location", LIBTCC_ENV);
        Err(SessionError::EngineInit(format!("libtcc not found ({last})")))
    }

    /// Load libtcc from an explicit path or library name.
    pub fn open(path: impl AsRef<OsStr>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let lib = unsafe { Library::new(path) }
            .map_err(|e| SessionError::EngineInit(format!("cannot load {}: {e}", path.to_string_lossy())))?;
        let api = TccApi::bind(lib)?;
        info!("libtcc loaded from {}", path.to_string_lossy());
        Ok(LibTcc {
            api: Arc::new(api),
            path: PathBuf::from(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for LibTcc {
    type Instance = TccInstance;

    fn name(&self) -> &str {
        "libtcc"
    }

    fn instantiate(&self) -> Result<TccInstance, SessionError> {
        let raw = unsafe { (self.api.new)() };
        let state = NonNull::new(raw)
            .ok_or_else(|| SessionError::EngineInit("tcc_new returned null".into()))?;
        let sink = Box::into_raw(Box::new(Vec::<String>::new()));
        unsafe {
            (self.api.set_error_func)(state.as_ptr(), sink.cast(), Some(collect_diagnostic));
        }
        Ok(TccInstance {
            api: Arc::clone(&self.api),
            state,
            // SAFETY: Box::into_raw never yields null.
            diagnostics: unsafe { NonNull::new_unchecked(sink) },
        })
    }
}

unsafe extern "C" fn collect_diagnostic(opaque: *mut c_void, msg: *const c_char) {
    if opaque.is_null() || msg.is_null() {
        return;
    }
    let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned();
    debug!(target: "tlc::engine", "{}", text);
    // SAFETY: opaque is the instance's diagnostic buffer, alive until tcc_delete returns.
    unsafe { (*opaque.cast::<Vec<String>>()).push(text) };
}

/// One `TCCState` plus its diagnostic buffer.
pub struct TccInstance {
    api: Arc<TccApi>,
    state: NonNull<TCCState>,
    diagnostics: NonNull<Vec<String>>,
}

// SAFETY: the state is exclusively owned and only touched through &mut self.
unsafe impl Send for TccInstance {}

impl TccInstance {
    fn s(&self) -> *mut TCCState {
        self.state.as_ptr()
    }
}

impl Engine for TccInstance {
    fn set_lib_path(&mut self, path: &CStr) {
        unsafe { (self.api.set_lib_path)(self.s(), path.as_ptr()) }
    }

    fn set_options(&mut self, options: &CStr) {
        unsafe { (self.api.set_options)(self.s(), options.as_ptr()) }
    }

    fn add_include_path(&mut self, path: &CStr) {
        unsafe { (self.api.add_include_path)(self.s(), path.as_ptr()) };
    }

    fn add_sysinclude_path(&mut self, path: &CStr) {
        unsafe { (self.api.add_sysinclude_path)(self.s(), path.as_ptr()) };
    }

    fn define_symbol(&mut self, name: &CStr, value: Option<&CStr>) {
        let value = value.map_or(ptr::null(), CStr::as_ptr);
        unsafe { (self.api.define_symbol)(self.s(), name.as_ptr(), value) }
    }

    fn undefine_symbol(&mut self, name: &CStr) {
        unsafe { (self.api.undefine_symbol)(self.s(), name.as_ptr()) }
    }

    fn set_output_type(&mut self, kind: OutputType) -> Status {
        Status::from_code(unsafe { (self.api.set_output_type)(self.s(), kind.code()) })
    }

    fn add_library_path(&mut self, path: &CStr) -> Status {
        Status::from_code(unsafe { (self.api.add_library_path)(self.s(), path.as_ptr()) })
    }

    fn add_library(&mut self, name: &CStr) -> Status {
        Status::from_code(unsafe { (self.api.add_library)(self.s(), name.as_ptr()) })
    }

    unsafe fn add_symbol(&mut self, name: &CStr, addr: *const c_void) -> Status {
        Status::from_code(unsafe { (self.api.add_symbol)(self.s(), name.as_ptr(), addr) })
    }

    fn add_file(&mut self, path: &CStr) -> Status {
        Status::from_code(unsafe { (self.api.add_file)(self.s(), path.as_ptr()) })
    }

    fn compile_string(&mut self, source: &CStr) -> Status {
        Status::from_code(unsafe { (self.api.compile_string)(self.s(), source.as_ptr()) })
    }

    fn output_file(&mut self, path: &CStr) -> Status {
        Status::from_code(unsafe { (self.api.output_file)(self.s(), path.as_ptr()) })
    }

    fn run(&mut self, argv: &[&CStr]) -> i32 {
        // argv is NULL terminated like a hosted main() expects.
        let mut raw: Vec<*mut c_char> = argv.iter().map(|a| a.as_ptr().cast_mut()).collect();
        raw.push(ptr::null_mut());
        let argc = c_int::try_from(argv.len()).unwrap_or(c_int::MAX);
        unsafe { (self.api.run)(self.s(), argc, raw.as_mut_ptr()) }
    }

    fn relocate(&mut self) -> Status {
        Status::from_code(unsafe { (self.api.relocate)(self.s(), RELOCATE_AUTO) })
    }

    fn get_symbol(&mut self, name: &CStr) -> Option<NonNull<c_void>> {
        NonNull::new(unsafe { (self.api.get_symbol)(self.s(), name.as_ptr()) })
    }

    fn take_diagnostics(&mut self) -> Vec<String> {
        unsafe { std::mem::take(&mut *self.diagnostics.as_ptr()) }
    }

    fn raw_addr(&self) -> usize {
        self.state.as_ptr() as usize
    }
}

impl Drop for TccInstance {
    fn drop(&mut self) {
        unsafe {
            (self.api.delete)(self.s());
            drop(Box::from_raw(self.diagnostics.as_ptr()));
        }
        debug!("tcc state {:#x} deleted", self.raw_addr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_library_is_init_error() {
        let err = LibTcc::open("/nonexistent/libtcc-missing.so").err().unwrap();
        assert!(matches!(err, SessionError::EngineInit(_)));
        assert!(err.to_string().starts_with("couldn't create new context"));
    }

    #[test]
    fn default_candidates_name_libtcc() {
        assert!(!DEFAULT_CANDIDATES.is_empty());
        assert!(DEFAULT_CANDIDATES[0].to_string_lossy().contains("tcc"));
    }

    #[test]
    fn diagnostic_callback_collects_lines() {
        let mut sink: Vec<String> = Vec::new();
        let msg = c"<string>:1: error: ';' expected";
        unsafe {
            collect_diagnostic((&mut sink as *mut Vec<String>).cast(), msg.as_ptr());
            collect_diagnostic(ptr::null_mut(), msg.as_ptr());
            collect_diagnostic((&mut sink as *mut Vec<String>).cast(), ptr::null());
        }
        assert_eq!(sink, vec!["<string>:1: error: ';' expected".to_string()]);
    }
}
