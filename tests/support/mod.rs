// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-18

//! Recording engine used by the session tests.

#![allow(dead_code)]

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tlc::{Backend, Engine, OutputType, Session, SessionError, Status};

/// Source text the fake refuses to compile.
pub const NOT_C: &str = "this is not C";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LibPath(String),
    Options(String),
    Include(String),
    SysInclude(String),
    Define(String, Option<String>),
    Undefine(String),
    OutputType(OutputType),
    LibraryPath(String),
    Library(String),
    Symbol(String),
    AddFile(String),
    Compile(String),
    OutputFile(String),
    Run(Vec<String>),
    Relocate,
    GetSymbol(String),
}

/// Shared view of what the engine saw.
#[derive(Clone, Default)]
pub struct Probe {
    calls: Arc<Mutex<Vec<Call>>>,
    paths: Arc<Mutex<Vec<Vec<u8>>>>,
    drops: Arc<AtomicUsize>,
    exit_code: Arc<AtomicI32>,
}

impl Probe {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Exact bytes of every path argument, in call order.
    pub fn raw_paths(&self) -> Vec<Vec<u8>> {
        self.paths.lock().unwrap().clone()
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn set_exit_code(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn push_path(&self, path: &CStr) {
        self.paths.lock().unwrap().push(path.to_bytes().to_vec());
    }
}

pub struct FakeEngine {
    probe: Probe,
    diagnostics: Vec<String>,
}

fn text(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl Engine for FakeEngine {
    fn set_lib_path(&mut self, path: &CStr) {
        self.probe.push_path(path);
        self.probe.push(Call::LibPath(text(path)));
    }

    fn set_options(&mut self, options: &CStr) {
        self.probe.push(Call::Options(text(options)));
    }

    fn add_include_path(&mut self, path: &CStr) {
        self.probe.push_path(path);
        self.probe.push(Call::Include(text(path)));
    }

    fn add_sysinclude_path(&mut self, path: &CStr) {
        self.probe.push_path(path);
        self.probe.push(Call::SysInclude(text(path)));
    }

    fn define_symbol(&mut self, name: &CStr, value: Option<&CStr>) {
        self.probe.push(Call::Define(text(name), value.map(text)));
    }

    fn undefine_symbol(&mut self, name: &CStr) {
        self.probe.push(Call::Undefine(text(name)));
    }

    fn set_output_type(&mut self, kind: OutputType) -> Status {
        self.probe.push(Call::OutputType(kind));
        Status::Ok
    }

    fn add_library_path(&mut self, path: &CStr) -> Status {
        self.probe.push_path(path);
        self.probe.push(Call::LibraryPath(text(path)));
        Status::Ok
    }

    fn add_library(&mut self, name: &CStr) -> Status {
        self.probe.push(Call::Library(text(name)));
        if name.to_bytes() == b"missing" {
            self.diagnostics.push("library 'missing' not found".into());
            return Status::Failed;
        }
        Status::Ok
    }

    unsafe fn add_symbol(&mut self, name: &CStr, _addr: *const c_void) -> Status {
        self.probe.push(Call::Symbol(text(name)));
        Status::Ok
    }

    fn add_file(&mut self, path: &CStr) -> Status {
        self.probe.push_path(path);
        let path = text(path);
        self.probe.push(Call::AddFile(path.clone()));
        if path.ends_with(".bad") {
            self.diagnostics.push(format!("{path}:1: error: unexpected token"));
            return Status::Failed;
        }
        Status::Ok
    }

    fn compile_string(&mut self, source: &CStr) -> Status {
        let source = text(source);
        self.probe.push(Call::Compile(source.clone()));
        if source.contains(NOT_C) {
            self.diagnostics
                .push("<string>:1: error: declaration expected".into());
            return Status::Failed;
        }
        Status::Ok
    }

    fn output_file(&mut self, path: &CStr) -> Status {
        self.probe.push_path(path);
        let path = text(path);
        self.probe.push(Call::OutputFile(path.clone()));
        match std::fs::write(&path, b"fake artifact") {
            Ok(()) => Status::Ok,
            Err(e) => {
                self.diagnostics.push(format!("could not write '{path}': {e}"));
                Status::Failed
            }
        }
    }

    fn run(&mut self, argv: &[&CStr]) -> i32 {
        self.probe
            .push(Call::Run(argv.iter().map(|a| text(a)).collect()));
        self.probe.exit_code.load(Ordering::SeqCst)
    }

    fn relocate(&mut self) -> Status {
        self.probe.push(Call::Relocate);
        Status::Ok
    }

    fn get_symbol(&mut self, name: &CStr) -> Option<NonNull<c_void>> {
        let name = text(name);
        self.probe.push(Call::GetSymbol(name.clone()));
        (name == "main").then(NonNull::dangling)
    }

    fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    fn raw_addr(&self) -> usize {
        0x1000
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.probe.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub probe: Probe,
    pub exhausted: bool,
}

impl Backend for FakeBackend {
    type Instance = FakeEngine;

    fn name(&self) -> &str {
        "fake"
    }

    fn instantiate(&self) -> Result<FakeEngine, SessionError> {
        if self.exhausted {
            return Err(SessionError::EngineInit("out of memory".into()));
        }
        Ok(FakeEngine {
            probe: self.probe.clone(),
            diagnostics: Vec::new(),
        })
    }
}

pub fn open() -> (Session<FakeEngine>, Probe) {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = FakeBackend::default();
    let session = Session::create(&backend).expect("fake backend never fails");
    (session, backend.probe)
}
