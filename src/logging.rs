// CLASSIFICATION: COMMUNITY
// Filename: logging.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-18

use std::path::Path;

use env_logger::Env;
use log::{Level, LevelFilter};

/// Install the process logger. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

/// Emit one invocation record in the `key=value` layout used by build logs.
pub fn record(level: Level, backend: &str, inputs: &[&Path], out: Option<&Path>, msg: &str) {
    let inputs: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
    let out = out.map_or_else(|| "memory".to_string(), |p| p.display().to_string());
    log::log!(
        target: "tlc::invocation",
        level,
        "backend={backend} input={inputs:?} output={out} msg={msg}"
    );
}

#[macro_export]
macro_rules! tlc_info {
    ($backend:expr, $inputs:expr, $out:expr, $msg:expr $(,)?) => {
        $crate::logging::record(::log::Level::Info, $backend, $inputs, $out, $msg)
    };
}

#[macro_export]
macro_rules! tlc_error {
    ($backend:expr, $inputs:expr, $out:expr, $msg:expr $(,)?) => {
        $crate::logging::record(::log::Level::Error, $backend, $inputs, $out, $msg)
    };
}
