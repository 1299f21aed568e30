// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v1.4
// Date Modified: 2026-10-18
// Author: Lukas Bower

//! Command line front end: one session per invocation.

pub mod args;

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};

use crate::cli::args::{Cli, Command, SessionArgs, SymbolOp};
use crate::config::SessionConfig;
use crate::engine::{Engine, LibTcc, OutputType};
use crate::session::Session;
use crate::{tlc_error, tlc_info};

/// Fold command line flags over the profile named by `--config`.
pub fn resolve_config(args: &SessionArgs) -> anyhow::Result<SessionConfig> {
    let mut cfg = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading profile {}", path.display()))?,
        None => SessionConfig::default(),
    }
    .with_env_overrides();
    if let Some(p) = &args.libtcc {
        cfg.libtcc = Some(p.clone());
    }
    if let Some(p) = &args.lib_path {
        cfg.lib_path = Some(p.clone());
    }
    if let Some(opts) = &args.options {
        cfg.options = Some(match cfg.options.take() {
            Some(base) => format!("{base} {opts}"),
            None => opts.clone(),
        });
    }
    cfg.include_paths.extend(args.include.iter().cloned());
    cfg.sysinclude_paths.extend(args.isystem.iter().cloned());
    // The last flag for a name decides whether it ends up defined.
    for op in args.symbol_ops() {
        match op {
            SymbolOp::Define(name, value) => {
                cfg.undefines.retain(|u| *u != name);
                cfg.defines.insert(name, value);
            }
            SymbolOp::Undefine(name) => {
                cfg.defines.remove(&name);
                if !cfg.undefines.contains(&name) {
                    cfg.undefines.push(name);
                }
            }
        }
    }
    cfg.library_paths.extend(args.library_path.iter().cloned());
    cfg.libraries.extend(args.library.iter().cloned());
    Ok(cfg)
}

fn open_backend(cfg: &SessionConfig) -> anyhow::Result<LibTcc> {
    let tcc = match &cfg.libtcc {
        Some(path) => LibTcc::open(path)?,
        None => LibTcc::load()?,
    };
    Ok(tcc)
}

/// Feed every source to the session. `-` is C read from stdin.
pub fn ingest<E: Engine>(session: &mut Session<E>, sources: &[String]) -> anyhow::Result<()> {
    for src in sources {
        if src == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading source from stdin")?;
            session.compile_string(&text)?.into_result()?;
        } else {
            session.add_file(src)?.into_result()?;
        }
    }
    Ok(())
}

fn input_paths(sources: &[String]) -> Vec<&Path> {
    sources.iter().map(Path::new).collect()
}

fn run_program(session_args: &SessionArgs, sources: &[String], args: &[String]) -> anyhow::Result<i32> {
    let cfg = resolve_config(session_args)?;
    if let Some(kind) = cfg.output_type()? {
        if kind != OutputType::InMemory {
            bail!("profile selects {kind} output; `tlc run` needs memory output");
        }
    }
    let backend = open_backend(&cfg)?;
    let mut session = Session::create(&backend)?;
    cfg.apply(&mut session)?;
    ingest(&mut session, sources)?;
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    let success = session.run(&argv)?.into_result()?;
    session.close()?;
    tlc_info!("libtcc", &input_paths(sources), None, if success { "exit 0" } else { "exit nonzero" });
    Ok(if success { 0 } else { 1 })
}

fn build(session_args: &SessionArgs, sources: &[String], out: &Path, kind: OutputType) -> anyhow::Result<i32> {
    let mut cfg = resolve_config(session_args)?;
    cfg.output = Some(kind.name().to_string());
    let backend = open_backend(&cfg)?;
    let mut session = Session::create(&backend)?;
    cfg.apply(&mut session)?;
    ingest(&mut session, sources)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if let Err(e) = session.output_file(out).and_then(|o| o.into_result()) {
        tlc_error!("libtcc", &input_paths(sources), Some(out), &e.to_string());
        return Err(e.into());
    }
    session.close()?;
    tlc_info!("libtcc", &input_paths(sources), Some(out), kind.name());
    Ok(0)
}

/// Execute a parsed command line, returning the process exit code.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Run { session, sources, args } => run_program(&session, &sources, &args),
        Command::Build { session, sources, out, kind } => build(&session, &sources, &out, kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use crate::config::DefineValue;

    #[test]
    fn flags_extend_defaults() {
        let args = SessionArgs {
            options: Some("-g".into()),
            include: vec![PathBuf::from("inc")],
            define: vec![("N".into(), DefineValue::Text("3".into()))],
            library: vec!["m".into()],
            ..Default::default()
        };
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.options.as_deref(), Some("-g"));
        assert_eq!(cfg.include_paths, vec![PathBuf::from("inc")]);
        assert_eq!(cfg.defines["N"], DefineValue::Text("3".into()));
        assert_eq!(cfg.libraries, vec!["m".to_string()]);
    }

    #[test]
    fn flag_define_overrides_profile_undefine() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("tlc.toml");
        std::fs::write(&profile, "undefines = [\"X\"]\n[defines]\nY = 1\n").unwrap();
        let argv: Vec<OsString> = vec![
            "tlc".into(),
            "run".into(),
            "--config".into(),
            profile.into_os_string(),
            "-DX=2".into(),
            "-UY".into(),
            "main.c".into(),
        ];
        let cli = Cli::try_parse_ordered(argv).unwrap();
        let Command::Run { session, .. } = cli.command else {
            panic!("expected run");
        };
        let cfg = resolve_config(&session).unwrap();
        assert_eq!(cfg.defines.get("X"), Some(&DefineValue::Text("2".into())));
        assert!(!cfg.defines.contains_key("Y"));
        assert_eq!(cfg.undefines, vec!["Y".to_string()]);
    }

    #[test]
    fn later_flag_wins_for_same_name() {
        let cli = Cli::try_parse_ordered(["tlc", "run", "-UX", "-DX", "main.c"]).unwrap();
        let Command::Run { session, .. } = cli.command else {
            panic!("expected run");
        };
        let cfg = resolve_config(&session).unwrap();
        assert_eq!(cfg.defines.get("X"), Some(&DefineValue::Flag(true)));
        assert!(cfg.undefines.is_empty());
    }

    #[test]
    fn missing_profile_is_reported() {
        let args = SessionArgs {
            config: Some(PathBuf::from("/nonexistent/tlc.toml")),
            ..Default::default()
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("loading profile"));
    }
}
