// CLASSIFICATION: COMMUNITY
// Filename: args.rs v1.3
// Date Modified: 2026-10-18
// Author: Lukas Bower

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};

use crate::config::DefineValue;
use crate::engine::OutputType;

#[derive(Debug, Parser)]
#[command(name = "tlc", author, version, about = "Compile and run C through an in-process libtcc")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Debug logging unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Parse `argv` like [`Parser::try_parse_from`], also recording how
    /// `-D` and `-U` interleave so the later flag for a name wins.
    pub fn try_parse_ordered<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(argv)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        if let Some((_, sub)) = matches.subcommand() {
            cli.command.session_mut().record_symbol_order(sub);
        }
        Ok(cli)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile in memory and run main().
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// C sources, objects or libraries; `-` reads C from stdin.
        #[arg(required = true)]
        sources: Vec<String>,
        /// Arguments passed to the program after argv[0].
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Compile and link to a file.
    Build {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(required = true)]
        sources: Vec<String>,
        #[arg(short = 'o', long = "output")]
        out: PathBuf,
        /// exe, dll, obj or preprocess.
        #[arg(long, default_value = "exe", value_parser = parse_kind)]
        kind: OutputType,
    },
}

impl Command {
    pub fn session_mut(&mut self) -> &mut SessionArgs {
        match self {
            Command::Run { session, .. } | Command::Build { session, .. } => session,
        }
    }
}

/// One `-D` or `-U` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOp {
    Define(String, DefineValue),
    Undefine(String),
}

/// Flags shared by every command that opens a session.
#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// TOML session profile applied before the flags below.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// libtcc shared object to load.
    #[arg(long)]
    pub libtcc: Option<PathBuf>,
    /// Engine runtime library path.
    #[arg(long = "lib-path")]
    pub lib_path: Option<PathBuf>,
    /// Raw engine options, e.g. "-Wall -g".
    #[arg(long, allow_hyphen_values = true)]
    pub options: Option<String>,
    #[arg(short = 'I', value_name = "DIR")]
    pub include: Vec<PathBuf>,
    #[arg(long = "isystem", value_name = "DIR")]
    pub isystem: Vec<PathBuf>,
    /// NAME or NAME=VALUE.
    #[arg(short = 'D', value_name = "NAME[=VALUE]", value_parser = parse_define)]
    pub define: Vec<(String, DefineValue)>,
    #[arg(short = 'U', value_name = "NAME")]
    pub undefine: Vec<String>,
    #[arg(short = 'L', value_name = "DIR")]
    pub library_path: Vec<PathBuf>,
    #[arg(short = 'l', value_name = "LIB")]
    pub library: Vec<String>,
    /// `-D` and `-U` in command line order; empty when not parsed from argv.
    #[arg(skip)]
    pub symbol_order: Vec<SymbolOp>,
}

impl SessionArgs {
    fn record_symbol_order(&mut self, matches: &ArgMatches) {
        let mut ops: Vec<(usize, SymbolOp)> = Vec::new();
        if let (Some(idx), Some(vals)) = (
            matches.indices_of("define"),
            matches.get_many::<(String, DefineValue)>("define"),
        ) {
            ops.extend(idx.zip(vals.map(|(n, v)| SymbolOp::Define(n.clone(), v.clone()))));
        }
        if let (Some(idx), Some(vals)) = (
            matches.indices_of("undefine"),
            matches.get_many::<String>("undefine"),
        ) {
            ops.extend(idx.zip(vals.map(|n| SymbolOp::Undefine(n.clone()))));
        }
        ops.sort_by_key(|(i, _)| *i);
        self.symbol_order = ops.into_iter().map(|(_, op)| op).collect();
    }

    /// Symbol flags in the order they take effect.
    pub fn symbol_ops(&self) -> Vec<SymbolOp> {
        if !self.symbol_order.is_empty() {
            return self.symbol_order.clone();
        }
        self.define
            .iter()
            .map(|(n, v)| SymbolOp::Define(n.clone(), v.clone()))
            .chain(self.undefine.iter().cloned().map(SymbolOp::Undefine))
            .collect()
    }
}

fn parse_kind(s: &str) -> Result<OutputType, String> {
    match s.parse::<OutputType>() {
        Ok(OutputType::InMemory) => Err("memory output cannot be built; use `tlc run`".into()),
        Ok(kind) => Ok(kind),
        Err(e) => Err(e.to_string()),
    }
}

/// `NAME` defines the engine default, `NAME=VALUE` defines VALUE verbatim.
pub fn parse_define(s: &str) -> Result<(String, DefineValue), String> {
    let (name, value) = match s.split_once('=') {
        Some((name, value)) => (name, DefineValue::Text(value.to_string())),
        None => (s, DefineValue::Flag(true)),
    };
    if name.is_empty() {
        return Err(format!("missing macro name in {s:?}"));
    }
    Ok((name.to_string(), value))
}
