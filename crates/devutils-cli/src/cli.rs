//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use devutils_core::RemarkFamily;
use devutils_models::OutputMode;

/// Version string with git hash and build date, e.g. "0.1.0 (abc1234, 2026-01-29)".
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("DEVUTILS_GIT_HASH");
    const BUILD_DATE: &str = env!("DEVUTILS_BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// DevUtils - inspect what the C/C++ compiler made of your code
#[derive(Parser, Debug)]
#[command(name = "devutils")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for generated listings and preprocessed files
    #[arg(long, global = true)]
    pub artifact_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract compiler optimization remarks from a build log
    Diagnostics {
        /// Build log to scan
        #[arg(required = true)]
        log: PathBuf,

        /// Remark family to extract
        #[arg(short, long, default_value = "vectorizer")]
        remark: RemarkArg,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Find a function and source line in a generated file
    Locate {
        /// Assembly listing or preprocessed source
        #[arg(required = true)]
        artifact: PathBuf,

        /// Kind of generated file
        #[arg(short, long, default_value = "asm")]
        mode: ModeArg,

        /// Function signature to anchor on
        #[arg(long)]
        function: Option<String>,

        /// Source line to anchor on
        #[arg(long)]
        line: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Feed recorded build events through the build monitor
    Replay {
        /// JSON-lines file of build events
        #[arg(required = true)]
        events: PathBuf,

        /// Build log to scan for remarks after each finished build
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile one source file and open its listing or preprocessed output
    Show {
        /// Source or header file
        #[arg(required = true)]
        file: PathBuf,

        /// 1-based cursor line
        #[arg(short, long, default_value_t = 1)]
        line: usize,

        /// Kind of generated file
        #[arg(short, long, default_value = "asm")]
        mode: ModeArg,

        /// Enclosing function signature
        #[arg(long)]
        function: Option<String>,

        /// Project name (default: file stem)
        #[arg(short, long)]
        project: Option<String>,

        /// Build configuration
        #[arg(long, default_value = "Debug")]
        configuration: String,

        /// Target platform
        #[arg(long, default_value = "x64")]
        platform: String,

        /// Compiler to use (default: first of c++, g++, clang++, cc on PATH)
        #[arg(long, env = "DEVUTILS_COMPILER")]
        compiler: Option<PathBuf>,
    },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Generated file kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    #[default]
    Asm,
    Preprocessed,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Asm => OutputMode::Assembly,
            ModeArg::Preprocessed => OutputMode::Preprocessed,
        }
    }
}

/// Compiler remark family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RemarkArg {
    #[default]
    Vectorizer,
    Parallelizer,
}

impl From<RemarkArg> for RemarkFamily {
    fn from(remark: RemarkArg) -> Self {
        match remark {
            RemarkArg::Vectorizer => RemarkFamily::LOOP_NOT_VECTORIZED,
            RemarkArg::Parallelizer => RemarkFamily::LOOP_NOT_PARALLELIZED,
        }
    }
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_show() {
        let cli = Cli::parse_from(["devutils", "show", "src/main.cpp", "--line", "42"]);
        match cli.command {
            Commands::Show {
                file,
                line,
                mode,
                configuration,
                platform,
                ..
            } => {
                assert_eq!(file, PathBuf::from("src/main.cpp"));
                assert_eq!(line, 42);
                assert_eq!(mode, ModeArg::Asm);
                assert_eq!(configuration, "Debug");
                assert_eq!(platform, "x64");
            }
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_cli_parse_locate_preprocessed() {
        let cli = Cli::parse_from([
            "devutils",
            "locate",
            "out.cpp",
            "--mode",
            "preprocessed",
            "--function",
            "compute",
        ]);
        match cli.command {
            Commands::Locate { mode, function, line, .. } => {
                assert_eq!(OutputMode::from(mode), OutputMode::Preprocessed);
                assert_eq!(function.as_deref(), Some("compute"));
                assert!(line.is_none());
            }
            _ => panic!("Expected Locate command"),
        }
    }

    #[test]
    fn test_cli_parse_diagnostics_remark() {
        let cli = Cli::parse_from(["devutils", "diagnostics", "build.log", "-r", "parallelizer"]);
        match cli.command {
            Commands::Diagnostics { remark, .. } => {
                assert_eq!(RemarkFamily::from(remark).id, "C5012");
            }
            _ => panic!("Expected Diagnostics command"),
        }
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["devutils", "-vv", "replay", "events.jsonl"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
