pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use self::commands::{callgraph, cfg, deps, index, obfuscation, patterns, search, xref};

#[derive(Parser)]
#[command(name = "cilscope")]
#[command(about = "Static analysis for CIL/ECMA-335 modules", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output rendering shared by all subcommands.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum XrefQueryKind {
    TypeRefs,
    Calls,
    FieldUsages,
    Overrides,
    InterfaceImpls,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum DepsLevel {
    Assembly,
    Namespace,
    #[default]
    Type,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and print the type/member indexes of a module
    Index {
        /// Serialized module model (JSON) to analyze
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Restrict the listing to one namespace
        #[arg(long)]
        namespace: Option<String>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Build the control-flow graph of one method
    Cfg {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Declaring type full name
        #[arg(long = "type", required = true)]
        type_name: String,

        /// Method name
        #[arg(long, required = true)]
        method: String,

        /// Also compute dominators, post-dominators and control dependence
        #[arg(long, default_value_t = false)]
        dominators: bool,

        /// Also compute liveness and reaching definitions
        #[arg(long, default_value_t = false)]
        dataflow: bool,

        /// Emit a Mermaid diagram instead of JSON
        #[arg(long, default_value_t = false)]
        mermaid: bool,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Build the call graph, optionally reporting recursion cycles
    Callgraph {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report direct/indirect recursion cycles
        #[arg(long, default_value_t = false)]
        recursion: bool,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Cross-reference queries against one target
    Xref {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, required = true)]
        kind: XrefQueryKind,

        /// Target type full name
        #[arg(long = "type", required = true)]
        type_name: String,

        /// Target member name (required for everything but type-refs)
        #[arg(long)]
        member: Option<String>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Build a dependency graph at assembly/namespace/type granularity
    Deps {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "type")]
        level: DepsLevel,

        /// Expand only the neighborhood of this root type
        #[arg(long)]
        root: Option<String>,

        /// Depth cap for root expansion
        #[arg(long)]
        max_depth: Option<usize>,

        /// Report dependency cycles
        #[arg(long, default_value_t = false)]
        cycles: bool,

        /// Emit a Mermaid diagram instead of JSON
        #[arg(long, default_value_t = false)]
        mermaid: bool,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Search types, members, literals, or metadata tokens
    Search {
        #[arg(required = true)]
        module: PathBuf,

        /// Query string (supports + - = ~ prefixes, quotes and /regex/)
        #[arg(required = true)]
        query: String,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force a search mode instead of auto-detection
        #[arg(long)]
        mode: Option<String>,

        #[arg(long)]
        namespace: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Detect design patterns across the module or for one type
    Patterns {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Restrict detection to one type
        #[arg(long = "type")]
        type_name: Option<String>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Score obfuscation indicators for a module
    Obfuscation {
        #[arg(required = true)]
        module: PathBuf,

        /// Optional AnalysisConfig file (JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Index {
            module,
            config,
            namespace,
            format,
        } => index::execute(module, config, namespace, format),
        Commands::Cfg {
            module,
            config,
            type_name,
            method,
            dominators,
            dataflow,
            mermaid,
            format,
        } => cfg::execute(
            module, config, type_name, method, dominators, dataflow, mermaid, format,
        ),
        Commands::Callgraph {
            module,
            config,
            recursion,
            format,
        } => callgraph::execute(module, config, recursion, format),
        Commands::Xref {
            module,
            config,
            kind,
            type_name,
            member,
            format,
        } => xref::execute(module, config, kind, type_name, member, format),
        Commands::Deps {
            module,
            config,
            level,
            root,
            max_depth,
            cycles,
            mermaid,
            format,
        } => deps::execute(
            module, config, level, root, max_depth, cycles, mermaid, format,
        ),
        Commands::Search {
            module,
            query,
            config,
            mode,
            namespace,
            limit,
            format,
        } => search::execute(module, config, query, mode, namespace, limit, format),
        Commands::Patterns {
            module,
            config,
            type_name,
            format,
        } => patterns::execute(module, config, type_name, format),
        Commands::Obfuscation {
            module,
            config,
            format,
        } => obfuscation::execute(module, config, format),
    }
}
