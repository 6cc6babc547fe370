use std::{ffi::OsString, path::PathBuf};

use boostdex::{
    OpenMode,
    RunConfig,
    SignalConfiguration,
    signals::SignalPaths,
    tantivy_index::DEFAULT_MEMORY_BUDGET,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "boostdex",
    about = "Build a full-text index weighted by link-graph and anchor signals"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors, hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index every file under a document directory
    Index(IndexArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index --

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Directory (or single file) to index
    #[arg(long)]
    pub docs: PathBuf,

    /// Index directory [default: $BOOSTDEX_INDEX_DIR, else HIndex, AIndex
    /// or index depending on --signals]
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Update an existing index instead of rebuilding it
    #[arg(long)]
    pub update: bool,

    /// Which relevance signals weight the fields
    #[arg(long, value_enum, default_value_t = SignalConfiguration::Plain)]
    pub signals: SignalConfiguration,

    /// Identifier to url table (`id url` per line)
    #[arg(long, default_value = "wiki/id2url")]
    pub urls: PathBuf,

    /// Anchor text table (`id<TAB>text` per line)
    #[arg(long, default_value = "anchor.txt")]
    pub anchors: PathBuf,

    /// Importance score table (`id<TAB>score` per line)
    #[arg(long, default_value = "pagerank.txt")]
    pub pagerank: PathBuf,

    /// Title table (`id<TAB>title` per line); defaults to url segments
    #[arg(long)]
    pub titles: Option<PathBuf>,

    /// Index writer memory budget in bytes
    #[arg(long, default_value_t = DEFAULT_MEMORY_BUDGET)]
    pub memory_budget: usize,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexArgs {
    /// Build the run configuration, consulting `env_index_dir` when no
    /// `--index` was given.
    pub fn to_run_config(&self, env_index_dir: Option<OsString>) -> RunConfig {
        RunConfig {
            index_dir: RunConfig::resolve_index_dir(
                self.index.as_deref(),
                env_index_dir,
                self.signals,
            ),
            docs_root: self.docs.clone(),
            mode: if self.update {
                OpenMode::IncrementalUpdate
            } else {
                OpenMode::FreshBuild
            },
            signals: self.signals,
            signal_paths: SignalPaths {
                urls: self.urls.clone(),
                anchors: self.anchors.clone(),
                importance: self.pagerank.clone(),
                titles: self.titles.clone(),
            },
            memory_budget: self.memory_budget,
        }
    }
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "boostdex",
            &mut std::io::stdout(),
        );
    }
}
