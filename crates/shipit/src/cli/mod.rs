//! CLI definition and command handling

pub mod output;
pub mod prompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use tracing::info;

use shipit_core::config::{load_config, load_config_or_default};
use shipit_core::{Config, CredentialStore, DocumentPaths, Prompter, SystemRunner, VersionDescriptor};
use shipit_tasks::{
    parse_step_list, LiveBackends, Pipeline, PresetGate, PromptGate, RunMode, StepGate,
    StepSelection,
};

use output::ConsoleReporter;
use prompt::TerminalPrompter;

/// Shipit - publish a Chunky release or snapshot
#[derive(Debug, Parser)]
#[command(name = "shipit")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["ftp", "docs", "snapshot"])))]
pub struct Cli {
    /// Version to publish, e.g. 1.4.0 or 1.4.0-beta2 (asked for when omitted)
    #[arg(value_name = "VERSION")]
    pub release: Option<String>,

    /// Only upload the release to the FTP mirror
    #[arg(long)]
    pub ftp: bool,

    /// Only copy the release notes into the documentation repository
    #[arg(long)]
    pub docs: bool,

    /// Build and publish a snapshot instead of a release
    #[arg(long)]
    pub snapshot: bool,

    /// Run every step without asking
    #[arg(short = 'y', long, conflicts_with = "steps")]
    pub yes: bool,

    /// Run only these steps without asking (comma-separated)
    #[arg(long, value_name = "LIST")]
    pub steps: Option<String>,

    /// Publish to the production hosting site when not asking
    #[arg(long)]
    pub production: bool,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Run mode selected by the flags
    pub fn mode(&self) -> RunMode {
        if self.snapshot {
            RunMode::Snapshot
        } else if self.ftp {
            RunMode::MirrorOnly
        } else if self.docs {
            RunMode::DocsOnly
        } else {
            RunMode::Release
        }
    }

    /// Steps preselected on the command line; `None` means ask for each one
    pub fn selection(&self) -> anyhow::Result<Option<StepSelection>> {
        if self.yes {
            return Ok(Some(StepSelection::All));
        }
        match &self.steps {
            Some(list) => Ok(Some(StepSelection::Only(parse_step_list(list)?))),
            None => Ok(None),
        }
    }

    /// Execute the run
    pub fn execute(self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Failed to enter {}", dir.display()))?;
        }
        let root = std::env::current_dir()?;
        let config = self.load_config(&root)?;
        let mode = self.mode();
        let selection = self.selection()?;

        let prompter: Arc<dyn Prompter> = Arc::new(TerminalPrompter);
        let input = match &self.release {
            Some(version) => version.clone(),
            None => prompter.input("Enter version")?,
        };
        let version =
            VersionDescriptor::load(input.trim(), &DocumentPaths::from_config(&config, &root))?;

        info!(
            mode = %mode,
            version = %version.full(),
            milestone = %version.milestone(),
            "starting run"
        );
        let noun = if mode == RunMode::Snapshot {
            "snapshot"
        } else {
            "version"
        };
        println!(
            "Ready to build {} {}!",
            noun,
            output::version_style().apply_to(version.full())
        );

        let gate: Box<dyn StepGate> = match selection {
            Some(selection) => Box::new(PresetGate::new(selection, self.production)),
            None => {
                if self.production {
                    output::warning("--production only applies with --yes or --steps");
                }
                Box::new(PromptGate::new(prompter.clone()))
            }
        };

        let mut credentials =
            CredentialStore::open(root.join(&config.paths.credentials), prompter.clone())?;
        let backends = LiveBackends::new(&config);
        let reporter = ConsoleReporter::new(self.quiet);
        let runner = SystemRunner::new(&root);
        let pipeline = Pipeline::new(
            &config,
            &root,
            &backends,
            gate.as_ref(),
            &reporter,
            &runner,
            prompter,
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let summary = runtime.block_on(pipeline.run(mode, &version, &mut credentials))?;

        if !summary.failed.is_empty() {
            let failed: Vec<_> = summary.failed.iter().map(|s| s.name()).collect();
            output::warning(&format!("Some steps failed: {}", failed.join(", ")));
        }
        output::success("All done.");
        Ok(())
    }

    fn load_config(&self, root: &Path) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => load_config(&root.join(path))
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => {
                let (config, path) =
                    load_config_or_default(root).context("Failed to load configuration")?;
                if path.is_none() && !self.quiet {
                    output::warning("No configuration found, using defaults.");
                }
                Ok(config)
            }
        }
    }
}
