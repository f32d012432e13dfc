use crate::assembler::Assembly;
use crate::config::Config;
use crate::organizer::Organizer;
use crate::publisher::{build_publisher, LocalPublisher, Publisher};
use crate::report::PublishReport;
use crate::ui::{render_plan, render_rules, PublishWizard};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "dir2gh")]
#[command(version, about = "Organize a directory of loose files into projects and publish them as git repositories", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true, env = "DIR2GH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Staging directory (default: ./organized_projects)
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output: Option<PathBuf>,

    /// GitHub user or organization that owns the repositories
    #[arg(long, value_name = "NAME", global = true, env = "DIR2GH_OWNER")]
    pub owner: Option<String>,

    /// Create private repositories
    #[arg(long, global = true)]
    pub private: bool,

    /// Groups smaller than this are merged into misc
    #[arg(long, value_name = "N", global = true)]
    pub min_group_size: Option<usize>,

    /// Don't ask for confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Print plans and reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Organize, stage and publish every project
    Publish {
        /// Directory to organize
        input: PathBuf,
    },

    /// Organize and stage into local git repositories without pushing
    Organize {
        /// Directory to organize
        input: PathBuf,
    },

    /// Show how files would be grouped; writes nothing
    Plan {
        /// Directory to organize
        input: PathBuf,
    },

    /// Publish each subdirectory of an already organized directory
    PushStaged {
        /// Directory holding one subdirectory per project
        dir: PathBuf,
    },

    /// Show the effective classification rules
    Rules,

    /// Write the default configuration
    InitConfig {
        /// Destination (default: ./dir2gh.toml)
        path: Option<PathBuf>,
    },
}

impl Args {
    /// Filter used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Returns the process exit code.
pub fn run(args: Args) -> Result<i32> {
    if let Commands::InitConfig { path } = &args.command {
        let path = path.clone().unwrap_or_else(|| PathBuf::from("dir2gh.toml"));
        init_config(&path, args.quiet)?;
        return Ok(0);
    }

    let config = load_config(&args)?;
    let organizer = Organizer::new(config)
        .context("Invalid configuration")?
        .with_progress(!args.quiet && !args.json);

    match &args.command {
        Commands::Plan { input } => plan(&organizer, input, &args),
        Commands::Organize { input } => organize(&organizer, input, &args),
        Commands::Publish { input } => publish(&organizer, input, &args),
        Commands::PushStaged { dir } => push_staged(&organizer, dir, &args),
        Commands::Rules => {
            let classify = &organizer.config().classify;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&classify.rules)?);
            } else {
                print!(
                    "{}",
                    render_rules(organizer.classifier().rules(), &classify.generic_dir_names)
                );
            }
            Ok(0)
        }
        Commands::InitConfig { .. } => Ok(0),
    }
}

/// File (or defaults), then command-line overrides.
pub fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(output) = &args.output {
        config.staging.root = output.clone();
    }
    if let Some(owner) = &args.owner {
        config.publish.owner = owner.clone();
    }
    if args.private {
        config.publish.private = true;
    }
    if let Some(size) = args.min_group_size {
        config.assemble.min_group_size = size;
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn init_config(path: &Path, quiet: bool) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let content = Config::default().to_toml_string()?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    if !quiet {
        println!("{} Wrote default configuration to {}", "✓".green(), path.display());
    }
    Ok(())
}

fn assemble(organizer: &Organizer, input: &Path) -> Result<Assembly> {
    let assembly = organizer
        .plan(input)
        .with_context(|| format!("Failed to scan {}", input.display()))?;

    if assembly.total_files() == 0 {
        bail!("No files found in {}", input.display());
    }
    Ok(assembly)
}

fn show_plan(assembly: &Assembly, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(assembly)?);
    } else if !args.quiet {
        print!("{}", render_plan(assembly));
    }
    Ok(())
}

fn show_report(report: &PublishReport, args: &Args) -> Result<i32> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if !args.quiet {
        report.print();
    }
    Ok(report.exit_code())
}

fn plan(organizer: &Organizer, input: &Path, args: &Args) -> Result<i32> {
    let assembly = assemble(organizer, input)?;
    show_plan(&assembly, args)?;
    Ok(0)
}

fn organize(organizer: &Organizer, input: &Path, args: &Args) -> Result<i32> {
    let mut assembly = assemble(organizer, input)?;
    if !args.json {
        show_plan(&assembly, args)?;
    }

    let (root, failures) = organizer
        .stage(&mut assembly)
        .context("Failed to prepare staging directory")?;

    let publish = &organizer.config().publish;
    let mut publisher = LocalPublisher::new(publish.owner.clone(), publish.commit_message.clone());
    let mut report = organizer.publish_all(&assembly, &failures, &mut publisher);
    report.staging_root = Some(root);

    show_report(&report, args)
}

fn publish(organizer: &Organizer, input: &Path, args: &Args) -> Result<i32> {
    let mut assembly = assemble(organizer, input)?;
    if !args.json {
        show_plan(&assembly, args)?;
    }

    let mut publisher = build_publisher(&organizer.config().publish)
        .context("No usable publishing backend")?;

    if !args.yes && !PublishWizard::new().review(&mut assembly, publisher.name())? {
        println!("Cancelled.");
        return Ok(0);
    }

    let (root, failures) = organizer
        .stage(&mut assembly)
        .context("Failed to prepare staging directory")?;

    let mut report = organizer.publish_all(&assembly, &failures, publisher.as_mut());
    report.staging_root = Some(root);

    show_report(&report, args)
}

fn push_staged(organizer: &Organizer, dir: &Path, args: &Args) -> Result<i32> {
    let mut publisher: Box<dyn Publisher> = build_publisher(&organizer.config().publish)
        .context("No usable publishing backend")?;

    let report = if args.yes {
        organizer
            .publish_staged(dir, publisher.as_mut())
            .with_context(|| format!("Failed to read {}", dir.display()))?
    } else {
        let groups = organizer
            .staged_groups(dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?;
        let mut assembly = Assembly {
            groups,
            ..Default::default()
        };

        if !PublishWizard::new().review(&mut assembly, publisher.name())? {
            println!("Cancelled.");
            return Ok(0);
        }

        let mut report = organizer.publish_all(&assembly, &[], publisher.as_mut());
        report.staging_root = Some(dir.to_path_buf());
        report
    };

    show_report(&report, args)
}
