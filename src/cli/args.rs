//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Groundwork - project scaffolding and infrastructure provisioning.
#[derive(Debug, Parser)]
#[command(name = "groundwork")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to an env file with credentials
    #[arg(long, global = true, env = "GROUNDWORK_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Suppress all output except errors
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub silent: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Set up a complete project: repository, files, cloud resources
    Setup(SetupArgs),

    /// Create a single resource without the full pipeline
    #[command(subcommand)]
    Create(CreateCommands),

    /// List available things
    #[command(subcommand)]
    List(ListCommands),
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SetupArgs {
    /// Project name (lowercase letters, digits and hyphens)
    pub name: String,

    /// Template to materialize
    #[arg(short, long, default_value = "webapp")]
    pub template: String,

    /// Create the repository as public instead of private
    #[arg(long)]
    pub public: bool,

    /// Skip repository creation (also skips CI variable injection)
    #[arg(long)]
    pub no_repo: bool,

    /// Database engine to provision
    #[arg(long, default_value = "postgres", conflicts_with = "no_db")]
    pub db: String,

    /// Skip database provisioning
    #[arg(long)]
    pub no_db: bool,

    /// Provision a serverless container from this image
    #[arg(long, value_name = "IMAGE")]
    pub container_image: Option<String>,

    /// Provision an object storage bucket
    #[arg(long)]
    pub bucket: bool,

    /// Skip CI variable injection
    #[arg(long)]
    pub no_ci_variables: bool,

    /// Target directory (defaults to PROJECTS_ROOT_DIR/<name>)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Answer yes to all prompts
    #[arg(short, long)]
    pub yes: bool,
}

/// Single-resource creation commands.
#[derive(Debug, Subcommand)]
pub enum CreateCommands {
    /// Create a source-control repository
    Repo {
        /// Repository name
        name: String,

        /// Create as public instead of private
        #[arg(long)]
        public: bool,
    },

    /// Create a managed database
    Db {
        /// Database (and cluster) name
        name: String,

        /// Database engine
        #[arg(long, default_value = "postgres")]
        engine: String,
    },

    /// Create a serverless container
    Container {
        /// Container name
        name: String,

        /// Image to deploy
        #[arg(long)]
        image: String,
    },

    /// Create an object storage bucket
    Bucket {
        /// Bucket name
        name: String,
    },
}

/// Listing commands.
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List available templates
    Templates,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_args_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn setup_defaults() {
        let cli = Cli::parse_from(["groundwork", "setup", "demo1"]);
        match cli.command {
            Commands::Setup(args) => {
                assert_eq!(args.name, "demo1");
                assert_eq!(args.template, "webapp");
                assert_eq!(args.db, "postgres");
                assert!(!args.public);
                assert!(!args.no_repo);
            }
            _ => panic!("expected setup command"),
        }
    }

    #[test]
    fn silent_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["groundwork", "--silent", "--quiet", "setup", "demo1"]);
        assert!(result.is_err());

        let cli = Cli::parse_from(["groundwork", "--silent", "setup", "demo1"]);
        assert!(cli.silent);
    }

    #[test]
    fn no_db_conflicts_with_db_engine() {
        let result = Cli::try_parse_from(["groundwork", "setup", "demo1", "--db", "x", "--no-db"]);
        assert!(result.is_err());
    }

    #[test]
    fn create_container_requires_image() {
        let result = Cli::try_parse_from(["groundwork", "create", "container", "demo1"]);
        assert!(result.is_err());
    }
}
