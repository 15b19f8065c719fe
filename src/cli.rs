// Command-line surface. Every command that needs a project accepts
// `--project` with a (partial) project name; when it is omitted the name is
// taken from `.slyftproject` in the working directory.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slyft", version)]
#[command(about = "slyft.io - The Service Layer for Things")]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Skip the check for a newer client release
    #[arg(long, global = true)]
    pub no_update_check: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// User/Account management
    #[command(subcommand, visible_alias = "u")]
    User(UserCommand),
    /// Project management
    #[command(subcommand, visible_alias = "p")]
    Project(ProjectCommand),
    /// Asset management
    #[command(subcommand, visible_alias = "a")]
    Asset(AssetCommand),
    /// Build and validation jobs
    #[command(subcommand, visible_alias = "j")]
    Job(JobCommand),
    /// Ping the Slyft service
    Ping,
    /// Show program info
    Info,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register yourself
    #[command(visible_alias = "r")]
    Register,
    /// Login with your credentials
    #[command(visible_alias = "l")]
    Login,
    /// Log out from your session
    Logout,
    /// Delete your account
    Delete,
}

/// Project selector shared by most commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArg {
    /// Name (or part of it) of a project
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Either one project or everything.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Name (or part of it) of a project
    #[arg(short, long, conflicts_with = "all")]
    pub project: Option<String>,

    /// Include everything you own (do not combine with -p)
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a new project
    #[command(visible_alias = "c")]
    Create {
        /// Name of the new project
        #[arg(short, long)]
        name: Option<String>,
        /// Free-text description
        #[arg(short = 'D', long)]
        details: Option<String>,
    },
    /// List all your projects
    #[command(visible_alias = "ls")]
    List,
    /// Show details of a project
    #[command(visible_alias = "s")]
    Show(ProjectArg),
    /// Delete a project
    #[command(visible_alias = "d")]
    Delete(ProjectArg),
}

#[derive(Subcommand, Debug)]
pub enum AssetCommand {
    /// Add assets to a project
    #[command(visible_alias = "a")]
    Add {
        #[command(flatten)]
        project: ProjectArg,
        /// Path to a single file to upload
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Files to upload as assets
        files: Vec<PathBuf>,
    },
    /// List your assets
    #[command(visible_alias = "ls")]
    List(ScopeArgs),
    /// Download a single asset
    #[command(visible_alias = "g")]
    Get {
        #[command(flatten)]
        project: ProjectArg,
        /// Name of the asset to download
        #[arg(short, long)]
        file: String,
    },
    /// Remove an asset from a project
    #[command(visible_alias = "d")]
    Delete {
        #[command(flatten)]
        project: ProjectArg,
        /// Choose from the last COUNT assets (0 lists all)
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Re-upload assets whose local file changed since the last upload
    #[command(visible_alias = "u")]
    Update(ScopeArgs),
}

/// Options for submitting a job.
#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Name (or part of it) of a project
    #[arg(short, long)]
    pub project: String,

    /// Wait up to SECONDS for the job to finish
    #[arg(short, long, value_name = "SECONDS")]
    pub wait: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Build a project
    #[command(visible_alias = "b")]
    Build(SubmitArgs),
    /// Validate a project
    #[command(visible_alias = "v")]
    Validate(SubmitArgs),
    /// Show job status
    #[command(visible_alias = "s")]
    Status(ScopeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_asset_add_with_many_files() {
        let cli = Cli::parse_from(["slyft", "asset", "add", "-p", "demo", "a.json", "b.yaml"]);
        match cli.command {
            Some(Commands::Asset(AssetCommand::Add { project, file, files })) => {
                assert_eq!(project.project.as_deref(), Some("demo"));
                assert!(file.is_none());
                assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b.yaml")]);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn aliases_and_global_flags() {
        let cli = Cli::parse_from(["slyft", "j", "b", "-p", "demo", "--wait", "30", "-d"]);
        assert!(cli.debug);
        match cli.command {
            Some(Commands::Job(JobCommand::Build(args))) => {
                assert_eq!(args.project, "demo");
                assert_eq!(args.wait, Some(30));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn project_and_all_conflict() {
        assert!(Cli::try_parse_from(["slyft", "asset", "list", "-p", "x", "--all"]).is_err());
    }

    #[test]
    fn delete_count_defaults_to_one() {
        let cli = Cli::parse_from(["slyft", "asset", "delete"]);
        match cli.command {
            Some(Commands::Asset(AssetCommand::Delete { count, .. })) => assert_eq!(count, 1),
            other => panic!("unexpected parse: {other:?}"),
        }
    }
}
