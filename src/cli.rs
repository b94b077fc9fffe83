use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "promptdex",
    about = "Fuzzy search across your prompt and context template repositories"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage template repositories
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },
    /// Load indexed templates into the catalog
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Search templates by keyword
    Search(SearchArgs),
    /// Show a single template by reference
    Show(ShowArgs),
    /// Manage the stored field weights
    Weights {
        #[command(subcommand)]
        action: WeightsAction,
    },
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Repository subcommands --

#[derive(Debug, Subcommand)]
pub enum RepoAction {
    /// Register a template repository
    Add {
        /// Repository name, used as the template source group
        name: String,
        /// Where the repository lives (URL or local path)
        location: String,
    },
    /// Remove a repository and all its indexed templates
    Remove {
        /// Name of the repository to remove
        name: String,
    },
    /// List all registered repositories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Index subcommands --

#[derive(Debug, Subcommand)]
pub enum IndexAction {
    /// Replace a repository's templates with the contents of JSON files
    Import {
        /// Repository the templates belong to
        #[arg(short = 'r', long)]
        repo: String,
        /// JSON files, each an array of templates
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show catalog statistics
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Weights --

#[derive(Debug, Subcommand)]
pub enum WeightsAction {
    /// Show the effective field weights
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist a weight for one field (id, name, tags, summary)
    Set {
        field: String,
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Clear all stored weights (revert to defaults)
    Clear,
    /// Persist the default number of search results
    Limit {
        max_results: usize,
    },
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search keyword; omit to list every template
    pub query: Option<String>,

    /// Only templates of this type (prompt or context)
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Only templates carrying this label (repeatable)
    #[arg(short = 'l', long = "label")]
    pub labels: Vec<String>,

    /// Require every --label instead of any
    #[arg(long)]
    pub label_all: bool,

    /// Search only within this repository
    #[arg(short = 'r', long)]
    pub repo: Option<String>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,

    /// Minimum raw field score for a field to count as matched
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Disable pinyin matching for Chinese text
    #[arg(long)]
    pub no_pinyin: bool,

    /// Override a field weight for this search (e.g. name=2)
    #[arg(short = 'w', long = "weight")]
    pub weights: Vec<String>,

    /// Output results as JSON
    #[arg(long, conflicts_with = "ids")]
    pub json: bool,

    /// Output only qualified template ids (one per line)
    #[arg(long)]
    pub ids: bool,
}

// -- Show --

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Template reference: repo:id or a bare id
    pub reference: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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
            "promptdex",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["promptdex", "search", "review"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query.as_deref(), Some("review"));
                assert_eq!(args.kind, None);
                assert!(args.labels.is_empty());
                assert!(!args.label_all);
                assert_eq!(args.max_results, None);
                assert_eq!(args.threshold, None);
                assert!(!args.no_pinyin);
                assert!(!args.json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn parse_search_flags() {
        let cli = Cli::parse_from([
            "promptdex",
            "search",
            "qd",
            "-t",
            "prompt",
            "-l",
            "react",
            "-l",
            "frontend",
            "--label-all",
            "--repo",
            "team",
            "-n",
            "5",
            "--threshold",
            "-50",
            "-w",
            "name=2",
            "--ids",
        ]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.kind.as_deref(), Some("prompt"));
                assert_eq!(args.labels, vec!["react", "frontend"]);
                assert!(args.label_all);
                assert_eq!(args.repo.as_deref(), Some("team"));
                assert_eq!(args.max_results, Some(5));
                assert_eq!(args.threshold, Some(-50.0));
                assert_eq!(args.weights, vec!["name=2"]);
                assert!(args.ids);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn json_and_ids_conflict() {
        let parsed =
            Cli::try_parse_from(["promptdex", "search", "--json", "--ids"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_negative_weight() {
        let cli =
            Cli::parse_from(["promptdex", "weights", "set", "summary", "-1.5"]);
        match cli.command {
            Command::Weights {
                action: WeightsAction::Set { field, value },
            } => {
                assert_eq!(field, "summary");
                assert_eq!(value, "-1.5");
            }
            _ => panic!("expected weights set"),
        }
    }

    #[test]
    fn parse_weights_limit() {
        let cli = Cli::parse_from(["promptdex", "weights", "limit", "50"]);
        assert!(matches!(
            cli.command,
            Command::Weights {
                action: WeightsAction::Limit { max_results: 50 }
            }
        ));
    }

    #[test]
    fn import_requires_files() {
        let parsed = Cli::try_parse_from([
            "promptdex", "index", "import", "--repo", "team",
        ]);
        assert!(parsed.is_err());
    }
}
