use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "issue-sidebar")]
#[command(about = "Open GitHub issues of one repository, right in your terminal", long_about = None)]
pub struct Cli {
    /// Path to the settings file (defaults to the platform config directory)
    #[arg(long, env = "ISSUE_SIDEBAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// GitHub personal access token; overrides the stored token without saving it
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API root, for GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a GitHub personal access token
    SetToken,

    /// Choose the repository whose issues are listed
    #[command(name = "select-repository", alias = "select-repo")]
    SelectRepo {
        /// Offer the repositories of this user or organization instead of your own
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show the open issues of the selected repository
    #[command(visible_alias = "list")]
    Refresh,

    /// Keep showing the issue list, refreshing periodically and on settings changes
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 60)]
        interval: u64,
    },

    /// Check the token, its scopes and the repositories it can see
    Diagnose,

    /// Close an issue
    #[command(name = "close-issue", alias = "close")]
    Close {
        /// Issue number
        number: u64,

        /// Repository owner (defaults to the selected repository)
        #[arg(long)]
        owner: Option<String>,

        /// Repository name (defaults to the selected repository)
        #[arg(long)]
        repo: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Comment on an issue
    #[command(name = "add-comment", alias = "comment")]
    Comment {
        /// Issue number
        number: u64,

        /// Comment text (Markdown); prompted for when omitted
        #[arg(short, long)]
        body: Option<String>,

        /// Repository owner (defaults to the selected repository)
        #[arg(long)]
        owner: Option<String>,

        /// Repository name (defaults to the selected repository)
        #[arg(long)]
        repo: Option<String>,
    },
}
