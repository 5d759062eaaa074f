use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rapi")]
#[command(about = "Profile-aware REST API client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Connection profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override the API username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Override the API password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Print each request to stderr before it is issued
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a resource, with optional filters, sorting, and paging
    #[command(alias = "ls")]
    List {
        /// Resource name (e.g. users)
        resource: String,

        /// Filter as key=value (repeatable)
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Sort field
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page number to fetch
        #[arg(long, conflicts_with = "all")]
        page: Option<usize>,

        /// Items per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Walk every page and print each item
        #[arg(short, long)]
        all: bool,

        /// Stop after this many pages (with --all)
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Fetch a single record by id
    Get {
        /// Resource name (e.g. users)
        resource: String,

        /// Record id
        id: String,
    },

    /// Create a record from a JSON body
    #[command(alias = "new")]
    Create {
        /// Resource name (e.g. users)
        resource: String,

        /// JSON body
        #[arg(short, long)]
        data: String,
    },

    /// Update a record from a JSON body
    Update {
        /// Resource name (e.g. users)
        resource: String,

        /// Record id
        id: String,

        /// JSON body
        #[arg(short, long)]
        data: String,
    },

    /// Delete a record by id
    #[command(alias = "rm")]
    Delete {
        /// Resource name (e.g. users)
        resource: String,

        /// Record id
        id: String,
    },

    /// Invoke a resource-specific verb (e.g. activate)
    Action {
        /// Resource name (e.g. users)
        resource: String,

        /// Record id
        id: String,

        /// Action verb appended to the record path
        action: String,

        /// HTTP method for the action
        #[arg(short = 'X', long, default_value = "POST")]
        method: String,

        /// Optional JSON body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Show or set profile configuration
    Config {
        /// Configuration key (url, username, password, timeout, debug,
        /// max-retries, backoff)
        key: Option<String>,

        /// Value to set (if omitted, prints the current value)
        value: Option<String>,
    },

    /// Check that the configured API is reachable
    Ping,
}
