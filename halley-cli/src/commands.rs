use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up the node: prompt for settings, write config, start the service
    Install {
        /// Image tag to pin (defaults to the built-in known-good release)
        #[arg(long)]
        tag: Option<String>,

        /// Network the node joins
        #[arg(long)]
        network: Option<String>,

        /// Config key schema to write (v1 or v2); detected from an
        /// existing store, otherwise the latest
        #[arg(long)]
        schema: Option<String>,

        /// Snapshot archive URL for initial sync
        #[arg(long)]
        snapshot_url: Option<String>,

        /// Skip the post-start liveness check
        #[arg(long)]
        no_verify: bool,
    },

    /// Reconcile configuration changes and restart the service
    Configure {
        /// KEY=VALUE pair to upsert (repeatable); prompts interactively
        /// when none are given
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Config key schema to use (v1 or v2)
        #[arg(long)]
        schema: Option<String>,

        /// Skip the post-start liveness check
        #[arg(long)]
        no_verify: bool,
    },

    /// Re-pin the node image to a new tag, pull it, and restart
    Update {
        /// Image tag to pin (defaults to the built-in known-good release)
        #[arg(long)]
        tag: Option<String>,

        /// Skip the post-start liveness check
        #[arg(long)]
        no_verify: bool,
    },

    /// Stop and remove the service; optionally purge node data
    Remove {
        /// Also delete the node data directory
        #[arg(long)]
        purge: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show the service state
    Status,

    /// Show service logs
    Logs {
        /// Follow log output
        #[arg(long)]
        follow: bool,

        /// Number of trailing lines to show
        #[arg(short = 'n', long)]
        tail: Option<usize>,
    },
}
