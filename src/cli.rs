use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "Gokul <@bahdotsh>",
    version = env!("CARGO_PKG_VERSION"),
    about = "expander - A system-wide text snippet expander",
    long_about = "expander rewrites the current line of the focused text field when you \
                  type a trigger followed by space, return or tab."
)]
pub struct ExpanderCli {
    /// Use this snippets file instead of ~/.expander/snippets
    #[clap(long, global = true, value_name = "PATH")]
    pub snippets: Option<PathBuf>,

    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the expander in the foreground
    Run,
    /// Start the expander daemon
    Start,
    /// Stop the expander daemon
    Stop,
    /// Check the status of the expander daemon
    Status,
    /// List all snippets
    List {
        #[clap(long, help = "Print the snippets as JSON")]
        json: bool,
    },
    /// Add a new snippet
    Add {
        #[clap(long, short = 't', help = "Trigger text for the snippet")]
        trigger: String,

        #[clap(long, short = 'e', help = "The expansion text")]
        expansion: String,
    },
    /// Update an existing snippet by trigger
    Update {
        #[clap(long, short = 't', help = "Trigger of the snippet to update")]
        trigger: String,

        #[clap(long, short = 'e', help = "New expansion text")]
        expansion: String,
    },
    /// Delete a snippet by trigger
    Delete {
        #[clap(long, short = 't', help = "Trigger of the snippet to delete")]
        trigger: String,
    },
    /// Open the snippets file in an editor
    Edit,
    /// Expand a line of text without touching the keyboard
    Expand {
        #[clap(long, help = "Text of the field")]
        text: String,

        #[clap(long, help = "Caret offset in UTF-16 code units (defaults to the end)")]
        cursor: Option<usize>,
    },
    // Hidden command used internally to run the daemon worker
    #[clap(hide = true)]
    DaemonWorker,
}
