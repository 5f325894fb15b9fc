use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codevec")]
#[command(about = "Index source files into a vector store and search them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ensure the collection, index the configured source root, run the example query
    Run,
    /// Index a directory (defaults to `source.root`)
    Index {
        dir: Option<PathBuf>,
    },
    /// Search the collection and print results as JSON
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },
}
