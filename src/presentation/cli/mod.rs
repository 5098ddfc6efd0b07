pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smartsched")]
#[command(author = "SmartScheduler Team")]
#[command(version = "0.1.0")]
#[command(about = "Field-service scheduling and recommendation core", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run the built-in demo fleet through recommend, assign, reschedule and cancel")]
    Demo {
        #[arg(long, help = "Print the recommendation as JSON instead of a summary")]
        json: bool,
    },

    #[command(about = "Rank contractors for a job described in a JSON seed file")]
    Recommend {
        #[arg(short, long, value_name = "FILE", help = "Seed file with contractors and a job")]
        input: PathBuf,

        #[arg(short, long, default_value_t = 3, help = "Maximum candidates to return")]
        max_results: usize,
    },
}
