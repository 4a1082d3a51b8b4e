pub mod args;
pub mod commands;

pub use args::{ConvertArgs, ConvertPackArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "orquestaconvert")]
#[command(version = crate::VERSION)]
#[command(about = "Convert Mistral workflows to Orquesta")]
pub struct Args {
    /// Emit debug diagnostics and per-file progress to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Convert one or more Mistral workflow files",
        after_help = "Example:\n    orquestaconvert convert -e yaql actions/workflows/my_workflow.yaml"
    )]
    Convert(ConvertArgs),
    #[command(
        name = "convert-pack",
        about = "Convert every Mistral workflow in a pack's actions directory",
        after_help = "Example:\n    orquestaconvert convert-pack --actions-dir ./actions"
    )]
    ConvertPack(ConvertPackArgs),
}
