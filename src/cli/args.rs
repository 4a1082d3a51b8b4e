use crate::core::expressions::converter::Dialect;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Dialect used to wrap newly introduced guard expressions. Expressions
/// already present in the source always keep their own dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExpressionDialect {
    Jinja,
    Yaql,
}

impl From<ExpressionDialect> for Dialect {
    fn from(dialect: ExpressionDialect) -> Self {
        match dialect {
            ExpressionDialect::Jinja => Dialect::Jinja,
            ExpressionDialect::Yaql => Dialect::Yaql,
        }
    }
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Mistral workflow YAML files to convert
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Expression dialect for generated guards
    #[arg(short = 'e', long = "expressions", value_enum, default_value = "jinja")]
    pub expressions: ExpressionDialect,

    /// Relax unsupported-attribute and ambiguous-rewrite errors into
    /// best-effort output
    #[arg(long)]
    pub force: bool,

    /// Validate already-converted Orquesta files instead of converting
    #[arg(long)]
    pub validate: bool,

    /// Write converted output to this file instead of stdout (single input only)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvertPackArgs {
    /// The pack's action metadata directory
    #[arg(long = "actions-dir", value_name = "DIR", default_value = "actions")]
    pub actions_dir: PathBuf,

    /// List action files with this runner type and their workflows, then exit
    #[arg(long = "list-workflows", value_name = "TYPE")]
    pub list_workflows: Option<String>,

    /// Validate the pack's Orquesta workflows instead of converting
    #[arg(long)]
    pub validate: bool,

    /// Expression dialect for generated guards
    #[arg(short = 'e', long = "expressions", value_enum, default_value = "jinja")]
    pub expressions: ExpressionDialect,

    /// Relax unsupported-attribute and ambiguous-rewrite errors into
    /// best-effort output
    #[arg(long)]
    pub force: bool,
}
