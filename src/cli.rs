//! CLI argument parsing.
//!
//! One positional problem directory; `--clean` switches from generating to
//! removing generated data.
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "gendata",
    version,
    about = "Generate test data for a problem package from generators/gen.yaml"
)]
pub struct Args {
    /// Problem package root containing generators/gen.yaml
    #[arg(value_name = "PROBLEMDIR")]
    pub problemdir: PathBuf,

    /// Remove generated input and answer files instead of generating them
    #[arg(short, long)]
    pub clean: bool,

    /// Log level (trace, debug, info, warn, error); GENDATA_LOG overrides it
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}
