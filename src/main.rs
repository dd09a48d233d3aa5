use clap::Parser;
use gendata::cli::Args;
use gendata::logging::init_logging;
use gendata::problem::ProblemPaths;
use gendata::workflow::{run_clean, run_generate};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_logging(&args.log_level) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<String> {
    let paths = ProblemPaths::open(&args.problemdir)?;
    if args.clean {
        let report = run_clean(&paths)?;
        Ok(format!(
            "cleaned {}: {} files, {} directories removed, {} warnings",
            paths.short_name(),
            report.files_removed,
            report.dirs_removed,
            report.warnings.len()
        ))
    } else {
        let report = run_generate(&paths)?;
        Ok(format!(
            "generated {}: {} testcases, {} group generators, {} extension files, {} documents ({} programs compiled)",
            paths.short_name(),
            report.testcases,
            report.group_generators,
            report.extensions,
            report.documents,
            report.compiled
        ))
    }
}
