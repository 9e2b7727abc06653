use anyhow::Result;
use clap::Parser;
use noscan::{print_survey_report, run_survey, utils, Args};
use tracing::error;

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    match run_survey(&args) {
        Ok(report) => {
            print_survey_report(&report, args.top)?;
            Ok(())
        }
        Err(e) => {
            error!(action = "survey", component = "main", error = %format!("{:#}", e), "Survey failed");
            std::process::exit(1);
        }
    }
}
