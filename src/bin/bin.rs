use anyhow::Result;
use log::{error, info};
use std::path::PathBuf;
use structopt::StructOpt;
use ufw::report::DEFAULT_MIN_REQUESTS;

const NO_INPUT_MESSAGE: &str = "No file arguments were given.";

/// Reads ufw log files and reports how many requests each source address made to each port.
#[derive(StructOpt)]
struct Options {
    /// Only report addresses with more than this many requests
    #[structopt(short, long, default_value = "1")]
    min_requests: u64,
    /// Print the report as JSON
    #[structopt(short, long)]
    json: bool,
    #[structopt(parse(from_os_str))]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load from .env file if it is present
    dotenv::dotenv().ok();
    // Initialize logging
    env_logger::init();
    // Get command line arguments
    let options = Options::from_args();

    // Any failure to open or read a file aborts the run without a report
    match run(&options).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            error!("{:#}", err);
            Err(err)
        }
    }
}

/// Produce everything the program prints: the report, or only the no-input message when no files were given.
async fn run(options: &Options) -> Result<String> {
    if options.files.is_empty() {
        return Ok(NO_INPUT_MESSAGE.to_owned());
    }
    if options.min_requests != DEFAULT_MIN_REQUESTS {
        info!("Reporting addresses with more than {} requests", options.min_requests);
    }

    let report = ufw::scan_files(&options.files, options.min_requests).await?;
    if options.json {
        Ok(report.to_json().pretty(4))
    } else {
        Ok(report.to_string())
    }
}
