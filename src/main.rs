use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use deckcover::content::Variant;
use deckcover::logging;
use deckcover::report::{DEFAULT_INPUT_DIR, ReportBuilder};

#[derive(Parser)]
#[command(name = "deckcover")]
#[command(about = "Wrap the newest PDF deck in a branded cover page and closing page")]
struct Cli {
    #[arg(long, help = "Directory holding the deck and images", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,
    #[arg(long, help = "Directory the dated report is written to", default_value = ".")]
    output_dir: PathBuf,
    #[arg(long, value_enum, help = "Which report to build", default_value_t = Variant::Full)]
    variant: Variant,
    #[arg(long, help = "Start the body at the first page containing this text")]
    marker: Option<String>,
    #[arg(long, help = "Print the run summary as JSON")]
    json: bool,
    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let mut builder = ReportBuilder::new(cli.variant)
        .with_input_dir(&cli.input_dir)
        .with_output_dir(&cli.output_dir);
    if let Some(marker) = cli.marker {
        builder = builder.with_marker(marker);
    }

    match builder.run() {
        Ok(Some(summary)) => {
            if cli.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing summary: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                let name = summary
                    .output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| summary.output.display().to_string());
                println!("Successfully created: {}", name);
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            if cli.json {
                println!("null");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error creating report: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
