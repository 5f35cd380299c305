use std::process::ExitCode;
use stock_dashboard::analyzer::ArimaEngine;
use stock_dashboard::config::{OutputFormat, load_config};
use stock_dashboard::source::YahooSource;
use stock_dashboard::{PipelineRequest, run};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    let source = match YahooSource::new(&config.data_source) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize data source: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let engine = ArimaEngine::new();
    let request = PipelineRequest::from_config(&config);

    let report = match run(&source, &engine, &request).await {
        Ok(report) => report,
        Err(e) if e.is_invalid_input() => {
            error!("No data for this stock, check the symbol: {}", e);
            return ExitCode::from(2);
        }
        Err(e) => {
            error!("Error loading stock data: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.output {
        OutputFormat::Text => println!("{}", report),
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    info!("Done.");
    ExitCode::SUCCESS
}
