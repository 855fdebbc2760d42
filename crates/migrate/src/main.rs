use clap::Parser;
use migrate::cli::{run, Args};

fn main() {
    let args = Args::parse();

    // Logs are written to stderr in jsonl format, leaving stdout to migration output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(args.log.as_str())
        .json()
        .flatten_event(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "migration failed");
            std::process::exit(2);
        }
    }
}
