use delve::commands::command_argument_builder;
use delve::handlers::handle_crawl;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "delve=debug,delve_core=debug,delve_crawler=debug";

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(verbose, quiet);

    let exit_code = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    std::process::exit(exit_code);
}

/// Logs go to stderr so reports on stdout stay clean. RUST_LOG wins over flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        VERBOSE_FILTER
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
