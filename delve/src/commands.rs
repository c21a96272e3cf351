use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("delve")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("delve")
        .about("Recursively download the pages of a single site, up to a link depth")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress the banner, progress and the report on screen")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log every fetch and dropped link (overridden by RUST_LOG)")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site from a seed URL, saving every same-origin page up to the given \
                depth.",
                )
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The seed URL to start from (e.g. https://example.com)"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Link depth to follow; 1 saves only the seed page")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("2"),
                )
                .arg(
                    arg!(-s --"sleep" <SECONDS>)
                        .required(false)
                        .help("Pause before every request, in seconds")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("0.5"),
                )
                .arg(
                    arg!(-p --"path" <PATH>)
                        .required(false)
                        .help("Directory to save urls.txt and data/ into (data/ is replaced on every run)")
                        .default_value("./"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the crawl report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
