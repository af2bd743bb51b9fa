use crate::CLAP_STYLING;
use clap::{Arg, arg, command};
use marketscrape_core::DEFAULT_EXPORT_FILE;
use url::Url;

/// Where listings are read from. Shared by `scrape` and `ui`.
fn source_args() -> [Arg; 4] {
    [
        arg!(--"webdriver" <URL>)
            .required(false)
            .help("WebDriver server to drive the browser through")
            .value_parser(clap::value_parser!(Url))
            .default_value("http://localhost:4444")
            .conflicts_with("snapshot"),
        arg!(--"snapshot" <DIR>)
            .required(false)
            .help("Read listings from a saved snapshot directory (site.json + html files)")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
        arg!(--"start-url" <URL>)
            .required(false)
            .help("Navigate to this listing feed before scraping (default: current page)")
            .value_parser(clap::value_parser!(Url)),
        arg!(--"selectors" <PATH>)
            .required(false)
            .help("Selector table to use (default: ~/.config/marketscrape/selectors.json)")
            .value_parser(clap::value_parser!(std::path::PathBuf)),
    ]
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("marketscrape")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("marketscrape")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the marketscrape configuration on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the marketscrape configuration")
                        .default_value("~/.config/marketscrape/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing selector table without asking.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("scrape")
                .about(
                    "Scrape the listing feed headlessly, print a report and export the \
                listings to a spreadsheet.",
                )
                .args(source_args())
                .arg(
                    arg!(-i --"interval" <SECONDS>)
                        .required(false)
                        .help("Seconds to wait between feed passes (1-60)")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("5"),
                )
                .arg(
                    arg!(-l --"limit" <COUNT>)
                        .required(false)
                        .help("Maximum number of listings to process (1-1000)")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("100"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Export file (default: marketplace_products.xlsx)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: xlsx, csv, json (default: from output extension)")
                        .value_parser(["xlsx", "csv", "json"]),
                ),
        )
        .subcommand(
            command!("ui")
                .about("Launch the interactive terminal UI")
                .args(source_args())
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("File the Export action writes to")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .default_value(DEFAULT_EXPORT_FILE),
                )
                .arg(
                    arg!(--"log-file" <PATH>)
                        .required(false)
                        .help("Where to write logs while the UI owns the terminal")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .default_value("marketscrape.log"),
                ),
        )
}
