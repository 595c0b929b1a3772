use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::Options;
use ics_csv_parser::MAX_PREVIEW_ROWS;

pub const ADDRESS_ENV: &str = "ICS_CSV_ADDR";

#[derive(Debug)]
pub struct Args {
    pub address: SocketAddr,
    /// Convert this file once instead of serving.
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub preview_rows: usize,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: $ICS_CSV_ADDR or 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "i",
        "input",
        "Convert a single .ics file and exit instead of serving",
        "FILE",
    );
    opts.optopt(
        "o",
        "output",
        "Directory the converted CSV file is written to [Default: .]",
        "DIR",
    );
    opts.optopt(
        "n",
        "preview-rows",
        "Number of events shown in previews [Default: 10]",
        "ROWS",
    );
    opts
}

pub fn usage() -> String {
    let opts = opts();
    opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME")))
}

/// Returns `Ok(None)` when help was requested.
pub fn try_parse(args: Vec<String>, env_address: Option<String>) -> Result<Option<Args>, String> {
    let matches = opts().parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(None);
    }

    let default_address = match env_address {
        Some(value) => value
            .parse::<SocketAddr>()
            .map_err(|err| format!("Failed to parse `{ADDRESS_ENV}` environment variable: {err}"))?,
        None => SocketAddr::from(([127, 0, 0, 1], 8080)),
    };

    let address = matches
        .opt_get_default("address", default_address)
        .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?;

    let preview_rows = matches
        .opt_get_default("preview-rows", MAX_PREVIEW_ROWS)
        .map_err(|err| format!("Provided value for option 'preview-rows' is invalid: {err}"))?;

    Ok(Some(Args {
        address,
        input: matches.opt_str("input").map(PathBuf::from),
        output: matches
            .opt_str("output")
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
        preview_rows,
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, env::var(ADDRESS_ENV).ok()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", usage());
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
