mod cli;
mod render;
mod server;

use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ics_csv_parser::{convert, Conversion};
use log::{error, info, warn};
use tokio::{net::TcpListener, signal};

use server::AppState;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "ics_csv_server=info,ics_csv_parser=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

pub(crate) fn log_conversion(source: &str, conversion: &Conversion) {
    info!(
        "{source}: {} events as {}",
        conversion.calendar.len(),
        conversion.file_name
    );

    for diagnostic in &conversion.calendar.diagnostics {
        warn!("{source}: {diagnostic}");
    }
}

fn convert_file(input: &Path, output: &Path, preview_rows: usize) -> Result<PathBuf> {
    let content =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let conversion = convert(String::from_utf8_lossy(&content));
    log_conversion(&input.display().to_string(), &conversion);

    let path = output.join(&conversion.file_name);
    fs::write(&path, &conversion.csv)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    print!("{}", render::text_table(conversion.calendar.preview(preview_rows)));
    println!(
        "{} events written to {}",
        conversion.calendar.len(),
        path.display()
    );

    Ok(path)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }

    info!("Shutting down");
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening at http://{addr}");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging();

    match args.input {
        Some(input) => convert_file(&input, &args.output, args.preview_rows).map(|_| ()),
        None => {
            let state = AppState {
                preview_rows: args.preview_rows,
            };
            serve(args.address, state).await
        }
    }
}
