//! StealthSpanner - Main CLI Application
//!
//! Probes every VPN server defined in a directory of `.ovpn` files and ranks
//! them by latency, jitter, loss and region privacy.

use clap::Parser;
use stealthspanner::{
    app::App,
    cli::Cli,
    error::AppError,
    providers::VpnProvider,
};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let use_color = cli.use_colors(true);

    let outcome = match App::new(cli) {
        Ok(app) => app.run().await.map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    let hints: &[&str] = match error {
        AppError::Config(_) | AppError::Validation(_) | AppError::Parse(_) => &[
            "Check your .env file and environment variables (see --help)",
            "PING_COUNT must be 1-100, PING_TIMEOUT in (0, 60], WORKERS 1-512",
            "PRIVACY_WEIGHT must be between 0.0 and 1.0",
        ],
        AppError::UnsupportedProvider(_) => &["Set VPN_PROVIDER or --provider to a supported key"],
        AppError::Discovery(_) => &[
            "Point --directory (or CONFIG_DIRECTORY) at a folder of .ovpn files",
            "Each file needs a 'remote <host> <port>' line",
        ],
        AppError::Dns(_) => &[
            "Check your internet connection and DNS settings",
            "Try a longer --timeout",
        ],
        AppError::Download(_) => &[
            "Check DOWNLOAD_URL and your internet connection",
            "Use --no-download to probe the files already on disk",
        ],
        AppError::Execution(_) => &["Reduce --workers if the system is short on resources"],
        AppError::Io(_) | AppError::Internal(_) => &[],
    };

    if hints.is_empty() {
        return;
    }

    eprintln!();
    for hint in hints {
        eprintln!("  - {}", hint);
    }
    if matches!(error, AppError::UnsupportedProvider(_)) {
        eprintln!("  - Supported providers: {}", VpnProvider::supported_keys());
    }
}
