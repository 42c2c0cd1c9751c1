// Entrypoint for the ledis client.
// - Keeps `main` small: set up logging, build the HTTP client and hand it
//   to the prompt loop.
// - Anything the loop cannot recover from ends up here as `anyhow::Error`.

use ledis_cli::{api::LedisClient, ui::repl};
use tracing::info;

fn main() -> anyhow::Result<()> {
    setup_logging();

    // Always talks to http://127.0.0.1:8080/.
    let api = LedisClient::local()?;
    info!(url = api.url(), "ledis client ready");

    // Blocks until stdin is closed or an unrecoverable error occurs.
    repl(api)?;
    Ok(())
}

// Logs go to stderr so stdout only carries the prompt and server replies.
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .init();
}
