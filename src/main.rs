// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, read settings, hand over to the UI.
// - Returns `anyhow::Result` so transport failures end the run with a message.

use ghpages_sync::{config::Settings, ui::run};

fn main() -> anyhow::Result<()> {
    // `RUST_LOG=debug` shows every request line (never the token).
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = Settings::from_env();
    run(&settings)?;
    Ok(())
}
