use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = memscan::config::load().context("loading config.toml")?;

    // RUST_LOG overrides the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("memscan v{}", env!("CARGO_PKG_VERSION"));

    run(&config)
}

#[cfg(windows)]
fn run(config: &memscan::config::Config) -> Result<()> {
    use memscan::access::windows::{enable_debug_privilege, WindowsProcess};

    if let Err(err) = enable_debug_privilege() {
        tracing::warn!("could not enable SeDebugPrivilege: {err}");
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    memscan::ui::run_loop(WindowsProcess::open, &mut input, &mut output, config)?;
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: &memscan::config::Config) -> Result<()> {
    anyhow::bail!("the interactive scanner drives the Windows debug API and only runs on Windows");
}
