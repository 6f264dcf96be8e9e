//! Tracing setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the flags; otherwise
/// library logs show at `info`, or `debug` with `--verbose`.
pub fn init(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialised: {e}");
    }
}
