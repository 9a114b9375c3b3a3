mod app;

use app::{
    options::{from_command_line, Options},
    runtime::Config,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = from_command_line();
    match Options::from_args(&args) {
        Ok(options) => {
            init_logging(options.verbose);
            let app = Config::new(options);
            if let Err(why) = app.start() {
                eprintln!("Unable to run: {why}");
                std::process::exit(1);
            }
        }
        Err(why) => {
            eprintln!("{why}");
            std::process::exit(1);
        }
    }
}

/// Route engine logs to stderr; `RUST_LOG` overrides the verbosity flag
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
