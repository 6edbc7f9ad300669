use dotenvy::dotenv;
use std::{path::PathBuf, sync::Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

fn init_env_layer() -> tracing_subscriber::EnvFilter {
    // missing .env is fine, RUST_LOG may come from the shell
    if let Ok(path) = dotenv() {
        eprintln!(".env read successfully from {}", path.display());
    }

    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

pub fn init_tracing_to_stdout() {
    let env_layer = init_env_layer();

    let stdout_layer = tracing_subscriber::fmt::layer().with_ansi(true);

    tracing_subscriber::registry()
        .with(env_layer)
        .with(stdout_layer)
        .init();
}

/// Logs to `<log_dir>/app.log`, falls back to stdout when the file cannot be
/// created.
pub fn init_tracing_to_file(log_dir: PathBuf) {
    let file_log_layer = {
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create log dir: {}", e);
            init_tracing_to_stdout();
            return;
        }
        let file = match std::fs::File::create(log_dir.join("app.log")) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to create log file: {}", e);
                init_tracing_to_stdout();
                return;
            }
        };
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
    };

    tracing_subscriber::registry()
        .with(init_env_layer())
        .with(file_log_layer)
        .init();
}
