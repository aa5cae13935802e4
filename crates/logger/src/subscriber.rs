use std::env::var;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{
    Layer, Registry, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing with INFO as the default level.
///
/// Events go to stdout and, when `log_file` is given, are appended to that file.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    init_with_level(LevelFilter::INFO, log_file)
}

/// Initialize tracing subscriber with the given default level.
///
/// `RUST_LOG` overrides the level, `RUST_LOG_FORMAT=json` switches stdout to JSON.
pub fn init_with_level(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(level, &log_format)];
    if let Some(path) = log_file {
        layers.push(file_layer(level, open_append(path)?));
    }

    tracing_subscriber::registry().with(layers).init();

    let output = if log_format == "json" { "json" } else { "compact" };
    debug!(output, file = ?log_file, "logging initialized");
    Ok(())
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

fn stdout_layer(level: LevelFilter, log_format: &str) -> BoxedLayer {
    match log_format {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter(level)).boxed(),
        _ => tracing_subscriber::fmt::layer().compact().with_filter(env_filter(level)).boxed(),
    }
}

/// File output keeps timestamps and drops colour codes.
fn file_layer(level: LevelFilter, file: File) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(env_filter(level))
        .boxed()
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
