//! pm-runner CLI binary.
//!
//! This is the minimal entrypoint: all logic lives in `pmr_cli`. `main`
//! only initializes structured logging and maps the library's exit code
//! to `std::process::exit`.

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let code = pm_runner::run().await;
    std::process::exit(code);
}
