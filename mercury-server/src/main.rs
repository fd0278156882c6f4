//! Standalone server binary with the built-in development configuration.
//!
//! Run with `RUST_LOG=info cargo run -p mercury-server`.

use mercury_server::{ServerApi, ServerConfig, serve};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::default();
    let api = match ServerApi::new(config) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // A couple of accounts so users.* calls have something to resolve.
    api.add_user("+10000000001");
    api.add_user("+10000000002");

    if let Err(e) = serve::serve(api).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
