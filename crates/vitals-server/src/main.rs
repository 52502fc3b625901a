//! vitals demo server
//!
//! Serves a store with the predefined `rts.*` metrics plus a few demo
//! metrics updated in a loop, until Ctrl-C.
//! - Config: `vitals.yaml` in the working directory, defaults otherwise
//! - Logging: `RUST_LOG=info`

use tokio::time::{interval, Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};

use vitals_core::Store;
use vitals_server::{config, lifecycle, obs::runtime};

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_or_default(config::DEFAULT_PATH).expect("config load failed");

    let store = Store::new();
    if cfg.metrics.runtime {
        runtime::register(&store).expect("runtime metrics registration failed");
    }

    let demo = store.prefixed("demo");
    let iterations = demo.register_counter("demo.iterations").expect("register demo.iterations");
    let phase = demo.register_gauge("demo.phase").expect("register demo.phase");
    let status = demo.register_label("demo.status").expect("register demo.status");
    let tick_lag = demo.register_distribution("demo.tick_lag_us").expect("register demo.tick_lag_us");

    let server = match cfg.server.host.as_deref() {
        Some(host) => lifecycle::fork_server_with(store, host, cfg.server.port),
        None => lifecycle::fork_server_no_hostname_with(store, cfg.server.port),
    }
    .expect("failed to start vitals server");

    tracing::info!(addr = %server.local_addr(), "vitals-server started");

    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    rt.block_on(async {
        let mut tick = interval(Duration::from_millis(500));
        status.set("running");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                at = tick.tick() => {
                    if server.is_finished() {
                        break;
                    }
                    iterations.inc();
                    phase.set((iterations.read() % 10) as i64);
                    tick_lag.add(Instant::now().duration_since(at).as_micros() as f64);
                }
            }
        }
    });

    tracing::info!("shutting down");
    server.kill();
    if let Err(e) = server.join() {
        tracing::error!(error = %e, "vitals-server exited with error");
        std::process::exit(1);
    }
}
