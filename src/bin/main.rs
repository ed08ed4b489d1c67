use wish_ledger::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let (cfg, config_problems) = config::load_or_init();
    let telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        cfg.logging.clone(),
    ));
    for problem in &config_problems {
        tracing::warn!("config: {problem}");
    }

    let code = match cli::run(cli, cfg) {
        Ok(exit) => exit.code(),
        Err(e) => {
            tracing::error!("error: {}", e);
            1
        }
    };
    // Flush file logs before exiting.
    drop(telemetry_guard);
    std::process::exit(code);
}
