use tokengate::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    // Rejected tokens log at debug under the gate module.
    let config = LogConfig {
        filter: "info,tokengate::gate=debug".to_string(),
    };
    logger.reload_from_config(&config)?;
    debug!("application debug log (hidden)");
    debug!(target: "tokengate::gate", "gate debug log (shown)");
    info!("application info log");

    let bad = LogConfig {
        filter: "tokengate=loud".to_string(),
    };
    if let Err(e) = logger.reload_from_config(&bad) {
        warn!("kept previous filter: {}", e);
    }

    Ok(())
}
