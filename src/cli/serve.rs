//! Serve command implementation

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use slerfhub::config::Config;
use slerfhub::server::{ApiState, HttpServer};
use slerfhub::tracker::Tracker;
use slerfhub::wallet::HeaderWalletProvider;

/// Open the tracker and serve the API until the process exits
pub fn serve_command(mut config: Config, bind: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let tracker = Tracker::from_config(&config)?;
    info!("[slerfhub] Reset policy: {:?}", tracker.policy());

    let state = ApiState::new(tracker, Arc::new(HeaderWalletProvider))
        .with_auth_token(config.server.auth_token.clone());
    let server = HttpServer::bind(&config.server.addr(), state)?;
    server.run();

    Ok(())
}
