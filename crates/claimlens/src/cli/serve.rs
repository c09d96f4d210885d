//! `claimlens serve` - run the upload UI and analysis API.

use anyhow::Result;
use clap::Args;
use claimlens_core::Config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config: Config) -> Result<()> {
    let (host, port) = resolve_bind(&args, &config);
    crate::server::run_server(&config, &host, port).await
}

/// CLI flags win over the config file.
fn resolve_bind(args: &ServeArgs, config: &Config) -> (String, u16) {
    let host = args
        .host
        .clone()
        .unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    (host, port)
}
