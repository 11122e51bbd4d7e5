use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use artifactorial_daemon::config::ConfigError;
use artifactorial_daemon::process::ServiceError;
use artifactorial_daemon::{init_logging, spawn_service};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override the listen address (default from config)
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,

    /// Override the blob root directory (default from config)
    #[arg(long)]
    pub blob_root: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("service failed: {0}")]
    Service(#[from] ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = ctx.config()?;
        if let Some(listen_addr) = self.listen_addr {
            config.listen_addr = listen_addr;
        }
        if let Some(blob_root) = &self.blob_root {
            config.blob_root = Some(blob_root.clone());
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }

        let _guards = init_logging(config.log_level()?, config.log_dir.as_deref());
        spawn_service(&config).await?;
        Ok("service stopped".to_string())
    }
}
