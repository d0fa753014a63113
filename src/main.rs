use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tnm_dashboard::{
    AnalysisSession, DashboardConfig, HttpServer, HttpTaskService, StagingScheme,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "tnm-dashboard", version, about = "TNM patient similarity dashboard")]
struct Args {
    /// Configuration file (YAML)
    #[arg(long, default_value = "dashboard.yaml", env = "TNM_CONFIG")]
    config: PathBuf,

    /// Staging document, overrides the config file
    #[arg(long)]
    staging: Option<PathBuf>,

    /// Dashboard port, overrides the config file
    #[arg(long)]
    port: Option<u16>,

    /// Remote service URL
    #[arg(long, env = "TNM_SERVER_URL")]
    server_url: Option<String>,

    /// Remote service port
    #[arg(long, env = "TNM_SERVER_PORT")]
    server_port: Option<u16>,

    /// Remote service API path
    #[arg(long, env = "TNM_SERVER_API")]
    server_api: Option<String>,

    #[arg(long, env = "TNM_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "TNM_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl Args {
    fn apply(self, config: &mut DashboardConfig) {
        if let Some(path) = self.staging {
            config.staging_path = path;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(url) = self.server_url {
            config.remote.server_url = url;
        }
        if let Some(port) = self.server_port {
            config.remote.server_port = port;
        }
        if let Some(api) = self.server_api {
            config.remote.server_api = api;
        }
        if let Some(username) = self.username {
            config.remote.username = username;
        }
        if let Some(password) = self.password {
            config.remote.password = password;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = DashboardConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);

    // The dropdowns cannot be rendered without the staging scheme
    let staging = StagingScheme::load(&config.staging_path)
        .with_context(|| format!("loading staging scheme {}", config.staging_path.display()))?;

    let service = HttpTaskService::new(&config.remote).context("building remote client")?;
    info!(server = %service.base_url(), "Remote task service configured");

    let session = AnalysisSession::new(service, Arc::new(staging), config.analysis.clone())
        .with_timeout(config.remote.timeout());

    let server = HttpServer::new(session, config.http.address.clone(), config.http.port);
    server.start().await.context("dashboard server failed")?;

    Ok(())
}
