use anyhow::Context;
use clap::Parser;
use tasktrack_client::cli::{self, Cli};
use tasktrack_client::{
    ClientConfig, DataService, FilePreferenceStore, HttpTransport, Profile, RemoteClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let profile = if args.dev { Profile::Dev } else { Profile::Release };

    let mut config = ClientConfig::load(profile).context("Failed to load configuration")?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    let preferences_path = config.preferences_path(profile)?;
    tracing::debug!(
        "Using {} with preferences at {}",
        config.endpoint,
        preferences_path.display()
    );

    let preferences = FilePreferenceStore::open(preferences_path);
    let client = RemoteClient::new(HttpTransport::new(config.endpoint.clone()), preferences);
    let service = DataService::new(client, config.limits());

    cli::run(args.command, &service, &mut std::io::stdout().lock()).await
}
