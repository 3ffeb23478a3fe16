use std::error::Error;

use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bootstrap;
mod cli;

use assethub_hub as hub;
use assethub_provisioning as provisioning;
use assethub_telemetry as telemetry;
use assethub_util as util;

use crate::hub::HubConnector;
use crate::provisioning::ProvisioningClient;
use crate::util::config::config_dir;
use crate::util::store::Store;

fn initialize_tracing() {
    // Initialize tracing subscriber for human-readable logs
    tracing_subscriber::registry()
        .with(
            // Use some log defaults. These can be overriden using
            // RUST_LOG
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("debug,hyper=error,hyper_util=error,reqwest=info,rumqttc=warn")
            }),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    initialize_tracing();

    let cli = cli::parse();
    debug!("{cli:#?}");

    let config = bootstrap::Config {
        identity: cli.identity(),
        readings: cli.readings.clone(),
        registration_store: cli
            .persist_registration
            .then(|| Store::new(config_dir())),
    };
    let provisioner = ProvisioningClient::new(cli.request_config());
    let connector = HubConnector::new(cli.hub_config());

    let summary = bootstrap::run(&config, &provisioner, &connector).await?;
    info!(
        hub = %summary.registration.assigned_hub,
        device_id = %summary.registration.device_id,
        messages = summary.messages_sent,
        "done"
    );

    Ok(())
}
