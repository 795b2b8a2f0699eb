//! camlink: start a live session for one device and keep it up until
//! interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use camlink::adapters::{
    HttpBackendProbe, HttpLinkProbe, HttpRelayControl, MqttConnector, StaticTokenProvider,
    TcpLinkTransport,
};
use camlink::application::{ConnectionHealthMonitor, EventBusClient, LiveSessionOrchestrator};
use camlink::config::{AppConfig, LoggingConfig};
use camlink::domain::foundation::{DeviceId, Observer, ObserverError};
use camlink::domain::health::ConnectionType;
use camlink::domain::telemetry::{TelemetryMessage, WILDCARD_TOPIC};

#[derive(Parser)]
#[command(name = "camlink")]
#[command(about = "Start a live camera session and follow its telemetry")]
struct Cli {
    /// Device to watch
    #[arg(env = "CAMLINK_DEVICE_ID")]
    device_id: String,

    /// Do not set up the local device link before starting
    #[arg(long)]
    skip_link: bool,

    /// Do not connect to the telemetry broker
    #[arg(long)]
    no_telemetry: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let device_id = DeviceId::new(cli.device_id)?;
    info!(device_id = %device_id, "Starting camlink");

    let health = Arc::new(
        ConnectionHealthMonitor::new(
            Arc::new(TcpLinkTransport::new(ConnectionType::Wifi)),
            Arc::new(
                TcpLinkTransport::new(ConnectionType::Bluetooth)
                    .with_port(config.health.fallback_port()),
            ),
            Arc::new(HttpLinkProbe::new(
                config.health.speed_test_url(),
                config.health.monitor_config().test_timeout,
            )?),
        )
        .with_config(config.health.monitor_config()),
    );

    if !cli.skip_link {
        match health.setup_connection(config.health.link_config()).await {
            Ok(status) => info!(
                connection_type = ?status.connection_type,
                quality = ?health.connection_quality(),
                "Device link up"
            ),
            Err(e) => warn!(error = %e, "Device link setup failed"),
        }
    }

    let bus = EventBusClient::new(
        Arc::new(MqttConnector::new()),
        config.broker.event_bus_config(),
    );
    if !cli.no_telemetry {
        let log_telemetry: Arc<dyn Observer<TelemetryMessage>> = Arc::new(
            |message: &TelemetryMessage| -> Result<(), ObserverError> {
                info!(topic = %message.topic, payload = %message.payload, "Telemetry");
                Ok(())
            },
        );
        bus.subscribe(WILDCARD_TOPIC, log_telemetry);

        if let Err(e) = bus.connect(&config.broker.url, &device_id).await {
            warn!(error = %e, "Telemetry unavailable");
        }
    }

    let tokens = Arc::new(StaticTokenProvider::from_secret(config.relay.api_token.clone()));
    let relay = Arc::new(HttpRelayControl::new(config.relay.http_config(), tokens)?);
    let probe = Arc::new(HttpBackendProbe::new(
        &config.relay.base_url,
        &config.relay.health_path,
        config.relay.request_timeout(),
    )?);

    let mut session =
        LiveSessionOrchestrator::new(relay, probe).with_config(config.session.timing());
    if !cli.skip_link {
        session = session.with_reachability(health.clone());
    }

    let outcome = session.start(device_id.clone()).await;
    match &outcome {
        Ok(started) => {
            println!("{}", started.stream_url);
            info!("Press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.ok();
        }
        Err(e) => error!(code = %e.code(), error = %e, "Could not start session"),
    }

    info!("Shutting down");
    session.stop().await;
    bus.disconnect().await;
    health.disconnect();

    outcome?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(logging.env_filter()?);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
