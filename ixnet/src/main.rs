//! ixnet: build a back-to-back IPv4 topology on an IxNetwork appliance and
//! run bidirectional traffic across it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ixnet::{AddressPair, IxError, IxNetworkSession, PortSpec, SessionConfig, TrafficItemConfig};

#[derive(Parser, Debug)]
#[command(name = "ixnet", version, about = "Drive an IxNetwork appliance over REST")]
struct Args {
    /// REST endpoint of the appliance (e.g., https://10.27.200.3:11009)
    #[arg(long)]
    api: String,

    /// Appliance username
    #[arg(short, long, default_value = "admin")]
    user: String,

    /// Appliance password
    #[arg(long, env = "IXNET_PASSWORD", hide_env_values = true)]
    password: String,

    /// Reject self-signed appliance certificates
    #[arg(long)]
    strict_tls: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Chassis address the ports live on
    #[arg(long)]
    chassis: String,

    /// Port to assign (format: name=card/port:linkId, can be repeated)
    #[arg(long = "port", required = true)]
    ports: Vec<PortSpec>,

    /// Devices per device group
    #[arg(long, default_value = "1")]
    multiplier: u32,

    /// IPv4 addressing per stack (format: ADDR/LEN@GW/LEN, can be repeated)
    #[arg(long = "address")]
    addresses: Vec<AddressPair>,

    /// Traffic item name
    #[arg(long, default_value = "Test")]
    traffic_name: String,

    /// Fixed frame size in bytes
    #[arg(long, default_value = "1500")]
    frame_size: u32,

    /// Frame rate in percent of line rate
    #[arg(long, default_value = "100")]
    rate: f64,

    /// Run traffic for this many seconds and print flow statistics
    #[arg(long)]
    duration: Option<u64>,

    /// Save the configuration into this directory when done
    #[arg(long)]
    save_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ixnet=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = SessionConfig {
        accept_invalid_certs: !args.strict_tls,
        timeout: Duration::from_secs(args.timeout),
        ..SessionConfig::new(&args.api, &args.user, &args.password)
    };

    info!(api = %args.api, user = %args.user, "Connecting to appliance");
    let mut session = IxNetworkSession::connect(&config)
        .await
        .context("Failed to open appliance session")?;
    session.new_config().await?;

    session.assign_ports(&args.chassis, &args.ports).await?;
    session.create_topology(None).await?;
    session.create_device_groups(None, args.multiplier).await?;
    session.create_ethernet(None).await?;
    session.create_ipv4(None).await?;

    if !args.addresses.is_empty() {
        session.set_ipv4_addressing(&args.addresses).await?;
    }

    let endpoints = session.store().ipv4().to_vec();
    if endpoints.len() < 2 {
        bail!(
            "Need at least two IPv4 stacks for traffic, got {} (assign two ports)",
            endpoints.len()
        );
    }

    let mut traffic = TrafficItemConfig {
        name: args.traffic_name.clone(),
        ..Default::default()
    };
    traffic.frame.fixed_size = args.frame_size;
    traffic.frame.rate = args.rate;
    session.create_traffic_item(&endpoints, &traffic).await?;

    if let Some(secs) = args.duration {
        session.start_all_protocols().await?;

        let cancel = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        match session
            .run_traffic_macro_until(Duration::from_secs(secs), cancel)
            .await
        {
            Ok(statistics) => println!("{}", statistics.report),
            Err(IxError::Cancelled) => {
                warn!("Interrupted, stopping traffic");
                session.stop_all_traffic_items().await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(dir) = &args.save_config {
        let path = session.save_and_download_config(dir).await?;
        info!(path = %path.display(), "Configuration saved");
    }

    Ok(())
}
