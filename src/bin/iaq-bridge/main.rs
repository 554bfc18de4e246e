mod args;

use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use iaq_bridge::{
    adjustment::AdjustmentTable,
    broker::{self, BrokerTarget},
    delivery::Sinks,
    directory::load_adjustments,
    dispatch::Dispatcher,
    publisher,
    transport::ReqwestTransport,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let target = BrokerTarget::parse(&args.mqtt_uri).context("failed to parse MQTT_URI")?;
    let transport = ReqwestTransport::new(Duration::from_secs(args.http_timeout))?;

    let mut table = AdjustmentTable::new();
    if let Err(e) = load_adjustments(&transport, &args.rest_uri, &mut table).await {
        warn!("continuing with {} device adjustments: {e:#}", table.len());
    }

    let sinks = Sinks::new(&args.rest_uri, &args.cloud_uri);
    info!(
        local = %sinks.local.base_uri,
        cloud = ?sinks.cloud.as_ref().map(|s| &s.base_uri),
        "delivery targets"
    );

    let filters = broker::topic_filters(&args.mqtt_topics);
    let connect_timeout = Duration::from_secs(args.mqtt_connect_timeout);

    let (subscriber, subscriber_loop) = broker::connect(
        &target,
        &format!("{}-sub", args.mqtt_client_id),
        connect_timeout,
    )
    .await
    .context("failed to connect subscriber")?;
    info!(host = %target.host, port = target.port, "connected to broker");

    let dispatcher = Dispatcher::new(Arc::new(table), sinks, transport);
    tokio::spawn(async move {
        dispatcher
            .run(&subscriber, subscriber_loop, filters)
            .await;
    });

    let (test_client, mut test_loop) = broker::connect(
        &target,
        &format!("{}-pub", args.mqtt_client_id),
        connect_timeout,
    )
    .await
    .context("failed to connect test publisher")?;
    tokio::spawn(async move {
        loop {
            if let Err(e) = test_loop.poll().await {
                warn!("test publisher connection error: {e}");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    tokio::select! {
        _ = publisher::run(&test_client, publisher::TEST_INTERVAL) => {}
        r = tokio::signal::ctrl_c() => {
            r.context("failed to listen for shutdown signal")?;
            info!("shutting down");
        }
    }

    Ok(())
}
