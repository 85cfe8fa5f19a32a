mod config;
mod datadog;
mod dto;
mod observer;
mod slack;

use som_settlement::expiry::ExpirySweeper;
use som_settlement::gateway::HttpPaymentGateway;
use som_settlement::notification::HttpPushSender;
use som_settlement::scheduler::JobRunner;
use som_settlement::{get_db_connection, Config, Settlement};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let figment = Config::figment();
    let config: Config = figment.extract()?;
    let worker_config: config::WorkerConfig = figment.extract()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.rust_log);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("som_worker={}", &config.worker_log).parse()?),
        )
        .with_span_events(FmtSpan::FULL)
        .init();

    let db = get_db_connection(&config).await?;
    let client = reqwest::Client::builder().build()?;

    let datadog_client = if worker_config.enable_datadog {
        Some(datadog_apm::Client::new(datadog_apm::Config {
            env: Some(worker_config.datadog_env()),
            service: worker_config.datadog_service(),
            host: worker_config.datadog_host.to_owned(),
            port: worker_config.datadog_port.to_owned(),
            ..Default::default()
        }))
    } else {
        None
    };
    let slack = if worker_config.slack_notification {
        Some(observer::SlackTarget {
            webhook_url: worker_config.slack_webhook_url.to_owned(),
            channel_id: worker_config.slack_channel_id.to_owned(),
        })
    } else {
        None
    };

    let sweep_interval = config.expiry_sweep_interval();
    let sweep_batch_size = config.expiry_sweep_batch_size();
    let push = Arc::new(HttpPushSender::new(
        client.clone(),
        config.notification_node.to_owned(),
    ));
    let gateway = Arc::new(HttpPaymentGateway::new(
        client.clone(),
        config.payment_gateway_confirm_url.to_owned(),
        config.payment_gateway_secret_key.to_owned(),
    ));
    let settlement = Settlement::new(db.clone(), Arc::new(config), push, gateway);
    let observer = Arc::new(observer::WorkerObserver::new(client, datadog_client, slack));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = tokio::spawn(JobRunner::new(settlement, observer).run(shutdown_rx.clone()));
    let sweeper =
        tokio::spawn(ExpirySweeper::new(db, sweep_interval, sweep_batch_size).run(shutdown_rx));
    info!("som-worker started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown_tx.send(true)?;
    runner.await?;
    sweeper.await?;
    Ok(())
}
