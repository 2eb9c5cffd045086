// streamwatch-server/src/server.rs

use std::time::Duration;

use tracing::{error, info};

use streamwatch_core::eventbus::TrackerEvent;
use streamwatch_core::tasks::{poll_once, spawn_stream_poll_task};

use crate::context::ServerContext;
use crate::Args;

pub async fn run_server(args: &Args, once: bool) -> anyhow::Result<()> {
    let ctx = ServerContext::new(args).await?;
    info!("Tracking {} channel(s)", ctx.store.registry.len().await);

    if once {
        for adapter in &ctx.adapters {
            let summary = poll_once(adapter.as_ref(), &ctx.tracker).await;
            info!(
                "{}: checked={} notified={} errors={}",
                adapter.platform(),
                summary.checked,
                summary.notified,
                summary.errors
            );
        }
        return Ok(());
    }

    // Log everything the tracker publishes.
    let mut events = ctx.event_bus.subscribe(None).await;
    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match &event {
                TrackerEvent::StreamLive(n) => {
                    info!("[{}] {} is live: {}", event.event_type(), n.username, n.channel_url)
                }
                TrackerEvent::StreamOffline { key, stopped_at } => {
                    info!("[{}] {} at {}", event.event_type(), key, stopped_at)
                }
            }
        }
    });

    let every = Duration::from_secs(args.poll_interval_secs);
    let mut pollers = Vec::with_capacity(ctx.adapters.len());
    for adapter in &ctx.adapters {
        pollers.push(spawn_stream_poll_task(
            adapter.clone(),
            ctx.tracker.clone(),
            every,
            ctx.event_bus.shutdown_rx.clone(),
        ));
    }

    // Ctrl-C => signal
    let eb_for_ctrlc = ctx.event_bus.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; stopping pollers...");
        eb_for_ctrlc.shutdown();
    });

    let mut shutdown_rx = ctx.event_bus.shutdown_rx.clone();
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }

    for handle in pollers {
        if let Err(e) = handle.await {
            error!("Poller task ended abnormally: {:?}", e);
        }
    }
    event_logger.abort();
    ctx.store.db.pool().close().await;
    info!("streamwatch shutdown complete.");
    Ok(())
}
