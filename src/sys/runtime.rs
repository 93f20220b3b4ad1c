use crate::events::AppEvent;
use async_channel::Sender;
use std::thread;
use tokio::runtime::Builder;

/// Runs the control socket and the config watcher on a dedicated thread.
/// Both report to the UI only through `tx`.
pub fn start_background_services(tx: Sender<AppEvent>) {
    let spawned = thread::Builder::new()
        .name("vitrine-services".into())
        .spawn(move || {
            let rt = match Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create Tokio runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async move {
                let server = tokio::spawn(crate::sys::server::run_server(tx.clone()));
                let watcher = tokio::spawn(crate::config::run_async_watcher(tx));

                let (server, watcher) = tokio::join!(server, watcher);
                if let Err(e) = server {
                    log::error!("Control server task failed: {}", e);
                }
                if let Err(e) = watcher {
                    log::error!("Config watcher task failed: {}", e);
                }
                log::warn!("Background services stopped");
            });
        });

    if let Err(e) = spawned {
        log::error!("Failed to start background services: {}", e);
    }
}
