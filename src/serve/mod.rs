//! Development server for the built site.
//!
//! Serves the output directory over HTTP. In watch mode it also spawns the
//! watch threads and a WebSocket reload hub; HTML responses then get a
//! small client script injected that listens for rebuild notifications.

mod message;
mod path;
mod reload;
mod response;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{self, Receiver};
use tiny_http::{Method, Request, Server};

use crate::config::PipelineConfig;
use crate::core::{is_shutdown, register_server};
use crate::paths::PathTable;
use crate::watch;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bound server ready to accept requests.
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: Receiver<()>,
}

/// Bind the HTTP server without starting the request loop.
pub fn bind_server(config: &PipelineConfig) -> Result<BoundServer> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the request loop, blocking until shutdown.
    ///
    /// With `[serve] watch` enabled this also spawns the watch threads and
    /// the reload hub; a failure there degrades to plain serving.
    pub fn run(self, config: Arc<PipelineConfig>, table: Arc<PathTable>) -> Result<()> {
        let mut hub = None;
        if config.serve.watch {
            match start_reload(Arc::clone(&config), table, self.shutdown_rx) {
                Ok(started) => hub = Some(started),
                Err(e) => log!("watch"; "live reload disabled: {e:#}"),
            }
        }

        let ws_port = hub.as_ref().map(|(port, _)| *port);
        run_request_loop(&self.server, &config, ws_port);

        wait_for_hub(hub.map(|(_, handle)| handle));
        Ok(())
    }
}

/// Bind to the configured interface, walking up from the configured port
/// when it is taken.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Wire the reload hub to the watch threads.
fn start_reload(
    config: Arc<PipelineConfig>,
    table: Arc<PathTable>,
    shutdown_rx: Receiver<()>,
) -> Result<(u16, JoinHandle<()>)> {
    let (done_tx, done_rx) = channel::unbounded::<watch::TaskDone>();
    let (port, handle) = reload::start(config.serve.interface, done_rx, shutdown_rx)?;
    debug!("reload"; "ws://localhost:{}", port);
    watch::spawn(config, table, done_tx)?;
    Ok((port, handle))
}

fn run_request_loop(server: &Server, config: &Arc<PipelineConfig>, ws_port: Option<u16>) {
    // A small pool so one slow disk read cannot stall the other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, ws_port) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &PipelineConfig, ws_port: Option<u16>) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    // The reload client is served from memory, never from the output tree
    if let Some(port) = ws_port
        && request.url() == reload::SCRIPT_URL
    {
        return response::respond_reload_js(request, port);
    }

    if let Some(file) = path::resolve_path(request.url(), config.dist_dir()) {
        return response::respond_file(request, &file, ws_port);
    }

    response::respond_not_found(request, config.dist_dir(), ws_port)
}

/// Give the reload hub a moment to flush close frames (max 2 seconds).
fn wait_for_hub(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
