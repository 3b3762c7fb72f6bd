//! WebSocket hub for live reload.
//!
//! Rebuild completions arrive on a channel from the watch runner and are
//! broadcast to every connected browser. Stylesheet rebuilds become a CSS
//! refresh; everything else reloads the page.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::paths::AssetCategory;
use crate::watch::TaskDone;
use crate::{debug, log};

use super::message::ReloadMessage;

/// Base WebSocket port, retried upward when taken.
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Maximum port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Reserved URL the injected script tag requests.
pub const SCRIPT_URL: &str = "/.lathe/hotreload.js";

const CLIENT_JS: &str = include_str!("hotreload.js");

/// Render the browser client with the WebSocket port substituted.
pub fn client_script(ws_port: u16) -> String {
    CLIENT_JS.replace("__LATHE_WS_PORT__", &ws_port.to_string())
}

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Bind the WebSocket listener and start the hub threads.
///
/// Returns the bound port plus the broadcast thread's handle; the caller
/// waits on the handle during shutdown so close frames reach the clients.
pub fn start(
    interface: IpAddr,
    done_rx: Receiver<TaskDone>,
    shutdown_rx: Receiver<()>,
) -> Result<(u16, JoinHandle<()>)> {
    let (listener, port) = bind_ws_port(interface, DEFAULT_WS_PORT)?;
    listener.set_nonblocking(true)?;

    let clients: Clients = Arc::new(Mutex::new(Vec::new()));

    let accept_clients = Arc::clone(&clients);
    thread::Builder::new()
        .name("reload-accept".into())
        .spawn(move || accept_loop(&listener, &accept_clients))?;

    let handle = thread::Builder::new()
        .name("reload-hub".into())
        .spawn(move || forward_loop(&done_rx, &shutdown_rx, &clients))?;

    Ok((port, handle))
}

/// Bind the listener, walking up from the base port when it is taken.
fn bind_ws_port(interface: IpAddr, base_port: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind reload socket after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Accept browser connections until the process exits.
fn accept_loop(listener: &TcpListener, clients: &Clients) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!("reload"; "client connecting: {}", addr);
                // The handshake wants a blocking socket
                let _ = stream.set_nonblocking(false);
                add_client(clients, stream);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                log!("reload"; "accept error: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

/// Perform the WebSocket handshake and greet the client.
fn add_client(clients: &Clients, stream: TcpStream) {
    match tungstenite::accept(stream) {
        Ok(mut ws) => {
            let greeting = ReloadMessage::connected();
            if let Err(e) = ws.send(Message::Text(greeting.to_json().into())) {
                log!("reload"; "failed to greet client: {}", e);
                return;
            }

            let mut clients = clients.lock();
            debug!("reload"; "client connected (total: {})", clients.len() + 1);
            clients.push(ws);
        }
        Err(e) => {
            log!("reload"; "handshake failed: {}", e);
        }
    }
}

/// Turn completion events into broadcasts until shutdown.
fn forward_loop(done_rx: &Receiver<TaskDone>, shutdown_rx: &Receiver<()>, clients: &Clients) {
    loop {
        if crate::core::is_shutdown() || shutdown_rx.try_recv().is_ok() {
            close_all(clients);
            break;
        }

        match done_rx.recv_timeout(Duration::from_millis(250)) {
            Ok(done) => broadcast(clients, &message_for(done.category)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Pick the message a finished category sends to the browser.
fn message_for(category: AssetCategory) -> ReloadMessage {
    match category {
        AssetCategory::Styles => ReloadMessage::css(),
        other => ReloadMessage::reload(other.label()),
    }
}

/// Send one message to every client, dropping the ones that are gone.
fn broadcast(clients: &Clients, message: &ReloadMessage) {
    let frame = Message::Text(message.to_json().into());

    let mut clients = clients.lock();
    if clients.is_empty() {
        debug!("reload"; "no clients connected");
        return;
    }

    let count = clients.len();
    clients.retain_mut(|ws| match ws.send(frame.clone()) {
        Ok(()) => true,
        Err(e) => {
            debug!("reload"; "client dropped: {}", e);
            false
        }
    });
    debug!("reload"; "broadcast to {} clients", count);
}

fn close_all(clients: &Clients) {
    let mut clients = clients.lock();
    for mut ws in clients.drain(..) {
        let _ = ws.close(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_refresh_in_place() {
        assert!(matches!(
            message_for(AssetCategory::Styles),
            ReloadMessage::Css
        ));
    }

    #[test]
    fn test_other_categories_reload_the_page() {
        for category in [
            AssetCategory::Markup,
            AssetCategory::Scripts,
            AssetCategory::Images,
        ] {
            match message_for(category) {
                ReloadMessage::Reload { reason } => assert_eq!(reason, category.label()),
                other => panic!("expected reload message, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_client_script_port_substitution() {
        let js = client_script(35730);
        assert!(js.contains("35730"));
        assert!(!js.contains("__LATHE_WS_PORT__"));
    }
}
