//! WebSocket endpoint and bridge start-up.
//!
//! Each accepted client:
//!
//! 1. Completes the WebSocket upgrade on the configured path (other paths get 404)
//! 2. Is registered, which triggers a full refresh burst to the control surface
//! 3. Gets a writer task draining its outbound queue to the socket
//! 4. Has its text frames dispatched until it closes or errors
//! 5. Is marked closed and unregistered

use super::handle::BridgeHandle;
use super::udp::receive_loop;
use crate::broker::BrokerHandle;
use crate::config::BridgeConfig;
use crate::config::ControlSurfaceConfig;
use crate::dispatch::Dispatcher;
use crate::error::CoreError;
use crate::error::osc::OscError;
use crate::error::ws::WsError;
use crate::osc::{ControlSink, UdpControlSurface};
use crate::registry::{ClientConnection, ConnectionRegistry};
use crate::stats::BridgeStats;
use crate::translator::Translator;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use futures_util::{SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// Everything a client connection task needs.
#[derive(Clone)]
struct ConnectionContext {
    dispatcher: Dispatcher,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<BridgeStats>,
    ws_path: Arc<str>,
    client_buffer: usize,
}

/// Bind the OSC socket and the WebSocket listener and start serving.
///
/// # Errors
///
/// - [`CoreError::Config`] - the config does not validate
/// - [`CoreError::Osc`] - the UDP socket cannot bind or the control surface
///   host does not resolve
/// - [`CoreError::Ws`] - the WebSocket port cannot bind
pub async fn start_bridge(config: BridgeConfig) -> Result<BridgeHandle, CoreError> {
    config.validate()?;

    let stats = Arc::new(BridgeStats::new());
    let registry = Arc::new(ConnectionRegistry::new());

    let socket = UdpSocket::bind(config.control_surface.listen_address())
        .await
        .map_err(OscError::from)?;
    let osc_addr = socket.local_addr().map_err(OscError::from)?;
    let remote = resolve_control_surface(&config.control_surface).await?;
    let socket = Arc::new(socket);
    info!("OSC listening on {osc_addr}, sending to {remote}");

    let sink: Arc<dyn ControlSink> =
        Arc::new(UdpControlSurface::new(Arc::clone(&socket), remote));
    let translator = Translator::new(
        sink,
        Arc::clone(&registry),
        Arc::clone(&stats),
        config.refresh.track_count,
    );

    let (broker, broker_task) =
        BrokerHandle::from_config(&config.ipc, Arc::clone(&registry), Arc::clone(&stats));
    info!(
        "FX IPC: commands → {}, responses ← {}",
        config.ipc.command_file.display(),
        config.ipc.response_file.display()
    );

    let listener = TcpListener::bind(config.web.bind_address())
        .await
        .map_err(WsError::from)?;
    let web_addr = listener.local_addr().map_err(WsError::from)?;
    info!("WebSocket server listening on ws://{web_addr}{}", config.web.path);

    let context = ConnectionContext {
        dispatcher: Dispatcher::new(translator.clone(), broker.clone(), Arc::clone(&stats)),
        registry: Arc::clone(&registry),
        stats: Arc::clone(&stats),
        ws_path: Arc::from(config.web.path.as_str()),
        client_buffer: config.web.client_buffer,
    };

    let udp_task = tokio::spawn(receive_loop(socket, translator, Arc::clone(&stats)));
    let accept_task = tokio::spawn(accept_loop(listener, context));

    Ok(BridgeHandle {
        web_addr,
        ws_path: config.web.path,
        osc_addr,
        registry,
        stats,
        broker,
        tasks: vec![accept_task, udp_task, broker_task],
    })
}

async fn resolve_control_surface(config: &ControlSurfaceConfig) -> Result<SocketAddr, OscError> {
    if let Some(addr) = config.remote_socket_addr() {
        return Ok(addr);
    }
    let remote = config.remote_address();
    tokio::net::lookup_host(remote.as_str())
        .await?
        .next()
        .ok_or_else(|| OscError::Io {
            message: format!("Control surface host {remote} did not resolve"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Accept clients until aborted. Connection tasks live in a `JoinSet`, so
/// aborting this loop also ends every connection.
async fn accept_loop(listener: TcpListener, context: ConnectionContext) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("Client connecting from {addr}");
                    let _ = connections.spawn(serve_client(stream, addr, context.clone()));
                }
                Err(e) => error!("Failed to accept connection: {e}"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

async fn serve_client(stream: TcpStream, addr: SocketAddr, context: ConnectionContext) {
    if let Err(e) = handle_connection(stream, addr, context).await {
        warn!("Connection from {addr} ended with error: {e}");
    }
}

/// Handles a single WebSocket client from upgrade to disconnect.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    context: ConnectionContext,
) -> Result<(), WsError> {
    let expected_path = Arc::clone(&context.ws_path);
    let check_path = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        if request.uri().path() == &*expected_path {
            Ok(response)
        } else {
            let mut refusal = ErrorResponse::new(Some(format!(
                "No WebSocket endpoint at {}",
                request.uri().path()
            )));
            *refusal.status_mut() = StatusCode::NOT_FOUND;
            Err(refusal)
        }
    };

    let ws_stream = accept_hdr_async(stream, check_path)
        .await
        .map_err(|e| WsError::Handshake {
            message: format!("WebSocket handshake with {addr} failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let (mut write, mut read) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Arc<String>>(context.client_buffer);
    let connection = Arc::new(ClientConnection::new(outbound_tx));
    let connection_id = connection.id();

    let writer = tokio::spawn(async move {
        while let Some(json) = outbound_rx.recv().await {
            if let Err(e) = write.send(Message::text(json.as_str().to_owned())).await {
                debug!("Client {connection_id} write failed: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    context.registry.register(Arc::clone(&connection)).await;
    context.stats.connection_accepted();
    info!("Web client connected ({connection_id} from {addr})");

    // Prime the new client with current mixer state.
    let _ = context.dispatcher.translator().full_refresh();

    let result = read_frames(&mut read, connection_id, &context).await;

    connection.close();
    let _ = context.registry.unregister(connection_id).await;
    writer.abort();
    info!("Web client disconnected ({connection_id})");

    result
}

async fn read_frames<S>(
    read: &mut S,
    connection_id: uuid::Uuid,
    context: &ConnectionContext,
) -> Result<(), WsError>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let _ = context.dispatcher.handle_text(text.as_str());
            }
            Ok(Message::Binary(data)) => {
                warn!(
                    "Client {connection_id} sent {} byte binary frame, ignoring",
                    data.len()
                );
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(WsError::Read {
                    message: format!("Client {connection_id}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
    Ok(())
}
