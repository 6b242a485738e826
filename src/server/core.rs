//! Listener and connection handling

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{error, info, warn};
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::access::AllowList;
use crate::config::ServerConfig;
use crate::error::RequestError;
use crate::middleware::AuditLog;
use crate::protocol::{Dispatcher, Method, SaveRequest, SaveResponse, parse_method};
use crate::storage::PathSandbox;

pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl Server {
    /// Loads the allow-list, fixes the document root and binds the listener.
    ///
    /// The bind host is loopback when nothing but loopback is allowed, every
    /// interface otherwise.
    pub async fn new(config: &ServerConfig) -> io::Result<Self> {
        let allow_list = AllowList::load(&config.allow_list_path());

        let document_root = match config.canonical_document_root() {
            Ok(root) => root,
            Err(e) => {
                error!(
                    "Document root {} is not usable: {}",
                    config.document_root, e
                );
                return Err(e);
            }
        };

        let socket = config.listen_socket(&allow_list);
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        let dispatcher = Dispatcher::new(
            allow_list,
            PathSandbox::new(&document_root)?,
            AuditLog::new(config.log_file_path()),
        );

        Ok(Self::with_listener(listener, dispatcher))
    }

    /// Wraps an already bound listener
    pub fn with_listener(listener: TcpListener, dispatcher: Dispatcher) -> Self {
        Self {
            listener,
            dispatcher: Arc::new(Mutex::new(dispatcher)),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        {
            let dispatcher = self.dispatcher.lock().await;
            info!(
                "Serving '{}' at {}",
                dispatcher.document_root().display(),
                self.local_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "<unknown>".into())
            );
            info!(
                "Allowed client addresses: {:?}",
                dispatcher.allow_list().addresses()
            );
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let dispatcher = Arc::clone(&self.dispatcher);

                    // Connections are accepted concurrently; requests are not.
                    // See `handle_request`.
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, addr, dispatcher).await {
                            warn!("Connection from {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Mutex<Dispatcher>>,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { handle_request(request, peer, dispatcher).await }
    });

    http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
}

/// Handles one HTTP request while holding the dispatcher lock, so the body
/// upload, document write, backup append and log append of one request all
/// complete before the next request is looked at.
async fn handle_request(
    request: Request<Incoming>,
    peer: SocketAddr,
    dispatcher: Arc<Mutex<Dispatcher>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = parse_method(request.method().as_str());
    let mut save_request = SaveRequest {
        remote: peer.ip(),
        method,
        path: request.uri().path().to_string(),
        body: Bytes::new(),
    };

    let dispatcher = dispatcher.lock().await;

    // Bodies are only consumed for writes from allowed clients
    if save_request.method == Method::Put && dispatcher.allows(&save_request.remote) {
        match request.into_body().collect().await {
            Ok(collected) => save_request.body = collected.to_bytes(),
            Err(e) => {
                let err = RequestError::IoError(io::Error::other(e.to_string()));
                let response = dispatcher.fail(&save_request, err);
                return Ok(to_http_response(response));
            }
        }
    }

    let response = dispatcher.handle(&save_request);
    Ok(to_http_response(response))
}

fn to_http_response(response: SaveResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(*name, value.as_str());
    }

    match builder.body(Full::new(response.body)) {
        Ok(http_response) => http_response,
        Err(e) => {
            error!("Failed to build response: {}", e);
            let mut fallback = Response::new(Full::new(Bytes::from_static(
                b"Internal Server Error",
            )));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        }
    }
}
