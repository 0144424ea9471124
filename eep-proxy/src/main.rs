//! Reference binary: a length-prefixed TCP transport and an in-memory pool
//! manager wired up to the core dispatcher.
//!
//! Wire framing mirrors a classic length-prefixed proxy: each frame is a
//! 4-byte little-endian length followed by that many bytes, the first of
//! which is the message tag and the rest the payload. One background thread
//! per accepted connection drives `ProxyEndpoint::run`; sends go straight to
//! a mutex-guarded socket clone so host threads can call `invoke`/`get_api`
//! concurrently with the connection's own read loop.

use clap::Parser;
use eep::error::{PoolError, TransportIoError};
use eep::pool::{EngineKind, PoolManager};
use eep::proxy::ProxyEndpoint;
use eep::transport::{FrameReceiver, FrameSender};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

#[derive(Parser, Debug)]
#[command(name = "eep-proxy", about = "Execution-Engine Proxy reference listener")]
struct Args {
    /// Address the proxy listens on for engine connections, e.g. 127.0.0.1:9200.
    #[arg(long, default_value = "127.0.0.1:9200")]
    engine_socket: String,

    /// Number of engine instances expected to connect; logged only, the
    /// listener accepts whatever shows up.
    #[arg(long, default_value_t = 1)]
    engine_instances: u32,
}

/// Sends frames over a cloned `TcpStream`, serializing writers behind a
/// mutex so `invoke`/`get_api`/`send_result` calls from different host
/// threads don't interleave their bytes on the wire.
#[derive(Debug)]
struct TcpFrameSender {
    stream: Mutex<TcpStream>,
}

impl FrameSender for TcpFrameSender {
    fn send_frame(&self, tag: u8, payload: Vec<u8>) -> Result<(), TransportIoError> {
        let len = (payload.len() + 1) as u32;
        let mut stream = self.stream.lock().unwrap();
        stream.write_all(&len.to_le_bytes()).map_err(io_err)?;
        stream.write_all(&[tag]).map_err(io_err)?;
        stream.write_all(&payload).map_err(io_err)?;
        stream.flush().map_err(io_err)
    }

    fn close(&self) {
        if let Ok(stream) = self.stream.lock() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}

/// Reads length-prefixed frames from a blocking `TcpStream`.
struct TcpFrameReceiver {
    stream: TcpStream,
}

impl FrameReceiver for TcpFrameReceiver {
    fn recv_frame(&mut self) -> Result<(u8, Vec<u8>), TransportIoError> {
        let mut len_bytes = [0u8; 4];
        self.stream.read_exact(&mut len_bytes).map_err(io_err)?;
        let len = u32::from_le_bytes(len_bytes) as usize;
        if len == 0 {
            return Err(TransportIoError("empty frame (missing tag byte)".into()));
        }
        let mut body = vec![0u8; len];
        self.stream.read_exact(&mut body).map_err(io_err)?;
        let tag = body[0];
        Ok((tag, body.split_off(1)))
    }
}

fn io_err(e: std::io::Error) -> TransportIoError {
    TransportIoError(e.to_string())
}

/// Reference pool manager: a plain per-kind vector of idle proxies, no
/// intrusive linkage. `kill` only has a `uid` to go on since the manager
/// never tracked the socket itself, so it just logs; tearing down the
/// connection already happened via `ProxyEndpoint::kill`'s call to
/// `sender.close()`.
#[derive(Default)]
struct InMemoryPoolManager {
    idle: Mutex<HashMap<EngineKind, Vec<Arc<ProxyEndpoint>>>>,
}

impl PoolManager for InMemoryPoolManager {
    fn on_ready(&self, kind: EngineKind, proxy: Arc<ProxyEndpoint>) -> Result<(), PoolError> {
        tracing::debug!(%kind, uid = ?proxy.uid(), "engine idle");
        self.idle.lock().unwrap().entry(kind).or_default().push(proxy);
        Ok(())
    }

    fn kill(&self, uid: &str) -> Result<(), PoolError> {
        tracing::info!(uid, "kill requested");
        let mut idle = self.idle.lock().unwrap();
        for bucket in idle.values_mut() {
            bucket.retain(|p| p.uid().as_deref() != Some(uid));
        }
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    tracing::info!(addr = %args.engine_socket, instances = args.engine_instances, "starting listener");

    let manager: Arc<dyn PoolManager> = Arc::new(InMemoryPoolManager::default());
    let listener = TcpListener::bind(&args.engine_socket).expect("failed to bind engine socket");

    for conn in listener.incoming() {
        let stream = match conn {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let write_half = stream.try_clone().expect("failed to clone stream for writer");
        let sender: Arc<dyn FrameSender> = Arc::new(TcpFrameSender { stream: Mutex::new(write_half) });
        let proxy = ProxyEndpoint::new(sender, manager.clone());
        let receiver = TcpFrameReceiver { stream };
        std::thread::spawn(move || proxy.run(receiver));
    }
}
