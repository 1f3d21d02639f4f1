//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Creación del socket de escucha y ajuste de los parámetros TCP. El socket
//! de escucha se comparte entre todos los workers del pool; cada conexión
//! aceptada hereda MSS y buffers y recibe su propio timeout de lectura.

use super::pool::WorkerPool;
use crate::config::Config;
use crate::router::Router;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Parámetros TCP que se aplican a cada socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketTuning {
    /// Tamaño máximo de segmento
    pub segment_size: u32,

    /// Buffers de envío y recepción
    pub buffer_size: usize,

    /// Timeout de lectura de cada conexión
    pub read_timeout: Duration,
}

impl SocketTuning {
    pub fn from_config(config: &Config) -> Self {
        Self {
            segment_size: config.segment_size,
            buffer_size: config.tcp_buffer,
            read_timeout: config.read_timeout(),
        }
    }

    /// Ajustes del socket de escucha (los heredan las conexiones)
    fn apply_to_listener(&self, socket: &Socket) -> io::Result<()> {
        #[cfg(target_os = "linux")]
        socket.set_mss(self.segment_size)?;
        socket.set_recv_buffer_size(self.buffer_size)?;
        socket.set_send_buffer_size(self.buffer_size)?;
        Ok(())
    }

    /// Ajustes de una conexión aceptada
    pub fn apply_to_stream(&self, stream: &TcpStream) -> io::Result<()> {
        let socket = SockRef::from(stream);
        socket.set_recv_buffer_size(self.buffer_size)?;
        socket.set_send_buffer_size(self.buffer_size)?;
        stream.set_read_timeout(Some(self.read_timeout))
    }
}

impl Default for SocketTuning {
    fn default() -> Self {
        Self {
            segment_size: 1460,
            buffer_size: 8760,
            read_timeout: Duration::from_millis(500),
        }
    }
}

/// Crea el socket de escucha ya ajustado
pub fn bind_listener(address: SocketAddr, tuning: &SocketTuning) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    tuning.apply_to_listener(&socket)?;
    socket.bind(&address.into())?;
    socket.listen(128)?;
    Ok(socket.into())
}

/// Servidor HTTP: socket de escucha + pool de workers
pub struct Server {
    config: Config,
    router: Arc<Router>,
}

impl Server {
    pub fn new(config: Config, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Crea el socket y arranca los workers mínimos
    ///
    /// Retorna el pool para poder consultarlo (dirección, workers vivos).
    pub fn start(&self) -> io::Result<Arc<WorkerPool>> {
        let address = self
            .config
            .address()
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolves to nothing"))?;

        let tuning = SocketTuning::from_config(&self.config);
        let listener = bind_listener(address, &tuning)?;
        let pool = Arc::new(WorkerPool::new(listener, Arc::clone(&self.router), &self.config));
        pool.start();

        info!(address = %pool.local_addr()?, workers = pool.worker_count(), "servidor escuchando");
        Ok(pool)
    }

    /// Arranca y bloquea el thread actual para siempre
    pub fn run(&self) -> io::Result<()> {
        let _pool = self.start()?;
        loop {
            thread::park();
        }
    }
}
