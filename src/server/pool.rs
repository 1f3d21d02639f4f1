//! # Pool de Workers
//! src/server/pool.rs
//!
//! Cada worker es un thread que bloquea en `accept` sobre el socket de
//! escucha compartido. El pool crece y se achica solo:
//!
//! 1. Al aceptar una conexión, el worker verifica que haya memoria libre.
//!    Si después de varios reintentos sigue faltando, cierra la conexión
//!    sin atenderla.
//! 2. Antes de atender, crea otro worker (si no se llegó al máximo) para
//!    que siempre haya alguien esperando el siguiente cliente.
//! 3. Al terminar la conexión, si hay más workers que el mínimo, el worker
//!    termina; si no, vuelve a `accept`.
//!
//! El contador de workers vive bajo un `Mutex`: revisar el tope y sumar es
//! una sola operación.

use super::connection::{Connection, ConnectionLimits};
use super::memory::{is_adequate, MemoryProbe, SystemMemory};
use super::tcp::SocketTuning;
use crate::config::Config;
use crate::router::Router;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Parámetros del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub min_workers: usize,
    pub max_workers: usize,

    /// Memoria libre mínima para atender una conexión
    pub min_free_memory: u64,

    /// Reintentos de la verificación de memoria
    pub memory_retries: u32,
    pub memory_retry_delay: Duration,

    /// Espera después de un fallo al crear un worker o un socket
    pub retry_delay: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_workers: config.min_workers,
            max_workers: config.max_workers,
            min_free_memory: config.min_free_memory,
            memory_retries: config.memory_retries,
            memory_retry_delay: config.memory_retry_delay(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Pool de workers sobre un socket de escucha compartido
pub struct WorkerPool {
    listener: TcpListener,
    router: Arc<Router>,
    limits: ConnectionLimits,
    tuning: SocketTuning,
    settings: PoolSettings,
    memory: Box<dyn MemoryProbe>,

    /// Workers vivos (esperando o atendiendo)
    workers: Mutex<usize>,

    /// Ids crecientes, solo para los logs
    next_id: AtomicUsize,
}

impl WorkerPool {
    pub fn new(listener: TcpListener, router: Arc<Router>, config: &Config) -> Self {
        Self {
            listener,
            router,
            limits: ConnectionLimits::from_config(config),
            tuning: SocketTuning::from_config(config),
            settings: PoolSettings::from_config(config),
            memory: Box::new(SystemMemory),
            workers: Mutex::new(0),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Reemplaza la sonda de memoria (antes de `start`)
    pub fn with_memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory = Box::new(probe);
        self
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Workers vivos en este momento
    pub fn worker_count(&self) -> usize {
        *self.lock_workers()
    }

    fn lock_workers(&self) -> MutexGuard<'_, usize> {
        // El contador sigue siendo válido aunque un worker haya entrado en pánico
        self.workers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Arranca workers hasta llegar al mínimo
    ///
    /// Un fallo al crear el thread se reintenta después de `retry_delay`.
    pub fn start(self: &Arc<Self>) {
        while self.worker_count() < self.settings.min_workers {
            if !self.try_spawn() {
                thread::sleep(self.settings.retry_delay);
            }
        }
    }

    /// Crea un worker si no se llegó al máximo
    fn try_spawn(self: &Arc<Self>) -> bool {
        {
            let mut workers = self.lock_workers();
            if *workers >= self.settings.max_workers {
                return false;
            }
            *workers += 1;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pool = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || pool.worker_loop(id));

        match spawned {
            Ok(_) => true,
            Err(e) => {
                warn!(worker = id, error = %e, "no se pudo crear el worker");
                *self.lock_workers() -= 1;
                false
            }
        }
    }

    /// Retira al worker si sobra; `true` si debe terminar
    fn retire_if_surplus(&self) -> bool {
        let mut workers = self.lock_workers();
        if *workers > self.settings.min_workers {
            *workers -= 1;
            true
        } else {
            false
        }
    }

    fn worker_loop(self: Arc<Self>, id: usize) {
        debug!(worker = id, "worker iniciado");

        let listener = loop {
            match self.listener.try_clone() {
                Ok(listener) => break listener,
                Err(e) => {
                    warn!(worker = id, error = %e, "no se pudo clonar el socket de escucha");
                    thread::sleep(self.settings.retry_delay);
                }
            }
        };

        loop {
            let (stream, peer) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(worker = id, error = %e, "error al aceptar conexión");
                    thread::sleep(self.settings.retry_delay);
                    continue;
                }
            };
            debug!(worker = id, peer = %peer, "conexión aceptada");

            if !self.admit(id) {
                warn!(worker = id, peer = %peer, "memoria insuficiente, conexión descartada");
                drop(stream);
                continue;
            }

            // Siempre debe quedar alguien esperando en accept
            if !self.try_spawn() {
                debug!(worker = id, "pool en el máximo");
            }

            self.serve(id, stream);

            if self.retire_if_surplus() {
                debug!(worker = id, "worker terminado");
                return;
            }
        }
    }

    /// Espera a que haya memoria libre suficiente
    fn admit(&self, id: usize) -> bool {
        for attempt in 0..=self.settings.memory_retries {
            if is_adequate(self.memory.as_ref(), self.settings.min_free_memory) {
                return true;
            }
            if attempt < self.settings.memory_retries {
                debug!(worker = id, attempt, "poca memoria, esperando");
                thread::sleep(self.settings.memory_retry_delay);
            }
        }
        false
    }

    /// Atiende una conexión hasta que se cierra
    fn serve(&self, id: usize, stream: TcpStream) {
        if let Err(e) = self.tuning.apply_to_stream(&stream) {
            debug!(worker = id, error = %e, "no se pudo ajustar el socket");
        }

        let mut connection = Connection::new(stream, self.limits);
        match connection.serve(&self.router) {
            Ok(served) => debug!(worker = id, requests = served, "conexión cerrada"),
            Err(e) => debug!(worker = id, error = %e, "conexión abortada"),
        }
        linger_close(connection.into_inner());
    }
}

/// Tiempo máximo que se espera al peer antes de soltar el socket
const LINGER_TIMEOUT: Duration = Duration::from_millis(100);

/// Cierra la escritura y descarta lo que el peer todavía envíe
///
/// Cerrar con datos sin leer hace que el kernel mande RST, y el peer puede
/// perder la última respuesta.
fn linger_close(mut stream: TcpStream) {
    if stream.shutdown(Shutdown::Write).is_err() {
        return;
    }
    let _ = stream.set_read_timeout(Some(LINGER_TIMEOUT));
    let mut discard = [0u8; 512];
    for _ in 0..8 {
        match stream.read(&mut discard) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}
