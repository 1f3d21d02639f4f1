//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el lado de transporte:
//! 1. Crea el socket de escucha y ajusta los parámetros TCP
//! 2. Mantiene un pool de workers que aceptan conexiones
//! 3. Admite cada conexión solo si hay memoria libre
//! 4. Atiende los requests de cada conexión hasta que se cierra

pub mod connection;
pub mod memory;
pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{Connection, ConnectionLimits, NextRequest};
pub use memory::{FixedMemory, MemoryProbe, SystemMemory};
pub use pool::{PoolSettings, WorkerPool};
pub use tcp::{bind_listener, Server, SocketTuning};
