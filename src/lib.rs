//! # mini_httpd
//! src/lib.rs
//!
//! Servidor HTTP/1.0 - HTTP/1.1 pensado para equipos con poca memoria:
//! buffers acotados, transferencia de archivos por bloques y un pool de
//! workers que solo acepta conexiones cuando hay memoria libre.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing de requests, query strings, headers de respuesta y tipos MIME
//! - `router`: Auth, CGIs y archivos estáticos
//! - `server`: Socket de escucha, pool de workers y ciclo de cada conexión
//! - `commands`: CGIs de ejemplo
//! - `config`: Configuración por CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use mini_httpd::config::Config;
//! use mini_httpd::router::Router;
//! use mini_httpd::server::Server;
//!
//! let config = Config::default();
//! let router = Router::new(&config.root);
//! let server = Server::new(config, router);
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod commands;
pub mod config;
pub mod http;
pub mod router;
pub mod server;
