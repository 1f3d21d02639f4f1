//! # Módulo HTTP
//!
//! Implementación del subconjunto HTTP/1.0 - HTTP/1.1 que usa el servidor:
//!
//! - Parsing de requests (request line + headers capturados)
//! - Decodificación de query strings y paths
//! - Composición de la cabecera de respuesta y páginas de error
//! - Registro de tipos MIME
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Server: mini_httpd 0.1.0\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! Connection: Keep-Alive\r\n
//! \r\n
//! <html>...
//! ```

pub mod mime; // Tabla extensión → content-type
pub mod query; // Decodificación de query strings y paths
pub mod request; // Parsing de HTTP requests
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use mime::{MimeHandler, MimeRegistry};
pub use query::QueryParams;
pub use request::{ConnectionMode, HeaderBlock, HeaderField, Method, ParseError, Request};
pub use response::{Exchange, HeaderOptions, Response};
pub use status::StatusCode;
