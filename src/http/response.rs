//! # Construcción de Respuestas HTTP
//!
//! Este módulo compone el bloque de headers de cada respuesta y la página
//! HTML mínima de los errores.
//!
//! ## Formato del bloque de headers
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Server: mini_httpd 0.1.0\r\n
//! Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n      (opcional)
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n                       (omitido si un handler hace su propio framing)
//! Connection: Keep-Alive\r\n
//! \r\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use mini_httpd::http::{ConnectionMode, HeaderOptions, Response, StatusCode};
//!
//! let options = HeaderOptions::new("mini_httpd");
//! let response = Response::new(StatusCode::Ok)
//!     .with_content_type("text/plain")
//!     .with_body("Hello");
//!
//! let bytes = response.to_bytes(&options, ConnectionMode::Close);
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::request::{ConnectionMode, Method, Request, LOCAL_HTTP_VERSION};
use super::StatusCode;
use std::io::{self, Write};
use std::time::SystemTime;

/// Opciones comunes a todas las respuestas de un servidor
#[derive(Debug, Clone)]
pub struct HeaderOptions {
    /// Valor del header `Server:` (nombre y versión)
    pub server: String,

    /// Emitir `Date:` con la hora del host
    pub send_date: bool,
}

impl HeaderOptions {
    /// Opciones con `Server: <name> <versión del crate>` y sin `Date:`
    pub fn new(name: &str) -> Self {
        Self {
            server: format!("{} {}", name, env!("CARGO_PKG_VERSION")),
            send_date: false,
        }
    }

    pub fn with_date(mut self, send_date: bool) -> Self {
        self.send_date = send_date;
        self
    }
}

/// Representa una respuesta (headers + body opcional en memoria)
///
/// Las respuestas de archivos no llevan body aquí: se escribe la cabecera y
/// luego el contenido se transfiere por bloques.
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers extra, en orden (WWW-Authenticate, Last-Modified, ...)
    headers: Vec<(String, String)>,

    /// Content-Type
    content_type: Option<String>,

    /// Content-Length (None = el handler hace su propio framing)
    content_length: Option<u64>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            content_type: None,
            content_length: None,
            body: Vec::new(),
        }
    }

    /// Agrega un header extra
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header extra (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Establece el cuerpo desde un string
    ///
    /// Automáticamente fija `Content-Length`.
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.content_length = Some(body.len() as u64);
        self.body = body;
        self
    }

    /// Respuesta de error con la página HTML mínima
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound);
    /// let body = String::from_utf8(response.body().to_vec()).unwrap();
    /// assert!(body.contains("<TITLE>404 Not Found</TITLE>"));
    /// ```
    pub fn error(status: StatusCode) -> Self {
        let body = format!(
            "<HTML><HEAD><TITLE>{0}</TITLE></HEAD><BODY>{0}</BODY></HTML>\r\n",
            status
        );
        Self::new(status)
            .with_content_type("text/html")
            .with_body(&body)
    }

    /// Error 401 con el desafío Basic para `realm`
    pub fn unauthorized(realm: &str) -> Self {
        Self::error(StatusCode::Unauthorized)
            .with_header("WWW-Authenticate", &format!("Basic realm=\"{}\"", realm))
    }

    /// Escribe la status line y los headers (sin body)
    pub fn write_head(
        &self,
        out: &mut dyn Write,
        options: &HeaderOptions,
        connection: ConnectionMode,
    ) -> io::Result<()> {
        write!(
            out,
            "HTTP/{}.{} {}\r\nServer: {}\r\n",
            LOCAL_HTTP_VERSION / 10,
            LOCAL_HTTP_VERSION % 10,
            self.status,
            options.server
        )?;
        if options.send_date {
            write!(out, "Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now()))?;
        }
        for (name, value) in &self.headers {
            write!(out, "{}: {}\r\n", name, value)?;
        }
        if let Some(content_type) = &self.content_type {
            write!(out, "Content-Type: {}\r\n", content_type)?;
        }
        if let Some(length) = self.content_length {
            write!(out, "Content-Length: {}\r\n", length)?;
        }
        write!(out, "Connection: {}\r\n\r\n", connection.as_header_value())
    }

    /// Convierte la respuesta completa a bytes
    pub fn to_bytes(&self, options: &HeaderOptions, connection: ConnectionMode) -> Vec<u8> {
        let mut result = Vec::new();
        // Escribir en un Vec no falla
        let _ = self.write_head(&mut result, options, connection);
        result.extend_from_slice(&self.body);
        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene los headers extra
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Lo que recibe un handler: el stream de salida y el request en curso
///
/// `Exchange` implementa `Write`, así que un handler puede escribir su propio
/// contenido después de enviar la cabecera.
pub struct Exchange<'a> {
    out: &'a mut dyn Write,
    request: &'a mut Request,
    options: &'a HeaderOptions,
}

impl<'a> Exchange<'a> {
    pub fn new(out: &'a mut dyn Write, request: &'a mut Request, options: &'a HeaderOptions) -> Self {
        Self { out, request, options }
    }

    /// Request que se está respondiendo
    pub fn request(&self) -> &Request {
        &*self.request
    }

    /// Acceso mutable al request (ej: para forzar el cierre)
    pub fn request_mut(&mut self) -> &mut Request {
        &mut *self.request
    }

    pub fn options(&self) -> &HeaderOptions {
        self.options
    }

    /// Envía solo la cabecera de `response`
    ///
    /// Un status de error fuerza `Connection: close`.
    pub fn send_head(&mut self, response: &Response) -> io::Result<()> {
        if response.status().is_error() {
            self.request.force_close();
        }
        response.write_head(&mut *self.out, self.options, self.request.connection())
    }

    /// Envía la respuesta completa (el body se omite para HEAD)
    pub fn send(&mut self, response: &Response) -> io::Result<()> {
        self.send_head(response)?;
        if self.request.method() != Method::HEAD {
            self.out.write_all(response.body())?;
        }
        Ok(())
    }

    /// Envía la respuesta de error para `status`
    ///
    /// Para 401 agrega el desafío con el realm del request.
    pub fn send_error(&mut self, status: StatusCode) -> io::Result<()> {
        let response = if status == StatusCode::Unauthorized {
            Response::unauthorized(&self.request.realm())
        } else {
            Response::error(status)
        };
        self.send(&response)
    }
}

impl Write for Exchange<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.out.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
