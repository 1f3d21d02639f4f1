//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo decide quién responde cada request ya parseado.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Auth → ¿cgi-bin/? → CGI
//!                      │
//!                      └─────→ Archivos estáticos
//! ```
//!
//! Las tablas (MIME, CGI, Auth) se arman al arrancar y durante el servicio
//! solo se leen, así que el router se comparte entre workers con un `Arc`.

pub mod auth;
pub mod cgi;
pub mod files;

pub use auth::{AuthEntry, AuthTable};
pub use cgi::{CgiHandler, CgiRegistry, CGI_PREFIX};
pub use files::{StaticFiles, DEFAULT_FILES};

use crate::http::{ConnectionMode, Exchange, HeaderOptions, MimeRegistry, Request, Response, StatusCode};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

/// Router: auth, CGIs y archivos estáticos
#[derive(Debug, Clone)]
pub struct Router {
    files: StaticFiles,
    cgi: CgiRegistry,
    auth: AuthTable,
    options: HeaderOptions,
}

impl Router {
    /// Crea un router que sirve archivos desde `root`, sin CGIs ni auth
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            files: StaticFiles::new(root, MimeRegistry::standard()),
            cgi: CgiRegistry::new(),
            auth: AuthTable::new(),
            options: HeaderOptions::new("mini_httpd"),
        }
    }

    /// Registra un CGI bajo `cgi-bin/<name>`
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::{Exchange, Response, StatusCode};
    /// use mini_httpd::router::Router;
    ///
    /// fn hello(exchange: &mut Exchange<'_>) -> std::io::Result<()> {
    ///     exchange.send(&Response::new(StatusCode::Ok).with_body("hello"))
    /// }
    ///
    /// let router = Router::new("./html").register("hello.cgi", hello);
    /// assert_eq!(router.cgi().len(), 1);
    /// ```
    pub fn register(mut self, name: &str, handler: CgiHandler) -> Self {
        self.cgi = self.cgi.register(name, handler);
        self
    }

    pub fn with_cgi(mut self, cgi: CgiRegistry) -> Self {
        self.cgi = cgi;
        self
    }

    pub fn with_mime(mut self, mime: MimeRegistry) -> Self {
        self.files = self.files.with_mime(mime);
        self
    }

    pub fn with_auth(mut self, auth: AuthTable) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_options(mut self, options: HeaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.files = self.files.with_chunk_size(chunk_size);
        self
    }

    pub fn with_file_time(mut self, use_file_time: bool) -> Self {
        self.files = self.files.with_file_time(use_file_time);
        self
    }

    pub fn options(&self) -> &HeaderOptions {
        &self.options
    }

    pub fn cgi(&self) -> &CgiRegistry {
        &self.cgi
    }

    pub fn auth(&self) -> &AuthTable {
        &self.auth
    }

    pub fn files(&self) -> &StaticFiles {
        &self.files
    }

    /// Responde un request
    ///
    /// Siempre envía exactamente una respuesta; solo falla si el stream de
    /// salida falla. Un status de error deja el request marcado para cerrar.
    pub fn dispatch(&self, out: &mut dyn Write, request: &mut Request) -> io::Result<()> {
        debug!(method = request.method().as_str(), url = request.url(), "dispatch");
        let mut exchange = Exchange::new(out, request, &self.options);

        if !self.auth.validate(exchange.request()) {
            debug!(realm = exchange.request().realm(), "credencial inválida");
            return exchange.send_error(StatusCode::Unauthorized);
        }

        if CgiRegistry::is_cgi_url(exchange.request().url()) {
            return match self.cgi.handler_for(exchange.request().url()) {
                Some(handler) => handler(&mut exchange),
                None => exchange.send_error(StatusCode::NotFound),
            };
        }

        self.files.serve(&mut exchange)
    }

    /// Respuesta de error cuando no hay request (falló el parsing)
    ///
    /// La conexión siempre se cierra después.
    pub fn reject(&self, out: &mut dyn Write, status: StatusCode) -> io::Result<()> {
        out.write_all(&Response::error(status).to_bytes(&self.options, ConnectionMode::Close))
    }
}
