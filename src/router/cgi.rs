//! # Registro de CGIs
//! src/router/cgi.rs
//!
//! Mapea nombres bajo `cgi-bin/` a funciones que generan la respuesta
//! completa. Se llena una vez al arrancar y luego solo se lee.

use crate::http::Exchange;
use std::collections::HashMap;
use std::io;

/// Prefijo fijo de las URLs de CGI (relativo a la raíz)
pub const CGI_PREFIX: &str = "cgi-bin/";

/// Tipo de función CGI
///
/// Un CGI tiene control total del framing de la respuesta: debe enviar la
/// cabecera (por ejemplo con [`Exchange::send`]) y el contenido.
pub type CgiHandler = fn(&mut Exchange<'_>) -> io::Result<()>;

/// Registro nombre → CGI
#[derive(Default, Clone)]
pub struct CgiRegistry {
    handlers: HashMap<String, CgiHandler>,
}

impl CgiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un CGI
    ///
    /// `name` es el nombre después de `cgi-bin/` (ej: "test.cgi").
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::{Exchange, Response, StatusCode};
    /// use mini_httpd::router::CgiRegistry;
    ///
    /// fn hello(exchange: &mut Exchange<'_>) -> std::io::Result<()> {
    ///     exchange.send(&Response::new(StatusCode::Ok).with_body("hello"))
    /// }
    ///
    /// let registry = CgiRegistry::new().register("hello.cgi", hello);
    /// assert!(registry.handler_for("cgi-bin/hello.cgi").is_some());
    /// ```
    pub fn register(mut self, name: &str, handler: CgiHandler) -> Self {
        self.handlers.insert(name.to_string(), handler);
        self
    }

    /// Verifica si una URL apunta al directorio de CGIs
    pub fn is_cgi_url(url: &str) -> bool {
        url.get(..CGI_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CGI_PREFIX))
    }

    /// Busca el CGI para una URL (`None` si no es CGI o no está registrado)
    pub fn handler_for(&self, url: &str) -> Option<CgiHandler> {
        if !Self::is_cgi_url(url) {
            return None;
        }
        self.handlers.get(&url[CGI_PREFIX.len()..]).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for CgiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
