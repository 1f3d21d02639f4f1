//! # Control de Acceso (Basic Auth)
//! src/router/auth.rs
//!
//! Tabla de directorios protegidos. Cada entrada asocia un prefijo de
//! directorio con una credencial `usuario:password`; un mismo directorio
//! puede tener varias entradas (varios usuarios).
//!
//! La comparación es exacta contra el texto decodificado del header
//! `Authorization: Basic <base64>`. No es criptográficamente robusta.
//!
//! ## Archivo de configuración
//!
//! ```json
//! [
//!   {"path": "private", "credential": "admin:secret"},
//!   {"path": "cgi-bin", "credential": "root:toor"}
//! ]
//! ```

use crate::http::Request;
use base64ct::{Base64, Encoding};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Una entrada de la tabla
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthEntry {
    /// Prefijo del directorio protegido, relativo a la raíz
    pub path: String,

    /// Credencial esperada, `usuario:password`
    pub credential: String,
}

/// Tabla de autorización (solo lectura mientras el servidor corre)
#[derive(Debug, Clone, Default)]
pub struct AuthTable {
    entries: Vec<AuthEntry>,
}

impl AuthTable {
    /// Crea una tabla vacía (nada está protegido)
    pub fn new() -> Self {
        Self::default()
    }

    /// Protege `path` con la credencial `credential`
    pub fn protect(mut self, path: &str, credential: &str) -> Self {
        self.entries.push(AuthEntry {
            path: path.trim_matches('/').to_string(),
            credential: credential.to_string(),
        });
        self
    }

    /// Carga la tabla desde un archivo JSON
    pub fn from_json_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let entries: Vec<AuthEntry> = serde_json::from_reader(reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(entries
            .into_iter()
            .fold(Self::new(), |table, entry| table.protect(&entry.path, &entry.credential)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entradas cuyo prefijo cubre `url` (sin distinguir mayúsculas)
    fn matching<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a AuthEntry> + 'a {
        let url = url.as_bytes();
        self.entries.iter().filter(move |entry| {
            let prefix = entry.path.as_bytes();
            url.len() >= prefix.len() && url[..prefix.len()].eq_ignore_ascii_case(prefix)
        })
    }

    /// Verifica si una URL (relativa a la raíz) está protegida
    pub fn is_protected(&self, url: &str) -> bool {
        self.matching(url).next().is_some()
    }

    /// Valida el request contra la tabla
    ///
    /// Retorna `true` si la URL no está protegida o si la credencial del
    /// header coincide con alguna entrada que la cubre.
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::Request;
    /// use mini_httpd::router::AuthTable;
    ///
    /// let table = AuthTable::new().protect("private", "admin:secret");
    ///
    /// // "YWRtaW46c2VjcmV0" = base64("admin:secret")
    /// let ok = Request::parse(
    ///     b"GET /private/a.html HTTP/1.1\r\nAuthorization: Basic YWRtaW46c2VjcmV0\r\n\r\n",
    /// ).unwrap();
    /// assert!(table.validate(&ok));
    ///
    /// let missing = Request::parse(b"GET /private/a.html HTTP/1.1\r\n\r\n").unwrap();
    /// assert!(!table.validate(&missing));
    /// ```
    pub fn validate(&self, request: &Request) -> bool {
        let url = request.url();
        if !self.is_protected(url) {
            return true;
        }

        let Some(credential) = request.authorization().and_then(decode_basic) else {
            return false;
        };
        self.matching(url).any(|entry| entry.credential == credential)
    }
}

/// Decodifica `Basic <base64>` a `usuario:password`
fn decode_basic(header: &str) -> Option<String> {
    let scheme = header.get(..6)?;
    if !scheme.eq_ignore_ascii_case("Basic ") {
        return None;
    }
    let decoded = Base64::decode_vec(header[6..].trim()).ok()?;
    String::from_utf8(decoded).ok()
}
