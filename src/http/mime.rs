//! # Registro de Tipos MIME
//! src/http/mime.rs
//!
//! Tabla ordenada extensión → content-type, con un handler opcional por tipo.
//! La primera extensión que coincide (sin distinguir mayúsculas) gana.
//!
//! Los valores por defecto son asimétricos:
//! - la entrada 0 (`.txt`) se usa cuando ninguna extensión coincide
//! - la entrada 1 (`.html`) se usa cuando el nombre está vacío

use super::response::Exchange;
use std::fs::File;
use std::io;
use std::path::Path;

/// Handler para un tipo MIME
///
/// Recibe el archivo abierto, su tamaño y la raíz configurada. Los headers de
/// arriba y `Content-Type` ya fueron enviados (sin `Content-Length`); el
/// handler es responsable del resto de la respuesta.
pub type MimeHandler = fn(&mut Exchange<'_>, File, u64, &Path) -> io::Result<()>;

/// Una entrada de la tabla
#[derive(Clone)]
pub struct MimeType {
    /// Extensión con el punto (ej: ".html")
    pub extension: String,

    /// Content-Type que se envía
    pub content_type: String,

    /// Handler opcional
    pub handler: Option<MimeHandler>,
}

impl std::fmt::Debug for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MimeType")
            .field("extension", &self.extension)
            .field("content_type", &self.content_type)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Tabla por defecto. El orden importa: ver la documentación del módulo.
const STANDARD_TYPES: &[(&str, &str)] = &[
    (".txt", "text/plain"),
    (".html", "text/html"),
    (".shtml", "text/html"),
    (".asp", "text/html"),
    (".htm", "text/html"),
    (".gif", "image/gif"),
    (".jpg", "image/jpeg"),
    (".png", "image/png"),
    (".pdf", "application/pdf"),
    (".js", "application/x-javascript"),
    (".jar", "application/x-java-archive"),
    (".css", "text/css"),
    (".xml", "text/xml"),
];

/// Registro inmutable una vez que arranca el servidor
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    entries: Vec<MimeType>,
}

impl MimeRegistry {
    /// Crea el registro con la tabla por defecto
    pub fn standard() -> Self {
        let entries = STANDARD_TYPES
            .iter()
            .map(|(ext, ct)| MimeType {
                extension: ext.to_string(),
                content_type: ct.to_string(),
                handler: None,
            })
            .collect();

        Self { entries }
    }

    /// Registra (o reemplaza) una extensión
    ///
    /// Una extensión existente conserva su posición en la tabla.
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::MimeRegistry;
    ///
    /// let registry = MimeRegistry::standard().register(".svg", "image/svg+xml", None);
    /// assert_eq!(registry.content_type("logo.SVG"), "image/svg+xml");
    /// ```
    pub fn register(mut self, extension: &str, content_type: &str, handler: Option<MimeHandler>) -> Self {
        let entry = MimeType {
            extension: extension.to_string(),
            content_type: content_type.to_string(),
            handler,
        };

        match self
            .entries
            .iter_mut()
            .find(|e| e.extension.eq_ignore_ascii_case(extension))
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Asigna un handler a una extensión ya registrada
    pub fn with_handler(mut self, extension: &str, handler: MimeHandler) -> Self {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.extension.eq_ignore_ascii_case(extension))
        {
            entry.handler = Some(handler);
        }
        self
    }

    /// Busca la entrada que corresponde a un nombre de archivo
    pub fn lookup(&self, name: &str) -> &MimeType {
        if name.is_empty() {
            return &self.entries[1];
        }

        let name = name.as_bytes();
        self.entries
            .iter()
            .find(|entry| {
                let ext = entry.extension.as_bytes();
                name.len() >= ext.len() && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
            })
            .unwrap_or(&self.entries[0])
    }

    /// Content-Type para un nombre de archivo
    pub fn content_type(&self, name: &str) -> &str {
        &self.lookup(name).content_type
    }

    /// Handler registrado para un nombre de archivo
    pub fn handler(&self, name: &str) -> Option<MimeHandler> {
        self.lookup(name).handler
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler(_: &mut Exchange<'_>, _: File, _: u64, _: &Path) -> io::Result<()> {
        Ok(())
    }

    #[test]
    fn test_known_extensions() {
        let registry = MimeRegistry::standard();
        assert_eq!(registry.content_type("index.html"), "text/html");
        assert_eq!(registry.content_type("img/logo.png"), "image/png");
        assert_eq!(registry.content_type("style.css"), "text/css");
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let registry = MimeRegistry::standard();
        assert_eq!(registry.content_type("PHOTO.JPG"), "image/jpeg");
    }

    #[test]
    fn test_unmatched_extension_uses_first_entry() {
        let registry = MimeRegistry::standard();
        assert_eq!(registry.content_type("archive.tar.gz"), "text/plain");
        assert_eq!(registry.content_type("docs/"), "text/plain");
    }

    #[test]
    fn test_empty_name_uses_second_entry() {
        // Asimetría intencional: nombre vacío → entrada 1, no la 0
        let registry = MimeRegistry::standard();
        assert_eq!(registry.content_type(""), "text/html");
    }

    #[test]
    fn test_name_shorter_than_extension() {
        let registry = MimeRegistry::standard();
        assert_eq!(registry.content_type("s"), "text/plain");
    }

    #[test]
    fn test_register_keeps_position() {
        let registry = MimeRegistry::standard().register(".txt", "text/plain; charset=utf-8", None);
        assert_eq!(registry.len(), STANDARD_TYPES.len());
        assert_eq!(registry.content_type("unknown.bin"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_handlers() {
        let registry = MimeRegistry::standard().with_handler(".shtml", noop_handler);
        assert!(registry.handler("index.shtml").is_some());
        assert!(registry.handler("index.html").is_none());
        // .html no se confunde con .shtml: la tabla busca en orden
        assert_eq!(registry.lookup("page.shtml").extension, ".shtml");
    }
}
