//! # Archivos Estáticos
//! src/router/files.rs
//!
//! Resuelve una URL a un archivo bajo la raíz configurada y lo transfiere
//! en bloques de tamaño fijo.
//!
//! ## Resolución
//!
//! Se prueba la URL tal cual y luego cada nombre de [`DEFAULT_FILES`]; el
//! primero que se puede abrir como archivo regular gana.
//!
//! ## GET condicional
//!
//! Con `use_file_time` activo (y sin handler MIME), un archivo cuya fecha de
//! modificación es <= `If-Modified-Since` se responde con 304 sin body.

use crate::http::{Exchange, Method, MimeRegistry, Response, StatusCode};
use std::fs::{File, Metadata};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Archivos por defecto, en orden de preferencia
pub const DEFAULT_FILES: &[&str] = &[
    "index.html",
    "index.htm",
    "default.html",
    "default.htm",
    "index.shtml",
    "index.xhtml",
    "index.asp",
    "default.asp",
];

/// Tamaño de bloque por defecto para la transferencia
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Fecha usada cuando el sistema de archivos no da la de modificación
///
/// Se toma de `SOURCE_DATE_EPOCH` al compilar; si no está, 2024-01-01.
fn fallback_mtime() -> SystemTime {
    let secs = option_env!("SOURCE_DATE_EPOCH")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_704_067_200);
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Las fechas HTTP tienen resolución de un segundo
fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Un archivo ya abierto
#[derive(Debug)]
pub struct ResolvedFile {
    /// Nombre relativo a la raíz (ej: "docs/index.html")
    pub name: String,
    pub file: File,
    pub metadata: Metadata,
}

/// Responder de archivos estáticos
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    chunk_size: usize,
    use_file_time: bool,
    mime: MimeRegistry,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, mime: MimeRegistry) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_file_time: false,
            mime,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_file_time(mut self, use_file_time: bool) -> Self {
        self.use_file_time = use_file_time;
        self
    }

    pub fn with_mime(mut self, mime: MimeRegistry) -> Self {
        self.mime = mime;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mime(&self) -> &MimeRegistry {
        &self.mime
    }

    /// Busca el primer candidato que se puede abrir como archivo
    ///
    /// Un directorio abre bien en algunos sistemas, por eso se revisa la
    /// metadata.
    pub fn resolve(&self, url: &str) -> Option<ResolvedFile> {
        let candidates = std::iter::once(url.to_string()).chain(DEFAULT_FILES.iter().map(|name| {
            if url.is_empty() || url.ends_with('/') {
                format!("{}{}", url, name)
            } else {
                format!("{}/{}", url, name)
            }
        }));

        for name in candidates {
            let path = self.root.join(&name);
            let Ok(file) = File::open(&path) else {
                continue;
            };
            match file.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    return Some(ResolvedFile { name, file, metadata });
                }
                _ => continue,
            }
        }
        None
    }

    /// Responde el request con el archivo que corresponde a su URL
    pub fn serve(&self, exchange: &mut Exchange<'_>) -> io::Result<()> {
        let url = exchange.request().url().to_string();
        let Some(resolved) = self.resolve(&url) else {
            debug!(url = %url, "archivo no encontrado");
            return exchange.send_error(StatusCode::NotFound);
        };

        let entry = self.mime.lookup(&resolved.name);
        let handler = entry.handler;
        let length = resolved.metadata.len();
        let mut head = Response::new(StatusCode::Ok).with_content_type(&entry.content_type);

        if handler.is_none() && self.use_file_time {
            let mtime = resolved
                .metadata
                .modified()
                .map(truncate_to_seconds)
                .unwrap_or_else(|_| fallback_mtime());

            if let Some(since) = exchange.request().if_modified_since() {
                if mtime <= since {
                    // El archivo se cierra al salir
                    return exchange.send(&Response::new(StatusCode::NotModified));
                }
            }
            head.add_header("Last-Modified", &httpdate::fmt_http_date(mtime));
        }

        if let Some(handler) = handler {
            exchange.send_head(&head)?;
            return handler(exchange, resolved.file, length, &self.root);
        }

        exchange.send_head(&head.with_content_length(length))?;
        if exchange.request().method() == Method::HEAD {
            return Ok(());
        }
        self.transfer(exchange, resolved.file, length);
        Ok(())
    }

    /// Copia `length` bytes del archivo al stream en bloques
    ///
    /// Cualquier fallo a mitad de camino deja el framing roto: se aborta en
    /// silencio y se marca la conexión para cerrar.
    fn transfer(&self, exchange: &mut Exchange<'_>, mut file: File, length: u64) {
        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(self.chunk_size).is_err() {
            debug!("sin memoria para el buffer de transferencia");
            exchange.request_mut().force_close();
            return;
        }
        buffer.resize(self.chunk_size, 0);

        let mut remaining = length;
        while remaining > 0 {
            let want = remaining.min(self.chunk_size as u64) as usize;
            let n = match file.read(&mut buffer[..want]) {
                Ok(0) | Err(_) => {
                    debug!(remaining, "archivo más corto de lo anunciado");
                    exchange.request_mut().force_close();
                    return;
                }
                Ok(n) => n,
            };
            if let Err(e) = exchange.write_all(&buffer[..n]) {
                debug!(error = %e, "transferencia abortada");
                exchange.request_mut().force_close();
                return;
            }
            remaining -= n as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HeaderOptions, Request};
    use std::fs;

    /// Directorio temporal con algunos archivos
    struct TestRoot(PathBuf);

    impl TestRoot {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "mini_httpd_files_{}_{}",
                tag,
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn file(&self, name: &str, content: &str) -> &Self {
            let path = self.0.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }
    }

    impl Drop for TestRoot {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn serve(files: &StaticFiles, raw: &str) -> (String, Request) {
        let mut request = Request::parse(raw.as_bytes()).unwrap();
        let options = HeaderOptions::new("test");
        let mut out = Vec::new();
        files
            .serve(&mut Exchange::new(&mut out, &mut request, &options))
            .unwrap();
        (String::from_utf8(out).unwrap(), request)
    }

    #[test]
    fn test_literal_file() {
        let root = TestRoot::new("literal");
        root.file("hello.txt", "hello world");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        let (text, request) = serve(&files, "GET /hello.txt HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 11\r\n"));
        assert!(text.ends_with("\r\n\r\nhello world"));
        assert!(request.keep_alive());
    }

    #[test]
    fn test_default_file_for_root() {
        let root = TestRoot::new("default");
        root.file("index.html", "<h1>home</h1>");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        let resolved = files.resolve("").unwrap();
        assert_eq!(resolved.name, "index.html");

        let (text, _) = serve(&files, "GET / HTTP/1.1\r\n\r\n");
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.ends_with("<h1>home</h1>"));
    }

    #[test]
    fn test_default_file_order() {
        let root = TestRoot::new("order");
        root.file("index.htm", "htm").file("index.html", "html");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        assert_eq!(files.resolve("").unwrap().name, "index.html");
    }

    #[test]
    fn test_default_file_in_subdirectory() {
        let root = TestRoot::new("subdir");
        root.file("docs/default.htm", "docs");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        assert_eq!(files.resolve("docs").unwrap().name, "docs/default.htm");
        assert_eq!(files.resolve("docs/").unwrap().name, "docs/default.htm");
    }

    #[test]
    fn test_not_found() {
        let root = TestRoot::new("missing");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        let (text, request) = serve(&files, "GET /x HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(!request.keep_alive());
    }

    #[test]
    fn test_head_sends_no_body() {
        let root = TestRoot::new("head");
        root.file("a.css", "body{}");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        let (text, _) = serve(&files, "HEAD /a.css HTTP/1.1\r\n\r\n");
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_chunked_transfer_of_large_file() {
        let root = TestRoot::new("large");
        let content = "0123456789".repeat(205);
        root.file("big.txt", &content);
        let files = StaticFiles::new(&root.0, MimeRegistry::standard()).with_chunk_size(7);

        let (text, _) = serve(&files, "GET /big.txt HTTP/1.1\r\n\r\n");
        assert!(text.contains("Content-Length: 2050\r\n"));
        assert!(text.ends_with(&content));
    }

    #[test]
    fn test_conditional_get_not_modified() {
        let root = TestRoot::new("ims");
        root.file("a.txt", "abc");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard()).with_file_time(true);

        // Fecha futura: el archivo no cambió desde entonces
        let raw = "GET /a.txt HTTP/1.1\r\nIf-Modified-Since: Fri, 01 Jan 2100 00:00:00 GMT\r\n\r\n";
        let (text, request) = serve(&files, raw);
        assert!(text.starts_with("HTTP/1.1 304 Not Modified\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(request.keep_alive());
    }

    #[test]
    fn test_conditional_get_equal_time_is_not_modified() {
        let root = TestRoot::new("ims_equal");
        root.file("a.txt", "abc");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard()).with_file_time(true);

        let mtime = truncate_to_seconds(fs::metadata(root.0.join("a.txt")).unwrap().modified().unwrap());
        let raw = format!(
            "GET /a.txt HTTP/1.1\r\nIf-Modified-Since: {}\r\n\r\n",
            httpdate::fmt_http_date(mtime)
        );
        let (text, _) = serve(&files, &raw);
        assert!(text.starts_with("HTTP/1.1 304 Not Modified\r\n"));
    }

    #[test]
    fn test_conditional_get_modified() {
        let root = TestRoot::new("ims_old");
        root.file("a.txt", "abc");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard()).with_file_time(true);

        let raw = "GET /a.txt HTTP/1.1\r\nIf-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT\r\n\r\n";
        let (text, _) = serve(&files, raw);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Last-Modified: "));
        assert!(text.ends_with("abc"));
    }

    #[test]
    fn test_conditional_get_disabled() {
        let root = TestRoot::new("ims_off");
        root.file("a.txt", "abc");
        let files = StaticFiles::new(&root.0, MimeRegistry::standard());

        let raw = "GET /a.txt HTTP/1.1\r\nIf-Modified-Since: Fri, 01 Jan 2100 00:00:00 GMT\r\n\r\n";
        let (text, _) = serve(&files, raw);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!text.contains("Last-Modified"));
    }

    fn upper_handler(exchange: &mut Exchange<'_>, mut file: File, length: u64, _root: &Path) -> io::Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        assert_eq!(content.len() as u64, length);
        exchange.write_all(content.to_uppercase().as_bytes())
    }

    #[test]
    fn test_mime_handler_streams_without_length() {
        let root = TestRoot::new("handler");
        root.file("page.shtml", "shout");
        let mime = MimeRegistry::standard().with_handler(".shtml", upper_handler);
        let files = StaticFiles::new(&root.0, mime).with_file_time(true);

        let (text, _) = serve(&files, "GET /page.shtml HTTP/1.1\r\n\r\n");
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(!text.contains("Last-Modified"));
        assert!(text.ends_with("\r\n\r\nSHOUT"));
    }
}
