//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./mini_httpd --port 8080 \
//!   --root ./html \
//!   --min-workers 4 \
//!   --max-workers 16 \
//!   --use-file-time
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTPD_PORT=8080 HTTPD_HOST=0.0.0.0 HTTPD_ROOT=/srv/www ./mini_httpd
//! ```

use clap::Parser;
use std::time::Duration;
use tracing::info;

/// Tope de los buffers por conexión (línea y bloque de transferencia)
pub const MAX_BUFFER: usize = 64 * 1024;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser)]
#[command(name = "mini_httpd")]
#[command(about = "Servidor HTTP/1.0 - HTTP/1.1 para equipos con poca memoria")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTPD_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTPD_HOST")]
    pub host: String,

    /// Directorio raíz de los archivos servidos
    #[arg(long, default_value = "./html", env = "HTTPD_ROOT")]
    pub root: String,

    // === Workers ===

    /// Workers que siempre esperan conexiones
    #[arg(long = "min-workers", default_value = "4", env = "HTTPD_MIN_WORKERS")]
    pub min_workers: usize,

    /// Tope de workers (atendiendo + esperando)
    #[arg(long = "max-workers", default_value = "16", env = "HTTPD_MAX_WORKERS")]
    pub max_workers: usize,

    // === Conexiones ===

    /// Requests máximos por conexión keep-alive
    #[arg(long = "keep-alive-requests", default_value = "5", env = "HTTPD_KEEP_ALIVE")]
    pub keep_alive_requests: usize,

    /// Largo máximo de la request line y de cada header
    #[arg(long = "max-line", default_value = "256", env = "HTTPD_MAX_LINE")]
    pub max_line: usize,

    /// Bloque de transferencia de archivos en bytes
    #[arg(long = "chunk-size", default_value = "512", env = "HTTPD_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Body máximo aceptado en un POST
    #[arg(long = "max-body", default_value = "4096", env = "HTTPD_MAX_BODY")]
    pub max_body: u64,

    /// Timeout de lectura en milisegundos (cierra conexiones ociosas)
    #[arg(long = "read-timeout", default_value = "500", env = "HTTPD_READ_TIMEOUT")]
    pub read_timeout_ms: u64,

    // === Socket ===

    /// Tamaño máximo de segmento TCP (solo Linux)
    #[arg(long = "segment-size", default_value = "1460", env = "HTTPD_SEGMENT_SIZE")]
    pub segment_size: u32,

    /// Buffers de envío y recepción del socket
    #[arg(long = "tcp-buffer", default_value = "8760", env = "HTTPD_TCP_BUFFER")]
    pub tcp_buffer: usize,

    // === Admisión por memoria ===

    /// Memoria libre mínima para atender una conexión, en bytes
    #[arg(long = "min-free-memory", default_value = "8192", env = "HTTPD_MIN_FREE_MEMORY")]
    pub min_free_memory: u64,

    /// Reintentos antes de abandonar una conexión por falta de memoria
    #[arg(long = "memory-retries", default_value = "10", env = "HTTPD_MEMORY_RETRIES")]
    pub memory_retries: u32,

    /// Espera entre reintentos de memoria en milisegundos
    #[arg(long = "memory-retry-delay", default_value = "10", env = "HTTPD_MEMORY_RETRY_DELAY")]
    pub memory_retry_delay_ms: u64,

    /// Espera después de un fallo al crear un worker o un socket
    #[arg(long = "retry-delay", default_value = "5000", env = "HTTPD_RETRY_DELAY")]
    pub retry_delay_ms: u64,

    // === Respuestas ===

    /// Nombre en el header `Server:` (se agrega la versión)
    #[arg(long = "server-name", default_value = "mini_httpd", env = "HTTPD_SERVER_NAME")]
    pub server_name: String,

    /// Enviar el header `Date:`
    #[arg(long = "send-date", env = "HTTPD_SEND_DATE")]
    pub send_date: bool,

    /// Usar la fecha de los archivos (`Last-Modified:` y GET condicional)
    #[arg(long = "use-file-time", env = "HTTPD_USE_FILE_TIME")]
    pub use_file_time: bool,

    /// Archivo JSON con los directorios protegidos
    #[arg(long = "auth-file", env = "HTTPD_AUTH_FILE")]
    pub auth_file: Option<String>,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    ///
    /// # Ejemplo
    /// ```no_run
    /// use mini_httpd::config::Config;
    ///
    /// let config = Config::new();
    /// println!("Server listening on {}", config.address());
    /// ```
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use mini_httpd::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn memory_retry_delay(&self) -> Duration {
        Duration::from_millis(self.memory_retry_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        // Validar workers
        if self.min_workers == 0 {
            return Err("Min workers must be >= 1".to_string());
        }
        if self.max_workers < self.min_workers {
            return Err("Max workers must be >= min workers".to_string());
        }

        // Validar conexiones
        if self.keep_alive_requests == 0 {
            return Err("Keep-alive requests must be >= 1".to_string());
        }
        if !(16..=MAX_BUFFER).contains(&self.max_line) {
            return Err(format!("Max line must be between 16 and {}", MAX_BUFFER));
        }
        if !(1..=MAX_BUFFER).contains(&self.chunk_size) {
            return Err(format!("Chunk size must be between 1 and {}", MAX_BUFFER));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(address = %self.address(), root = %self.root, "network");
        info!(
            min = self.min_workers,
            max = self.max_workers,
            keep_alive = self.keep_alive_requests,
            read_timeout_ms = self.read_timeout_ms,
            "workers"
        );
        info!(
            max_line = self.max_line,
            chunk_size = self.chunk_size,
            max_body = self.max_body,
            min_free_memory = self.min_free_memory,
            "limits"
        );
        info!(
            server = %self.server_name,
            send_date = self.send_date,
            use_file_time = self.use_file_time,
            auth_file = self.auth_file.as_deref().unwrap_or("-"),
            "responses"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            root: "./html".to_string(),
            min_workers: 4,
            max_workers: 16,
            keep_alive_requests: 5,
            max_line: 256,
            chunk_size: 512,
            max_body: 4096,
            read_timeout_ms: 500,
            segment_size: 1460,
            tcp_buffer: 8760,
            min_free_memory: 8192,
            memory_retries: 10,
            memory_retry_delay_ms: 10,
            retry_delay_ms: 5_000,
            server_name: "mini_httpd".to_string(),
            send_date: false,
            use_file_time: false,
            auth_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.root, "./html");
        assert_eq!(config.min_workers, 4);
        assert_eq!(config.max_workers, 16);
    }

    #[test]
    fn test_cli_defaults_match_default() {
        let parsed = Config::try_parse_from(["mini_httpd"]).unwrap();
        let default = Config::default();
        assert_eq!(parsed.keep_alive_requests, default.keep_alive_requests);
        assert_eq!(parsed.chunk_size, default.chunk_size);
        assert_eq!(parsed.tcp_buffer, default.tcp_buffer);
        assert_eq!(parsed.retry_delay_ms, default.retry_delay_ms);
        assert_eq!(parsed.auth_file, None);
    }

    #[test]
    fn test_cli_flags() {
        let config = Config::try_parse_from([
            "mini_httpd",
            "--port",
            "3000",
            "--root",
            "/srv/www",
            "--use-file-time",
            "--auth-file",
            "auth.json",
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.root, "/srv/www");
        assert!(config.use_file_time);
        assert!(!config.send_date);
        assert_eq!(config.auth_file.as_deref(), Some("auth.json"));
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.memory_retry_delay(), Duration::from_millis(10));
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    // ==================== Workers Validation ====================

    #[test]
    fn test_validate_invalid_min_workers() {
        let mut config = Config::default();
        config.min_workers = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Min workers"));
    }

    #[test]
    fn test_validate_max_below_min() {
        let mut config = Config::default();
        config.max_workers = 2;
        let result = config.validate();
        assert!(result.unwrap_err().contains("Max workers"));
    }

    #[test]
    fn test_validate_equal_min_max() {
        let mut config = Config::default();
        config.max_workers = config.min_workers;
        assert!(config.validate().is_ok());
    }

    // ==================== Connection Validation ====================

    #[test]
    fn test_validate_invalid_keep_alive() {
        let mut config = Config::default();
        config.keep_alive_requests = 0;
        assert!(config.validate().unwrap_err().contains("Keep-alive"));
    }

    #[test]
    fn test_validate_invalid_max_line() {
        let mut config = Config::default();
        config.max_line = 8;
        assert!(config.validate().unwrap_err().contains("Max line"));
    }

    #[test]
    fn test_validate_max_line_too_large() {
        let mut config = Config::default();
        config.max_line = MAX_BUFFER + 1;
        assert!(config.validate().unwrap_err().contains("Max line"));

        config.max_line = MAX_BUFFER;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().unwrap_err().contains("Chunk size"));

        config.chunk_size = usize::MAX;
        assert!(config.validate().unwrap_err().contains("Chunk size"));
    }

    #[test]
    fn test_config_log_summary() {
        let config = Config::default();
        // Sin subscriber no hace nada, pero no debe fallar
        config.log_summary();
    }
}
