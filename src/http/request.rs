//! # Parsing de Requests HTTP/1.0 y HTTP/1.1
//! src/http/request.rs
//!
//! ## Formato de un Request
//!
//! ```text
//! GET /path?param1=value1&param2=value2 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query PROTOCOL`
//! 2. **Headers**: Pares `Name: Value` (uno por línea). Solo se capturan
//!    los que el servidor usa; el resto se ignora.
//! 3. **Empty Line**: separa headers del body
//! 4. **Body**: solo para POST con `Content-Length` (lo lee la conexión)

use super::query::{decode_path, QueryParams};
use super::StatusCode;
use std::collections::HashMap;
use std::time::SystemTime;

/// Versión HTTP propia del servidor (mayor * 10 + menor)
pub const LOCAL_HTTP_VERSION: u8 = 11;

/// Content-Type de los formularios que se decodifican como query string
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Enviar datos a un recurso
    POST,

    /// Cualquier otro método (responde 501)
    UNKNOWN,
}

impl Method {
    /// Parsea un método HTTP (sin distinguir mayúsculas)
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("GET") {
            Method::GET
        } else if s.eq_ignore_ascii_case("HEAD") {
            Method::HEAD
        } else if s.eq_ignore_ascii_case("POST") {
            Method::POST
        } else {
            Method::UNKNOWN
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::UNKNOWN => "UNKNOWN",
        }
    }
}

/// Qué hacer con la conexión después de responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    Close,
    KeepAlive,
}

impl ConnectionMode {
    /// Valor del header `Connection:` de la respuesta
    pub fn as_header_value(&self) -> &'static str {
        match self {
            ConnectionMode::Close => "close",
            ConnectionMode::KeepAlive => "Keep-Alive",
        }
    }
}

/// Headers que el servidor guarda del request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    ContentType,
    Cookie,
    Authorization,
    UserAgent,
    Referer,
    Host,
}

impl HeaderField {
    const ALL: [HeaderField; 6] = [
        HeaderField::ContentType,
        HeaderField::Cookie,
        HeaderField::Authorization,
        HeaderField::UserAgent,
        HeaderField::Referer,
        HeaderField::Host,
    ];

    /// Nombre canónico del header
    pub fn name(&self) -> &'static str {
        match self {
            HeaderField::ContentType => "Content-Type",
            HeaderField::Cookie => "Cookie",
            HeaderField::Authorization => "Authorization",
            HeaderField::UserAgent => "User-Agent",
            HeaderField::Referer => "Referer",
            HeaderField::Host => "Host",
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }
}

/// Headers capturados: la primera ocurrencia gana
#[derive(Debug, Clone, Default)]
pub struct Headers {
    captured: HashMap<HeaderField, String>,
}

impl Headers {
    /// Guarda `value` solo si el header no se había visto antes
    ///
    /// Retorna `true` si el valor fue guardado.
    pub fn insert_if_absent(&mut self, field: HeaderField, value: &str) -> bool {
        if self.captured.contains_key(&field) {
            return false;
        }
        self.captured.insert(field, value.to_string());
        true
    }

    pub fn get(&self, field: HeaderField) -> Option<&str> {
        self.captured.get(&field).map(|s| s.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Método HTTP no soportado
    UnsupportedMethod(String),

    /// Falta el path en la request line
    MissingPath,

    /// Falta el protocolo en la request line
    MissingProtocol,

    /// Protocolo que no es `HTTP/x.y`
    InvalidProtocol(String),

    /// Path que sale de la raíz o no se puede decodificar
    InvalidPath(String),

    /// Body más grande de lo que el servidor acepta
    BodyTooLarge(u64),

    /// Sin memoria para los buffers del request
    Internal,
}

impl ParseError {
    /// Código de estado con el que se responde este error
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedMethod(_) => StatusCode::NotImplemented,
            ParseError::Internal => StatusCode::InternalServerError,
            _ => StatusCode::BadRequest,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::MissingPath => write!(f, "Missing request path"),
            ParseError::MissingProtocol => write!(f, "Missing protocol"),
            ParseError::InvalidProtocol(p) => write!(f, "Invalid protocol: {}", p),
            ParseError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            ParseError::BodyTooLarge(n) => write!(f, "Request body too large: {} bytes", n),
            ParseError::Internal => write!(f, "Out of memory while parsing request"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Representa un request parseado
///
/// Cada conexión es dueña exclusiva de su request; se descarta antes de
/// leer el siguiente.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path decodificado, relativo a la raíz (ej: "docs/index.html")
    url: String,

    /// Query string cruda (sin el '?')
    query: Option<String>,

    /// Parámetros decodificados de la query string
    params: QueryParams,

    /// Headers capturados
    headers: Headers,

    /// Valor de Content-Length (0 si no vino)
    content_length: u64,

    /// Valor de If-Modified-Since
    if_modified_since: Option<SystemTime>,

    /// Versión HTTP del cliente (11 = HTTP/1.1)
    version: u8,

    /// Qué hacer con la conexión al terminar
    connection: ConnectionMode,

    /// Body del request (solo POST)
    body: Vec<u8>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: String::new(),
            query: None,
            params: QueryParams::default(),
            headers: Headers::default(),
            content_length: 0,
            if_modified_since: None,
            version: LOCAL_HTTP_VERSION,
            connection: ConnectionMode::KeepAlive,
            body: Vec::new(),
        }
    }
}

/// Estado acumulado mientras se leen las líneas de headers
#[derive(Debug, Default)]
pub struct HeaderBlock {
    headers: Headers,
    content_length: u64,
    if_modified_since: Option<SystemTime>,
    connection: Option<ConnectionMode>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Procesa una línea de header (sin CR/LF)
    ///
    /// Headers desconocidos o sin ':' se ignoran.
    pub fn apply_line(&mut self, line: &str) {
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();

        if let Some(field) = HeaderField::lookup(name) {
            self.headers.insert_if_absent(field, value);
        } else if name.eq_ignore_ascii_case("Content-Length") {
            self.content_length = parse_leading_digits(value);
        } else if name.eq_ignore_ascii_case("If-Modified-Since") {
            // Algunos clientes agregan "; length=NNN"
            let date = value.split(';').next().unwrap_or("").trim();
            self.if_modified_since = httpdate::parse_http_date(date).ok();
        } else if name.eq_ignore_ascii_case("Connection") {
            if starts_with_ignore_case(value, "close") {
                self.connection = Some(ConnectionMode::Close);
            } else if starts_with_ignore_case(value, "keep-alive") {
                self.connection = Some(ConnectionMode::KeepAlive);
            }
        }
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Como `atol`: dígitos iniciales, 0 si no hay
fn parse_leading_digits(value: &str) -> u64 {
    value
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')))
}

/// Parsea `HTTP/x.y` a `x * 10 + y`
fn parse_protocol(protocol: &str) -> Option<u8> {
    let version = protocol
        .get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("HTTP/"))
        .map(|_| &protocol[5..])?;
    let (major, minor) = version.split_once('.')?;
    let major: u8 = major.parse().ok()?;
    let minor: u8 = minor.parse().ok()?;
    if major > 9 || minor > 9 {
        return None;
    }
    Some(major * 10 + minor)
}

impl Request {
    /// Parsea un request completo (request line + headers) desde bytes
    ///
    /// Las líneas pueden terminar en `\r\n` o `\n`. El parsing se detiene en
    /// la primera línea vacía.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use mini_httpd::http::Request;
    ///
    /// let raw = b"GET /cgi-bin/form.cgi?num=10 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.url(), "cgi-bin/form.cgi");
    /// assert_eq!(request.query_param("num"), Some("10"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(buffer);
        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));

        let request_line = lines.next().unwrap_or("");
        let mut block = HeaderBlock::new();
        for line in lines.take_while(|line| !line.is_empty()) {
            block.apply_line(line);
        }

        Self::from_parts(request_line, block)
    }

    /// Construye el request a partir de la request line y los headers ya leídos
    pub fn from_parts(request_line: &str, block: HeaderBlock) -> Result<Self, ParseError> {
        let mut words = request_line.split_ascii_whitespace();
        let method_word = words.next().unwrap_or("");
        let path = words.next().unwrap_or("");
        let protocol = words.next().unwrap_or("");

        // El método se valida antes que el resto de la línea
        let method = Method::parse(method_word);
        if method == Method::UNKNOWN {
            return Err(ParseError::UnsupportedMethod(method_word.to_string()));
        }
        if path.is_empty() {
            return Err(ParseError::MissingPath);
        }
        if protocol.is_empty() {
            return Err(ParseError::MissingProtocol);
        }
        let version = parse_protocol(protocol)
            .ok_or_else(|| ParseError::InvalidProtocol(protocol.to_string()))?;

        // HTTP/1.0 cierra salvo que pidan keep-alive; 1.1 al revés
        let connection = match (version <= 10, block.connection) {
            (true, Some(ConnectionMode::KeepAlive)) => ConnectionMode::KeepAlive,
            (true, _) => ConnectionMode::Close,
            (false, Some(ConnectionMode::Close)) => ConnectionMode::Close,
            (false, _) => ConnectionMode::KeepAlive,
        };

        let (raw_path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (path, None),
        };
        let params = query.as_deref().map(QueryParams::parse).unwrap_or_default();
        let url = decode_path(raw_path).ok_or_else(|| ParseError::InvalidPath(raw_path.to_string()))?;

        Ok(Request {
            method,
            url,
            query,
            params,
            headers: block.headers,
            content_length: block.content_length,
            if_modified_since: block.if_modified_since,
            version,
            connection,
            body: Vec::new(),
        })
    }

    /// Adjunta el body leído por la conexión
    ///
    /// Un formulario `application/x-www-form-urlencoded` sin query en la URL
    /// se decodifica como si fuera la query string.
    pub fn attach_body(&mut self, body: Vec<u8>) {
        let is_form = self
            .content_type()
            .is_some_and(|ct| starts_with_ignore_case(ct, FORM_URLENCODED));

        if self.method == Method::POST && is_form && self.query.is_none() {
            let query = String::from_utf8_lossy(&body).into_owned();
            self.params = QueryParams::parse(&query);
            self.query = Some(query);
        }
        self.body = body;
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path decodificado (relativo a la raíz)
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Realm de autorización: el directorio padre de la URL (`.` si no hay)
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::Request;
    ///
    /// let request = Request::parse(b"GET /private/a.html HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(request.realm(), "private");
    ///
    /// let request = Request::parse(b"GET /a.html HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(request.realm(), ".");
    /// ```
    pub fn realm(&self) -> &str {
        match self.url.rfind('/') {
            Some(pos) => &self.url[..pos],
            None => ".",
        }
    }

    /// Obtiene la query string cruda
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Obtiene todos los parámetros de la query
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Obtiene un parámetro específico (primera ocurrencia)
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Obtiene un header capturado
    pub fn header(&self, field: HeaderField) -> Option<&str> {
        self.headers.get(field)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(HeaderField::ContentType)
    }

    pub fn cookie(&self) -> Option<&str> {
        self.header(HeaderField::Cookie)
    }

    pub fn authorization(&self) -> Option<&str> {
        self.header(HeaderField::Authorization)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(HeaderField::UserAgent)
    }

    pub fn referer(&self) -> Option<&str> {
        self.header(HeaderField::Referer)
    }

    pub fn host(&self) -> Option<&str> {
        self.header(HeaderField::Host)
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn if_modified_since(&self) -> Option<SystemTime> {
        self.if_modified_since
    }

    /// Versión HTTP del cliente (10 = HTTP/1.0, 11 = HTTP/1.1)
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn connection(&self) -> ConnectionMode {
        self.connection
    }

    pub fn keep_alive(&self) -> bool {
        self.connection == ConnectionMode::KeepAlive
    }

    /// Fuerza el cierre de la conexión después de esta respuesta
    pub fn force_close(&mut self) {
        self.connection = ConnectionMode::Close;
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
