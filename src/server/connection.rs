//! # Ciclo de una Conexión
//! src/server/connection.rs
//!
//! Lee requests de un stream, los despacha y decide si la conexión sigue
//! abierta.
//!
//! ```text
//! EsperarRequest → Parsear → Despachar → { EsperarRequest (keep-alive) | Cerrada }
//! ```
//!
//! - Un error de parsing responde 400/500/501 y cierra.
//! - Fin de datos o timeout de lectura cierra sin responder.
//! - El request número `keep_alive_requests` se responde con `Connection: close`.

use crate::config::{Config, MAX_BUFFER};
use crate::http::{HeaderBlock, Method, ParseError, Request};
use crate::router::Router;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use tracing::{debug, warn};

/// Buffer de lectura del socket; `read_line` junta la línea sobre varios `fill_buf`
const READ_BUFFER: usize = 256;

/// Límites de una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Requests máximos por conexión
    pub keep_alive_requests: usize,

    /// Largo máximo de una línea (request line o header)
    pub max_line: usize,

    /// Body máximo de un POST
    pub max_body: u64,

    /// Tamaño del buffer de salida
    pub output_buffer: usize,
}

impl ConnectionLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keep_alive_requests: config.keep_alive_requests,
            max_line: config.max_line,
            max_body: config.max_body,
            output_buffer: config.chunk_size,
        }
    }
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            keep_alive_requests: 5,
            max_line: 256,
            max_body: 4096,
            output_buffer: 512,
        }
    }
}

/// Resultado de intentar leer el siguiente request
#[derive(Debug)]
pub enum NextRequest {
    /// Request completo, listo para despachar
    Request(Request),

    /// El peer cerró o venció el timeout: no hay nada que responder
    End,

    /// Request inválido: se responde el error y se cierra
    Failure(ParseError),
}

/// Una conexión HTTP sobre cualquier stream bidireccional
pub struct Connection<S: Read + Write> {
    reader: BufReader<S>,
    limits: ConnectionLimits,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, limits: ConnectionLimits) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER, stream),
            limits,
        }
    }

    /// Devuelve el stream (para cerrarlo o inspeccionarlo)
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    /// Atiende requests hasta que la conexión deba cerrarse
    ///
    /// Retorna cuántos requests se despacharon. Un error de escritura termina
    /// el ciclo y se propaga.
    pub fn serve(&mut self, router: &Router) -> io::Result<usize> {
        let mut served = 0;

        loop {
            match self.next_request(served + 1) {
                NextRequest::End => break,
                NextRequest::Failure(err) => {
                    let status = err.status();
                    if status.is_server_error() {
                        warn!(error = %err, status = status.as_u16(), "request rechazado");
                    } else if status.is_client_error() {
                        debug!(error = %err, status = status.as_u16(), "request inválido");
                    }
                    let out = self.reader.get_mut();
                    router.reject(&mut *out, status)?;
                    out.flush()?;
                    break;
                }
                NextRequest::Request(mut request) => {
                    served += 1;
                    let capacity = self.limits.output_buffer.min(MAX_BUFFER);
                    let mut out = BufWriter::with_capacity(capacity, self.reader.get_mut());
                    router.dispatch(&mut out, &mut request)?;
                    out.flush()?;

                    if !request.keep_alive() {
                        break;
                    }
                }
            }
        }

        Ok(served)
    }

    /// Lee y parsea el siguiente request
    ///
    /// `sequence` es el número de este request en la conexión (desde 1); al
    /// llegar al límite el request queda marcado para cerrar.
    pub fn next_request(&mut self, sequence: usize) -> NextRequest {
        let request_line = loop {
            match self.read_line() {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => break line,
                Ok(None) => return NextRequest::End,
                Err(e) => return Self::read_failure(e),
            }
        };

        let mut block = HeaderBlock::new();
        loop {
            match self.read_line() {
                Ok(Some(line)) if line.is_empty() => break,
                Ok(Some(line)) => block.apply_line(&line),
                // Sin línea vacía final: se procesa lo que llegó
                Ok(None) => break,
                Err(e) => return Self::read_failure(e),
            }
        }

        let mut request = match Request::from_parts(&request_line, block) {
            Ok(request) => request,
            Err(err) => return NextRequest::Failure(err),
        };

        // El request número `keep_alive_requests` ya sale con `Connection: close`
        if sequence >= self.limits.keep_alive_requests {
            request.force_close();
        }

        if request.method() == Method::POST && request.content_length() > 0 {
            match self.read_body(request.content_length()) {
                Ok(body) => request.attach_body(body),
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                    return NextRequest::Failure(ParseError::BodyTooLarge(request.content_length()));
                }
                Err(e) => return Self::read_failure(e),
            }
        }

        NextRequest::Request(request)
    }

    fn read_failure(err: io::Error) -> NextRequest {
        if err.kind() == io::ErrorKind::OutOfMemory {
            return NextRequest::Failure(ParseError::Internal);
        }
        debug!(error = %err, "lectura terminada");
        NextRequest::End
    }

    /// Lee una línea sin CR/LF, truncada a `max_line` bytes
    ///
    /// El resto de una línea larga se descarta. `None` = fin de datos.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let max_line = self.limits.max_line;
        let mut line = Vec::new();
        line.try_reserve_exact(max_line)
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        let mut received = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                if !received {
                    return Ok(None);
                }
                break;
            }
            received = true;

            let room = max_line - line.len();
            match memchr::memchr(b'\n', available) {
                Some(pos) => {
                    line.extend_from_slice(&available[..pos.min(room)]);
                    self.reader.consume(pos + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    line.extend_from_slice(&available[..len.min(room)]);
                    self.reader.consume(len);
                }
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Lee exactamente `length` bytes de body
    fn read_body(&mut self, length: u64) -> io::Result<Vec<u8>> {
        if length > self.limits.max_body {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        let length = length as usize;
        let mut body = Vec::new();
        body.try_reserve_exact(length)
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        body.resize(length, 0);
        self.reader.read_exact(&mut body)?;
        Ok(body)
    }
}
