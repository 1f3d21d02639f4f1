//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado que el servidor puede emitir.
//! El motor solo conoce un subconjunto pequeño:
//!
//! - **2xx**: Éxito (200 OK)
//! - **3xx**: 304 Not Modified (GET condicional, no es un error)
//! - **4xx**: Error del cliente (400, 401, 404)
//! - **5xx**: Error del servidor (500, 501)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 304 Not Modified - El cliente ya tiene la versión actual
    NotModified = 304,

    /// 400 Bad Request - Request line o path malformados
    BadRequest = 400,

    /// 401 Unauthorized - Falta la credencial o no coincide
    Unauthorized = 401,

    /// 404 Not Found - Ningún archivo ni handler resuelve la URL
    NotFound = 404,

    /// 500 Internal Server Error - Sin memoria u otro fallo interno
    InternalServerError = 500,

    /// 501 Not Implemented - Método desconocido
    NotImplemented = 501,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use mini_httpd::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Verifica si el código es un error (>= 400)
    ///
    /// Todo error fuerza `Connection: close` en la respuesta.
    pub fn is_error(&self) -> bool {
        self.as_u16() >= 400
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        let code = self.as_u16();
        (400..500).contains(&code)
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        let code = self.as_u16();
        (500..600).contains(&code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
