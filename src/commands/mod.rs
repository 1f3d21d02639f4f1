//! # CGIs de Ejemplo
//!
//! CGIs que el binario registra por defecto bajo `cgi-bin/`:
//!
//! - **test.cgi**: muestra el request tal como lo vio el servidor
//! - **form.cgi**: lista los parámetros de un formulario (GET o POST)
//!
//! Cada comando es un [`CgiHandler`](crate::router::CgiHandler) que arma su
//! página en memoria y la envía con `Content-Length`, así la conexión puede
//! seguir abierta.

pub mod basic;

// Re-exportar funciones útiles
pub use basic::*;

use crate::router::Router;

/// Registra los CGIs de ejemplo en el router
pub fn register_samples(router: Router) -> Router {
    router
        .register("test.cgi", request_info_handler)
        .register("form.cgi", form_handler)
}
