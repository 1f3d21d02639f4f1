//! # Comandos Básicos
//! src/commands/basic.rs
//!
//! Implementación de los CGIs de ejemplo:
//! - cgi-bin/test.cgi: información del request
//! - cgi-bin/form.cgi: resultado de un formulario

use crate::http::{Exchange, Response, StatusCode};
use std::fmt::Write as _;
use std::io;

/// Escapa lo mínimo para poder mostrar texto del cliente dentro de HTML
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Envía una página HTML con título y contenido
fn send_page(exchange: &mut Exchange<'_>, title: &str, content: &str) -> io::Result<()> {
    let body = format!(
        "<HTML><HEAD><TITLE>{0}</TITLE></HEAD><BODY><H1>{0}</H1>\r\n{1}</BODY></HTML>",
        title, content
    );
    exchange.send(
        &Response::new(StatusCode::Ok)
            .with_content_type("text/html")
            .with_body(&body),
    )
}

/// Handler para cgi-bin/test.cgi
///
/// Muestra los campos del request: método, versión, URL, query y los
/// headers capturados.
pub fn request_info_handler(exchange: &mut Exchange<'_>) -> io::Result<()> {
    let request = exchange.request();
    let mut content = String::new();

    // Escribir en un String no falla
    let _ = write!(
        content,
        "Method: {}<BR>\r\nVersion: HTTP/{}.{}<BR>\r\nLength: {}<BR>\r\n",
        request.method().as_str(),
        request.version() / 10,
        request.version() % 10,
        request.content_length()
    );

    let fields = [
        ("URL", Some(request.url())),
        ("Argument", request.query()),
        ("Content", request.content_type()),
        ("Cookie", request.cookie()),
        ("Auth", request.authorization()),
        ("Agent", request.user_agent()),
        ("Referrer", request.referer()),
        ("Host", request.host()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = write!(content, "{}: {}<BR>\r\n", label, escape_html(value));
        }
    }
    if let Some(since) = request.if_modified_since() {
        let _ = write!(content, "If-Modified-Since: {}<BR>\r\n", httpdate::fmt_http_date(since));
    }
    let _ = write!(
        content,
        "Connection: {}<BR>\r\n",
        if request.keep_alive() { "Keep-Alive" } else { "Close" }
    );

    send_page(exchange, "Request Info", &content)
}

/// Handler para cgi-bin/form.cgi
///
/// Lista `nombre: valor` por cada parámetro, en el orden en que llegaron.
/// Con POST el formulario viene en el body.
pub fn form_handler(exchange: &mut Exchange<'_>) -> io::Result<()> {
    let mut content = String::new();
    for (name, value) in exchange.request().params().iter() {
        let _ = write!(
            content,
            "{}: {}<br>\r\n",
            escape_html(name),
            escape_html(value.unwrap_or(""))
        );
    }

    send_page(exchange, "Form Result", &content)
}
