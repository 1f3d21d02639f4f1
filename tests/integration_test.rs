//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Levantan un servidor real sobre loopback (puerto efímero) con una raíz
//! temporal y le hablan con `TcpStream`.

use base64ct::{Base64, Encoding};
use mini_httpd::commands;
use mini_httpd::config::Config;
use mini_httpd::http::HeaderOptions;
use mini_httpd::router::{AuthTable, Router};
use mini_httpd::server::Server;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Raíz de archivos compartida por todos los tests
fn test_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("mini_httpd_it_{}", std::process::id()));
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("private")).unwrap();
    fs::write(root.join("index.html"), "<h1>Welcome</h1>").unwrap();
    fs::write(root.join("index.htm"), "old welcome").unwrap();
    fs::write(root.join("docs/default.htm"), "docs home").unwrap();
    fs::write(root.join("docs/notes.txt"), "some notes").unwrap();
    fs::write(root.join("private/secret.txt"), "top secret").unwrap();
    fs::write(root.join("big.jar"), vec![b'x'; 5000]).unwrap();
    root
}

/// Servidor compartido: se arranca una sola vez
fn server_addr() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let mut config = Config::default();
        config.port = 0;
        config.read_timeout_ms = 2_000;
        config.use_file_time = true;

        let router = Router::new(test_root())
            .with_options(HeaderOptions::new("mini_httpd").with_date(true))
            .with_auth(AuthTable::new().protect("private", "admin:secret"))
            .with_file_time(true);
        let router = commands::register_samples(router);

        // Los workers mantienen vivo el pool
        let pool = Server::new(config, router).start().expect("server start");
        pool.local_addr().unwrap()
    })
}

fn connect() -> TcpStream {
    let stream = TcpStream::connect(server_addr()).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.set_write_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

/// Helper: envía un request crudo y lee hasta que el servidor cierra
fn send_raw(raw: &str) -> String {
    let mut stream = connect();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Helper: GET con HTTP/1.0 (una respuesta y cierre)
fn get(path: &str) -> String {
    send_raw(&format!("GET {} HTTP/1.0\r\n\r\n", path))
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

#[test]
fn test_index_preferred_over_htm() {
    let response = get("/");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.contains("Content-Length: 16\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert_eq!(extract_body(&response), "<h1>Welcome</h1>");
}

#[test]
fn test_default_file_in_directory() {
    let response = get("/docs/");
    assert!(response.contains("200 OK"));
    assert_eq!(extract_body(&response), "docs home");
}

#[test]
fn test_server_and_date_headers() {
    let response = get("/docs/notes.txt");
    assert!(response.contains(&format!("Server: mini_httpd {}\r\n", env!("CARGO_PKG_VERSION"))));
    assert!(response.contains("\r\nDate: "));
    assert!(response.contains("\r\nLast-Modified: "));
    assert!(response.contains("Content-Type: text/plain\r\n"));
}

#[test]
fn test_large_file_in_chunks() {
    let response = get("/big.jar");
    assert!(response.contains("Content-Type: application/x-java-archive\r\n"));
    assert!(response.contains("Content-Length: 5000\r\n"));
    assert_eq!(extract_body(&response).len(), 5000);
}

#[test]
fn test_not_found() {
    let response = send_raw("GET /missing.html HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert!(extract_body(&response).contains("<TITLE>404 Not Found</TITLE>"));
}

#[test]
fn test_unsupported_method() {
    let response = send_raw("PUT / HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
    assert!(response.contains("Connection: close\r\n"));
}

#[test]
fn test_path_outside_root() {
    let response = get("/../etc/passwd");
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn test_conditional_get() {
    let response = send_raw(
        "GET /docs/notes.txt HTTP/1.1\r\n\
         If-Modified-Since: Fri, 01 Jan 2100 00:00:00 GMT\r\n\
         Connection: close\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 304 Not Modified\r\n"));
    assert!(!response.contains("Content-Length"));
    assert_eq!(extract_body(&response), "");
}

#[test]
fn test_keep_alive_budget() {
    let mut stream = connect();
    stream
        .write_all("GET /docs/notes.txt HTTP/1.1\r\n\r\n".repeat(6).as_bytes())
        .unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    let text = String::from_utf8_lossy(&response);

    assert_eq!(text.matches("HTTP/1.1 200 OK\r\n").count(), 5);
    assert_eq!(text.matches("Connection: Keep-Alive\r\n").count(), 4);
    assert_eq!(text.matches("Connection: close\r\n").count(), 1);
    assert!(text.ends_with("some notes"));
}

#[test]
fn test_auth_challenge_and_success() {
    let response = get("/private/secret.txt");
    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(response.contains("WWW-Authenticate: Basic realm=\"private\"\r\n"));

    let response = send_raw(&format!(
        "GET /private/secret.txt HTTP/1.0\r\nAuthorization: Basic {}\r\n\r\n",
        Base64::encode_string(b"admin:secret")
    ));
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(extract_body(&response), "top secret");
}

#[test]
fn test_cgi_request_info() {
    let response = send_raw("GET /cgi-bin/test.cgi?a=1 HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert!(response.contains("200 OK"));
    let body = extract_body(&response);
    assert!(body.contains("Argument: a=1<BR>"));
    assert!(body.contains("Host: localhost<BR>"));
}

#[test]
fn test_cgi_post_form() {
    let form = "name=ana&city=san+jose";
    let response = send_raw(&format!(
        "POST /cgi-bin/form.cgi HTTP/1.0\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\n\r\n{}",
        form.len(),
        form
    ));
    assert!(response.contains("200 OK"));
    assert!(extract_body(&response).contains("name: ana<br>\r\ncity: san jose<br>"));
}

#[test]
fn test_unknown_cgi() {
    let response = get("/cgi-bin/nothing.cgi");
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[test]
fn test_head_request() {
    let response = send_raw("HEAD / HTTP/1.0\r\n\r\n");
    assert!(response.contains("Content-Length: 16\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

#[test]
fn test_concurrent_clients() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| get("/docs/notes.txt")))
        .collect();
    for handle in handles {
        let response = handle.join().unwrap();
        assert_eq!(extract_body(&response), "some notes");
    }
}
