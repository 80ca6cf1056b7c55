//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body to every GET. Options simulate the server
//! behaviors the downloader has to cope with: missing or wrong Content-Length,
//! error statuses, connections dropped mid-body, and stalled transfers.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Status code to answer with; non-2xx responses carry a short text body.
    pub status: u16,
    /// If false, omit Content-Length and end the body by closing the connection.
    pub send_content_length: bool,
    /// Declare the full length but close the connection after this many body bytes.
    pub drop_after: Option<usize>,
    /// Send this many body bytes, then hold the connection open without sending more.
    pub stall_after: Option<usize>,
    /// Send the body with chunked framing but also declare this Content-Length.
    /// libcurl follows the framing, so the declared length can be wrong.
    pub chunked_with_length: Option<u64>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            send_content_length: true,
            drop_after: None,
            stall_after: None,
            chunked_with_length: None,
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the URL of
/// the served file (e.g. "http://127.0.0.1:12345/media/file.bin").
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/media/file.bin", port)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let method = request.split_whitespace().next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    if !(200..300).contains(&opts.status) {
        let text = b"error page";
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            opts.status,
            reason(opts.status),
            text.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(text);
        return;
    }

    if let Some(declared) = opts.chunked_with_length {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nTransfer-Encoding: chunked\r\n\
             Connection: close\r\n\r\n",
            declared
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(format!("{:x}\r\n", body.len()).as_bytes());
        let _ = stream.write_all(body);
        let _ = stream.write_all(b"\r\n0\r\n\r\n");
        let _ = stream.flush();
        return;
    }

    let length_header = if opts.send_content_length {
        format!("Content-Length: {}\r\n", body.len())
    } else {
        String::new()
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\n{}Connection: close\r\n\r\n",
        opts.status,
        reason(opts.status),
        length_header
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }

    if let Some(n) = opts.drop_after {
        let _ = stream.write_all(&body[..n.min(body.len())]);
        let _ = stream.flush();
        let _ = stream.shutdown(std::net::Shutdown::Both);
        return;
    }
    if let Some(n) = opts.stall_after {
        let _ = stream.write_all(&body[..n.min(body.len())]);
        let _ = stream.flush();
        thread::sleep(Duration::from_secs(30));
        return;
    }
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
