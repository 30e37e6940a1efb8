use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub type Route = Arc<dyn Fn(&str) -> u16 + Send + Sync>;

/// Keep-alive HTTP/1.1 server answering every request with the status picked
/// by `route`, after a fixed delay.
pub struct MockServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    accept_loop: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(route: Route, delay: Duration) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let accept_loop = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                tokio::spawn(serve(stream, route.clone(), delay, counter.clone()));
            }
        });

        MockServer {
            base_url: format!("http://{addr}"),
            hits,
            accept_loop,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

fn head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn serve(mut stream: TcpStream, route: Route, delay: Duration, hits: Arc<AtomicUsize>) {
    let mut buf: Vec<u8> = Vec::with_capacity(2048);
    let mut chunk = [0u8; 1024];
    loop {
        let end = loop {
            if let Some(end) = head_end(&buf) {
                break end;
            }
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_string();
        buf.drain(..end + 4);

        let target = head.split_whitespace().nth(1).unwrap_or("/");
        let path = target.split('?').next().unwrap_or("/");
        let status = route(path);
        hits.fetch_add(1, Ordering::SeqCst);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let response = format!(
            "HTTP/1.1 {status} {}\r\nContent-Length: 2\r\nConnection: keep-alive\r\n\r\nok",
            reason(status)
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}
