// =============================================================================
// test_support.rs: A HARBOUR MADE OF CARDBOARD
// =============================================================================
//
// A throwaway HTTP/1.1 server on a random local port, used by the tracking
// client and language model tests. Same idea as a hand-rolled metrics
// endpoint: a bare TcpListener, read the request, write a canned response,
// close the socket. No framework, no keep-alive.
//
// Routes match on the exact path (query string ignored). Unknown paths get a
// 404. Every request line and body is recorded so tests can check what was
// actually sent.
// =============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

#[derive(Debug, Clone)]
pub struct StubRoute {
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl StubRoute {
    pub fn new(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// e.g. `GET /vessels?api_key=k&name=x HTTP/1.1`
    pub line: String,
    pub body: String,
}

pub struct StubServer {
    addr: std::net::SocketAddr,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<StubRoute>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let log = Arc::clone(&recorded);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve_one(stream, &routes, &log).await;
                });
            }
        });

        Self { addr, recorded }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    /// Request lines seen so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.recorded.lock().iter().map(|r| r.line.clone()).collect()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.recorded.lock().iter().map(|r| r.body.clone()).collect()
    }
}

async fn serve_one(
    mut stream: TcpStream,
    routes: &[StubRoute],
    log: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    // Drain the body so closing the socket doesn't reset the connection.
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    log.lock().push(RecordedRequest {
        line: line.clone(),
        body,
    });

    let target = line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/");

    let (status, payload) = routes
        .iter()
        .find(|r| r.path == path)
        .map(|r| (r.status, r.body.as_str()))
        .unwrap_or((404, "not found"));

    let response = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload,
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
