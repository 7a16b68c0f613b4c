use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A toy HTTP server answering each connection with the next raw response of a script.
///
/// Useful to produce responses `hyper` refuses to parse, which surface as transport errors.
/// Once the script is exhausted the last response is repeated.
pub struct SimpleServer {
    listener: TcpListener,
    port: u16,
    host: String,
    raw_http_responses: Vec<String>,
    connections: Arc<AtomicUsize>,
}

impl SimpleServer {
    pub async fn new(
        host: &str,
        port: Option<u16>,
        raw_http_responses: Vec<String>,
    ) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(format!("{}:{}", host, port.unwrap_or(0))).await?;

        let port = listener.local_addr()?.port();

        Ok(Self {
            listener,
            port,
            host: host.to_string(),
            raw_http_responses,
            connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Number of connections served so far.
    pub fn connections(&self) -> Arc<AtomicUsize> {
        self.connections.clone()
    }

    pub async fn start(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let served = self.connections.fetch_add(1, Ordering::SeqCst);
                    let response = self
                        .raw_http_responses
                        .get(served)
                        .or_else(|| self.raw_http_responses.last())
                        .cloned()
                        .unwrap_or_default();
                    if let Err(e) = Self::handle_connection(stream, response).await {
                        println!("Error handling connection: {}", e);
                    }
                }
                Err(e) => println!("Connection failed: {}", e),
            }
        }
    }

    async fn handle_connection(
        mut stream: TcpStream,
        raw_http_response: String,
    ) -> Result<(), anyhow::Error> {
        // 1024 bytes is enough for the request line and headers of a test request
        let mut buffer = [0; 1024];
        let read = stream.read(&mut buffer).await?;

        let request = String::from_utf8_lossy(&buffer[..read]);
        if let Some(request_line) = request.lines().next() {
            println!("Request: {}", request_line);
        }

        stream.write_all(raw_http_response.as_bytes()).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        Ok(())
    }
}
