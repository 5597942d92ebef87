use std::sync::{Arc, Mutex};

use serde_json::Value;
use table_crafter::{api::HttpApi, config::ApiConfig};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

/// One HTTP request as it arrived on the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }

    /// `"PUT /api/update/users"`
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

type Responder = dyn Fn(&CapturedRequest) -> (u16, Value) + Send + Sync;

/// A plain HTTP/1.1 server on a random local port that records every request
/// and answers each one through `respond`.
pub struct WireServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl WireServer {
    pub async fn start(respond: impl Fn(&CapturedRequest) -> (u16, Value) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = recorded.clone();
                let respond = respond.clone();
                tokio::spawn(async move { serve_connection(stream, recorded, respond).await });
            }
        });

        Self { base_url, requests, task }
    }

    /// Answers every request with the same status and body.
    pub async fn always(status: u16, body: Value) -> Self {
        Self::start(move |_| (status, body.clone())).await
    }

    pub fn api(&self) -> HttpApi {
        self.api_with(ApiConfig { base_url: self.base_url.clone(), ..ApiConfig::default() })
    }

    pub fn api_with(&self, config: ApiConfig) -> HttpApi {
        HttpApi::new(&config).unwrap()
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Request lines of everything received so far, e.g. `GET /api/tables`.
    pub fn lines(&self) -> Vec<String> {
        self.requests().iter().map(CapturedRequest::line).collect()
    }
}

impl Drop for WireServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<CapturedRequest>>>,
    respond: Arc<Responder>,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    let (status, body) = respond(&request);
    recorded.lock().unwrap().push(request);

    let body = body.to_string();
    let head = format!(
        "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let response = head + &body;
    stream.write_all(response.as_bytes()).await.ok();
    stream.shutdown().await.ok();
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    let body = (!body.is_empty()).then(|| serde_json::from_slice(&body).unwrap());

    Some(CapturedRequest { method, path, headers, body })
}
