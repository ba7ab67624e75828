use crate::browser::launcher::{build_command, LaunchOptions};
use crate::browser::page::{Dialog, Navigation};
use crate::error::{Result, UiScoutError};
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

type WsSink = futures::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;

/// State the reader task collects from CDP events.
#[derive(Default)]
pub struct PageEvents {
    dialogs: parking_lot::Mutex<Vec<Dialog>>,
    load_count: AtomicU64,
    document_status: parking_lot::Mutex<Option<u16>>,
    main_frame: parking_lot::Mutex<Option<String>>,
}

impl PageEvents {
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.dialogs.lock().clone()
    }

    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn document_status(&self) -> Option<u16> {
        *self.document_status.lock()
    }

    fn is_main_frame(&self, frame_id: Option<&str>) -> bool {
        match (self.main_frame.lock().as_deref(), frame_id) {
            (Some(main), Some(frame)) => main == frame,
            _ => true,
        }
    }
}

/// CDP client over a raw WebSocket to one page target.
pub struct CDPClient {
    ws_tx: Option<Arc<Mutex<WsSink>>>,
    /// Pending command responses keyed by message id
    responses: Arc<Mutex<HashMap<u32, oneshot::Sender<Value>>>>,
    msg_id: Arc<AtomicU32>,
    events: Arc<PageEvents>,
    chrome: parking_lot::Mutex<Option<Child>>,
    user_data_dir: Option<PathBuf>,
    /// Scenario this browser belongs to, for logs
    label: String,
    command_timeout: Duration,
    cdp_port: u16,
}

impl CDPClient {
    pub fn new(label: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            ws_tx: None,
            responses: Arc::new(Mutex::new(HashMap::new())),
            msg_id: Arc::new(AtomicU32::new(1)),
            events: Arc::new(PageEvents::default()),
            chrome: parking_lot::Mutex::new(None),
            user_data_dir: None,
            label: label.into(),
            command_timeout,
            cdp_port: 0,
        }
    }

    pub fn events(&self) -> Arc<PageEvents> {
        Arc::clone(&self.events)
    }

    pub fn cdp_port(&self) -> u16 {
        self.cdp_port
    }

    pub fn is_connected(&self) -> bool {
        self.ws_tx.is_some()
    }

    /// Send a CDP command and return its `result` object.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        let tx = self
            .ws_tx
            .as_ref()
            .ok_or_else(|| UiScoutError::Browser("WebSocket not connected".to_string()))?;

        let id = self.msg_id.fetch_add(1, Ordering::SeqCst);
        let (resp_tx, rx) = oneshot::channel();
        self.responses.lock().await.insert(id, resp_tx);

        let command = json!({
            "id": id,
            "method": method,
            "params": params
        });

        let sent = tx
            .lock()
            .await
            .send(WsMessage::Text(command.to_string()))
            .await;
        if let Err(e) = sent {
            self.responses.lock().await.remove(&id);
            return Err(UiScoutError::Browser(format!(
                "Failed to send {}: {}",
                method, e
            )));
        }

        let response = match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(UiScoutError::Browser(format!(
                    "Response channel closed for {}",
                    method
                )))
            }
            Err(_) => {
                self.responses.lock().await.remove(&id);
                return Err(UiScoutError::Timeout {
                    what: format!("CDP command {}", method),
                    timeout_ms: self.command_timeout.as_millis() as u64,
                });
            }
        };

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(UiScoutError::Browser(format!("{} failed: {}", method, message)));
        }

        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Launch Chrome with CDP enabled and connect to its first page.
    pub async fn launch(
        &mut self,
        chrome_path: &Path,
        options: &LaunchOptions,
        max_retries: u32,
    ) -> Result<()> {
        std::fs::create_dir_all(&options.user_data_dir)?;
        self.user_data_dir = Some(options.user_data_dir.clone());
        self.cdp_port = options.cdp_port;

        let child = build_command(chrome_path, options).spawn().map_err(|e| {
            UiScoutError::Browser(format!(
                "Failed to launch Chrome at {:?}: {}",
                chrome_path, e
            ))
        })?;
        tracing::debug!(
            "Launched Chrome pid={} port={} for {}",
            child.id(),
            self.cdp_port,
            self.label
        );
        *self.chrome.lock() = Some(child);

        let list_url = format!("http://127.0.0.1:{}/json/list", self.cdp_port);
        let mut last_error = String::new();

        for attempt in 1..=max_retries {
            tokio::time::sleep(Duration::from_millis(250)).await;

            match find_page_target(&list_url).await {
                Ok(ws_url) => match connect_async(ws_url.as_str()).await {
                    Ok((ws_stream, _)) => {
                        self.attach_stream(ws_stream);
                        self.enable_domains().await?;
                        tracing::info!("CDP client connected for {}", self.label);
                        return Ok(());
                    }
                    Err(e) => last_error = format!("Failed to connect WebSocket: {}", e),
                },
                Err(e) => last_error = e,
            }

            tracing::debug!("Retry {}/{}: {}", attempt, max_retries, last_error);
        }

        self.kill_chrome();
        Err(UiScoutError::Browser(format!(
            "Failed to connect to Chrome after {} retries: {}",
            max_retries, last_error
        )))
    }

    fn attach_stream(
        &mut self,
        ws_stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) {
        let (tx, mut rx) = StreamExt::split(ws_stream);
        let tx = Arc::new(Mutex::new(tx));
        self.ws_tx = Some(Arc::clone(&tx));

        let responses = Arc::clone(&self.responses);
        let events = Arc::clone(&self.events);
        let msg_id = Arc::clone(&self.msg_id);

        tokio::spawn(async move {
            while let Some(msg) = rx.next().await {
                match msg {
                    Ok(WsMessage::Text(text)) => {
                        let Ok(message) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        if let Some(id) = message.get("id").and_then(|i| i.as_u64()) {
                            if let Some(sender) = responses.lock().await.remove(&(id as u32)) {
                                let _ = sender.send(message);
                            }
                        } else if let Some(method) = message.get("method").and_then(|m| m.as_str())
                        {
                            let params = message.get("params").cloned().unwrap_or(Value::Null);
                            handle_event(method, &params, &events, &tx, &msg_id).await;
                        }
                    }
                    Ok(WsMessage::Close(_)) => {
                        tracing::debug!("WebSocket closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!("WebSocket error: {:?}", e);
                        break;
                    }
                    _ => {}
                }
            }
            // Fail anything still waiting instead of letting it hit the timeout
            responses.lock().await.clear();
        });
    }

    async fn enable_domains(&self) -> Result<()> {
        self.send_command("Page.enable", json!({})).await?;
        self.send_command("Runtime.enable", json!({})).await?;
        self.send_command("Network.enable", json!({})).await?;

        let tree = self.send_command("Page.getFrameTree", json!({})).await?;
        if let Some(frame_id) = tree
            .get("frameTree")
            .and_then(|t| t.get("frame"))
            .and_then(|f| f.get("id"))
            .and_then(|id| id.as_str())
        {
            *self.events.main_frame.lock() = Some(frame_id.to_string());
        }
        tracing::debug!("CDP domains enabled");
        Ok(())
    }

    /// Navigate and wait for the page's load event.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<Navigation> {
        let loads_before = self.events.load_count();
        *self.events.document_status.lock() = None;

        let result = self
            .send_command("Page.navigate", json!({ "url": url }))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(UiScoutError::Navigation {
                url: url.to_string(),
                reason: error.to_string(),
            });
        }

        // Same-document navigations carry no loader and fire no load event
        if result.get("loaderId").is_some() {
            self.wait_for_load(loads_before, timeout)
                .await
                .map_err(|e| UiScoutError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        }

        tracing::info!("Navigated to: {}", url);
        Ok(Navigation {
            url: self.get_url().await?,
            status: self.events.document_status(),
        })
    }

    /// Wait until more than `loads_before` load events have fired.
    pub async fn wait_for_load(&self, loads_before: u64, timeout: Duration) -> Result<()> {
        let start = tokio::time::Instant::now();
        while self.events.load_count() <= loads_before {
            if start.elapsed() > timeout {
                return Err(UiScoutError::Timeout {
                    what: "page load".to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(())
    }

    /// Evaluate an expression and return its value by value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true
                }),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let message = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .or_else(|| details.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or("script exception");
            return Err(UiScoutError::Browser(format!(
                "Evaluation failed: {}",
                message
            )));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub async fn get_url(&self) -> Result<String> {
        let value = self.evaluate("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Capture a PNG screenshot of the viewport.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let result = self
            .send_command("Page.captureScreenshot", json!({ "format": "png" }))
            .await?;

        let data = result
            .get("data")
            .and_then(|d| d.as_str())
            .ok_or_else(|| UiScoutError::Browser("Failed to capture screenshot".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| UiScoutError::Browser(format!("Invalid screenshot data: {}", e)))
    }

    /// Close the socket, stop Chrome and remove its profile directory.
    pub async fn close(&self) -> Result<()> {
        if let Some(tx) = &self.ws_tx {
            let _ = tx.lock().await.close().await;
        }
        self.kill_chrome();
        tracing::info!("CDP client closed for {}", self.label);
        Ok(())
    }

    fn kill_chrome(&self) {
        if let Some(mut child) = self.chrome.lock().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(dir) = &self.user_data_dir {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

impl Drop for CDPClient {
    fn drop(&mut self) {
        self.kill_chrome();
    }
}

/// Ask the DevTools HTTP endpoint for the first page target's WebSocket URL.
async fn find_page_target(list_url: &str) -> std::result::Result<String, String> {
    let response = reqwest::get(list_url)
        .await
        .map_err(|e| format!("Connection error: {}", e))?;
    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()));
    }
    let targets: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse targets response: {}", e))?;

    targets
        .as_array()
        .and_then(|arr| {
            arr.iter()
                .find(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
        })
        .ok_or_else(|| "No page target found".to_string())?
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| "No webSocketDebuggerUrl in page target".to_string())
}

async fn handle_event(
    method: &str,
    params: &Value,
    events: &PageEvents,
    tx: &Mutex<WsSink>,
    msg_id: &AtomicU32,
) {
    match method {
        "Page.javascriptDialogOpening" => {
            let dialog = Dialog {
                kind: params
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("alert")
                    .to_string(),
                message: params
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
            };
            let accept = json!({
                "id": msg_id.fetch_add(1, Ordering::SeqCst),
                "method": "Page.handleJavaScriptDialog",
                "params": { "accept": true }
            });
            if let Err(e) = tx.lock().await.send(WsMessage::Text(accept.to_string())).await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
            tracing::debug!("Accepted {} dialog: {}", dialog.kind, dialog.message);
            events.dialogs.lock().push(dialog);
        }
        "Page.loadEventFired" => {
            events.load_count.fetch_add(1, Ordering::SeqCst);
        }
        "Network.responseReceived" => {
            let is_document = params.get("type").and_then(|t| t.as_str()) == Some("Document");
            let frame = params.get("frameId").and_then(|f| f.as_str());
            if is_document && events.is_main_frame(frame) {
                let status = params
                    .get("response")
                    .and_then(|r| r.get("status"))
                    .and_then(|s| s.as_u64())
                    .map(|s| s as u16);
                *events.document_status.lock() = status;
            }
        }
        _ => {
            tracing::trace!("CDP event: {}", method);
        }
    }
}
