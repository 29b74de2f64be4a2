use crate::config::ObsSettings;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};

/// Minimal synchronous obs-websocket v5 client.
///
/// Covers exactly what the playback driver needs: the Hello/Identify
/// handshake (including challenge auth) and correlated request calls.
/// Event messages are ignored.
pub struct ObsClient {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl ObsClient {
    /// Connect and identify against the production tool's websocket.
    pub fn connect(settings: &ObsSettings) -> Result<Self, String> {
        let url = format!("ws://{}:{}", settings.host, settings.port);
        let (socket, _) = connect(url.as_str()).map_err(|e| format!("OBS connect error: {}", e))?;
        let mut client = ObsClient { socket };
        client.identify(&settings.password)?;
        Ok(client)
    }

    fn identify(&mut self, password: &str) -> Result<(), String> {
        let hello = self.read_json()?;
        if hello["op"] != 0 {
            return Err(format!("Expected OBS Hello, got op {}", hello["op"]));
        }
        let mut payload = json!({ "rpcVersion": 1 });
        if let Some(auth) = hello["d"]["authentication"].as_object() {
            let challenge = auth.get("challenge").and_then(Value::as_str).unwrap_or("");
            let salt = auth.get("salt").and_then(Value::as_str).unwrap_or("");
            payload["authentication"] = Value::String(auth_response(password, salt, challenge));
        }
        self.send_json(&json!({ "op": 1, "d": payload }))?;
        loop {
            let msg = self.read_json()?;
            if msg["op"] == 2 {
                return Ok(());
            }
        }
    }

    /// Issue one request and wait for its correlated response.
    pub fn call(&mut self, request_type: &str, request_data: Value) -> Result<Value, String> {
        let request_id = format!("{:016x}", fastrand::u64(..));
        self.send_json(&json!({
            "op": 6,
            "d": {
                "requestType": request_type,
                "requestId": request_id,
                "requestData": request_data,
            }
        }))?;
        loop {
            let msg = self.read_json()?;
            if msg["op"] != 7 || msg["d"]["requestId"] != request_id.as_str() {
                continue;
            }
            let status = &msg["d"]["requestStatus"];
            if status["result"] == true {
                return Ok(msg["d"]["responseData"].clone());
            }
            let comment = status["comment"].as_str().unwrap_or("no comment");
            return Err(format!("OBS request {} failed: {}", request_type, comment));
        }
    }

    /// Create a media input on a scene, pointed at a local file.
    pub fn create_input(
        &mut self,
        scene: &str,
        input: &str,
        kind: &str,
        settings: Value,
    ) -> Result<(), String> {
        self.call(
            "CreateInput",
            json!({
                "sceneName": scene,
                "inputName": input,
                "inputKind": kind,
                "inputSettings": settings,
            }),
        )
        .map(|_| ())
    }

    /// Restart a media input from the beginning.
    pub fn restart_media(&mut self, input: &str) -> Result<(), String> {
        self.call(
            "TriggerMediaInputAction",
            json!({
                "inputName": input,
                "mediaAction": "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_RESTART",
            }),
        )
        .map(|_| ())
    }

    /// Remove an input entirely (detaches it from every scene).
    pub fn remove_input(&mut self, input: &str) -> Result<(), String> {
        self.call("RemoveInput", json!({ "inputName": input })).map(|_| ())
    }

    pub fn close(mut self) {
        let _ = self.socket.close(None);
    }

    fn send_json(&mut self, value: &Value) -> Result<(), String> {
        self.socket
            .send(Message::Text(value.to_string()))
            .map_err(|e| format!("OBS send error: {}", e))
    }

    fn read_json(&mut self) -> Result<Value, String> {
        loop {
            let msg = self
                .socket
                .read()
                .map_err(|e| format!("OBS read error: {}", e))?;
            if let Message::Text(text) = msg {
                return serde_json::from_str(&text)
                    .map_err(|e| format!("OBS sent invalid JSON: {}", e));
            }
            // Ping/pong and binary frames are handled by tungstenite.
        }
    }
}

/// obs-websocket challenge response:
/// base64(sha256(base64(sha256(password + salt)) + challenge)).
fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    let secret = BASE64.encode(hasher.finalize());

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(challenge.as_bytes());
    BASE64.encode(hasher.finalize())
}
