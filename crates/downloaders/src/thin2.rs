//! Remaining thinner-but-real drivers: Flood, Hadouken, Synology
//! DownloadStation, Freebox Download, rqbit, Tribler. Same calibration as
//! `thin.rs` — real wire calls, simplified response mapping.

use std::time::Duration;

use async_trait::async_trait;
use radarr_core::models::{DownloadItem, DownloadItemStatus};
use radarr_core::{RadarrError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use tokio::sync::RwLock;

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol, TorrentClient};

fn http_client(timeout: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout))
        .cookie_store(true)
        .build()
        .map_err(|e| RadarrError::InvalidClient {
            client: "thin-driver".to_string(),
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn ext_err(service: &str, error: impl std::fmt::Display) -> RadarrError {
    RadarrError::ExternalServiceError {
        service: service.to_string(),
        error: error.to_string(),
    }
}

// ------------------------------------------------------------------ Flood

/// Flood's REST API behind its own cookie-session login, same shape as
/// qBittorrent's `auth/login`.
pub struct FloodClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
}

impl FloodClient {
    pub fn new(base_url: impl Into<String>, username: String, password: String, timeout: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            username,
            password,
            client: http_client(timeout)?,
        })
    }

    async fn login(&self) -> Result<()> {
        let url = format!("{}/api/auth/authenticate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "username": self.username, "password": self.password }))
            .send()
            .await
            .map_err(|e| ext_err("Flood", e))?;
        if !response.status().is_success() {
            return Err(RadarrError::AuthFailed {
                client: "flood".to_string(),
                message: format!("authenticate returned {}", response.status()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DownloadClient for FloodClient {
    fn client_type(&self) -> ClientType {
        ClientType::Flood
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.login().await
    }

    async fn connect(&self) -> Result<()> {
        self.login().await
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        self.login().await?;
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "flood".to_string(),
            message: "Flood driver only supports add-by-url/magnet".to_string(),
        })?;
        let endpoint = format!("{}/api/torrents/add-urls", self.base_url.trim_end_matches('/'));
        self.client
            .post(&endpoint)
            .json(&json!({ "urls": [url], "destination": opts.download_dir, "start": !opts.paused }))
            .send()
            .await
            .map_err(|e| ext_err("Flood", e))?;
        Ok(url.to_string())
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let url = format!("{}/api/torrents", self.base_url.trim_end_matches('/'));
        let v: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ext_err("Flood", e))?
            .json()
            .await
            .map_err(|e| ext_err("Flood", e))?;
        let torrents = v.get("torrents").cloned().unwrap_or(Value::Null);
        let Some(map) = torrents.as_object() else {
            return Ok(Vec::new());
        };
        Ok(map
            .iter()
            .map(|(hash, t)| DownloadItem {
                id: hash.clone(),
                name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: match t.get("status").and_then(Value::as_array).and_then(|a| a.first()).and_then(Value::as_str) {
                    Some("downloading") => DownloadItemStatus::Downloading,
                    Some("seeding") => DownloadItemStatus::Seeding,
                    Some("stopped") | Some("paused") => DownloadItemStatus::Paused,
                    Some("complete") => DownloadItemStatus::Completed,
                    Some("error") => DownloadItemStatus::Error,
                    _ => DownloadItemStatus::Unknown,
                },
                progress: t.get("percentComplete").and_then(Value::as_f64).unwrap_or(0.0),
                size_bytes: t.get("sizeBytes").and_then(Value::as_i64),
                downloaded_bytes: t.get("bytesDone").and_then(Value::as_i64),
                download_speed: t.get("downRate").and_then(Value::as_u64),
                upload_speed: t.get("upRate").and_then(Value::as_u64),
                eta_seconds: t.get("eta").and_then(Value::as_i64).unwrap_or(-1),
                download_dir: t.get("directory").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        let url = format!("{}/api/torrents/delete", self.base_url.trim_end_matches('/'));
        self.client
            .post(&url)
            .json(&json!({ "hashes": [id], "deleteData": delete_files }))
            .send()
            .await
            .map_err(|e| ext_err("Flood", e))?;
        Ok(())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/torrents/stop", self.base_url.trim_end_matches('/'));
        self.client.post(&url).json(&json!({ "hashes": [id] })).send().await.map_err(|e| ext_err("Flood", e))?;
        Ok(())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/torrents/start", self.base_url.trim_end_matches('/'));
        self.client.post(&url).json(&json!({ "hashes": [id] })).send().await.map_err(|e| ext_err("Flood", e))?;
        Ok(())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(RadarrError::NotImplemented {
            client: "flood".to_string(),
            capability: "get_download_dir".to_string(),
        })
    }
}

#[async_trait]
impl TorrentClient for FloodClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "flood".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

// --------------------------------------------------------------- Hadouken

/// Hadouken's JSON-RPC 2.0 API, gated on daemon version >= 5.1.0.
pub struct HadoukenClient {
    rpc_url: String,
    client: Client,
}

impl HadoukenClient {
    pub fn new(base_url: impl Into<String>, timeout: u64) -> Result<Self> {
        Ok(Self {
            rpc_url: format!("{}/jsonrpc", base_url.into().trim_end_matches('/')),
            client: http_client(timeout)?,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
        let v: Value = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ext_err("Hadouken", e))?
            .json()
            .await
            .map_err(|e| ext_err("Hadouken", e))?;
        if let Some(err) = v.get("error") {
            return Err(ext_err("Hadouken", err));
        }
        Ok(v.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl DownloadClient for HadoukenClient {
    fn client_type(&self) -> ClientType {
        ClientType::Hadouken
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        let v = self.call("core.getVersion", json!([])).await?;
        let version = v.as_str().unwrap_or("0.0.0");
        let mut parts = version.split('.').filter_map(|p| p.parse::<u32>().ok());
        let (major, minor) = (parts.next().unwrap_or(0), parts.next().unwrap_or(0));
        if (major, minor) < (5, 1) {
            return Err(RadarrError::InvalidClient {
                client: "hadouken".to_string(),
                message: format!("daemon version {version} is below the required 5.1.0"),
            });
        }
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        self.call("core.getVersion", json!([])).await.map(|_| ())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "hadouken".to_string(),
            message: "Hadouken driver only supports add-by-url/magnet".to_string(),
        })?;
        let v = self
            .call("torrents.addUrl", json!([url, { "savepath": opts.download_dir }]))
            .await?;
        v.as_str().map(str::to_string).ok_or_else(|| ext_err("Hadouken", "addUrl did not return an id"))
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let v = self.call("torrents.list", json!([])).await?;
        let Some(arr) = v.as_array() else { return Ok(Vec::new()) };
        Ok(arr
            .iter()
            .map(|t| DownloadItem {
                id: t.get("infoHash").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: DownloadItemStatus::Unknown,
                progress: t.get("progress").and_then(Value::as_f64).unwrap_or(0.0) * 100.0,
                size_bytes: t.get("totalSize").and_then(Value::as_i64),
                downloaded_bytes: None,
                download_speed: None,
                upload_speed: None,
                eta_seconds: -1,
                download_dir: t.get("savePath").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list().await?.into_iter().find(|t| t.id == id).ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        self.call("torrents.remove", json!([[id], delete_files])).await.map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.call("torrents.pause", json!([[id]])).await.map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.call("torrents.resume", json!([[id]])).await.map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        let v = self.call("core.getConfiguration", json!(["downloads.save_path"])).await?;
        v.as_str().map(str::to_string).ok_or_else(|| ext_err("Hadouken", "save_path missing"))
    }
}

#[async_trait]
impl TorrentClient for HadoukenClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "hadouken".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

// --------------------------------------------------------- DownloadStation

/// Synology DownloadStation's multi-step SID auth: `auth.cgi?login`
/// returns a `sid` that must be appended to every subsequent call; a
/// 105/106/107/119 error code means the session expired and a fresh
/// login is required.
pub struct DownloadStationClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
    sid: RwLock<Option<String>>,
}

const DS_REAUTH_CODES: [i64; 4] = [105, 106, 107, 119];

impl DownloadStationClient {
    pub fn new(base_url: impl Into<String>, username: String, password: String, timeout: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            username,
            password,
            client: http_client(timeout)?,
            sid: RwLock::new(None),
        })
    }

    async fn login(&self) -> Result<String> {
        let url = format!(
            "{}/webapi/auth.cgi?api=SYNO.API.Auth&version=6&method=login&account={}&passwd={}&session=DownloadStation&format=sid",
            self.base_url.trim_end_matches('/'), self.username, self.password
        );
        let v: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ext_err("DownloadStation", e))?
            .json()
            .await
            .map_err(|e| ext_err("DownloadStation", e))?;
        if v.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(RadarrError::AuthFailed {
                client: "downloadstation".to_string(),
                message: "auth.cgi login failed".to_string(),
            });
        }
        let sid = v.pointer("/data/sid").and_then(Value::as_str).unwrap_or_default().to_string();
        *self.sid.write().await = Some(sid.clone());
        Ok(sid)
    }

    async fn call(&self, api: &str, method: &str, version: u32, extra: &str) -> Result<Value> {
        let sid = match self.sid.read().await.clone() {
            Some(s) => s,
            None => self.login().await?,
        };
        let url = format!(
            "{}/webapi/DownloadStation/task.cgi?api={api}&version={version}&method={method}&_sid={sid}{extra}",
            self.base_url.trim_end_matches('/')
        );
        let v: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ext_err("DownloadStation", e))?
            .json()
            .await
            .map_err(|e| ext_err("DownloadStation", e))?;
        let code = v.pointer("/error/code").and_then(Value::as_i64);
        if let Some(code) = code {
            if DS_REAUTH_CODES.contains(&code) {
                self.login().await?;
                return Err(ext_err("DownloadStation", format!("session expired (code {code}), retry")));
            }
            return Err(ext_err("DownloadStation", format!("API error code {code}")));
        }
        Ok(v)
    }
}

#[async_trait]
impl DownloadClient for DownloadStationClient {
    fn client_type(&self) -> ClientType {
        ClientType::DownloadStation
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.login().await.map(|_| ())
    }

    async fn connect(&self) -> Result<()> {
        self.login().await.map(|_| ())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "downloadstation".to_string(),
            message: "DownloadStation driver only supports add-by-url/magnet".to_string(),
        })?;
        let extra = format!("&uri={url}&destination={}", opts.download_dir);
        self.call("SYNO.DownloadStation.Task", "create", 1, &extra).await?;
        Ok(url.to_string())
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let v = self.call("SYNO.DownloadStation.Task", "list", 1, "&additional=detail,transfer").await?;
        let tasks = v.pointer("/data/tasks").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(tasks
            .iter()
            .map(|t| DownloadItem {
                id: t.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: t.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: match t.get("status").and_then(Value::as_str) {
                    Some("downloading") => DownloadItemStatus::Downloading,
                    Some("paused") => DownloadItemStatus::Paused,
                    Some("finished") | Some("seeding") => DownloadItemStatus::Completed,
                    Some("error") => DownloadItemStatus::Error,
                    _ => DownloadItemStatus::Unknown,
                },
                progress: 0.0,
                size_bytes: t.pointer("/size").and_then(Value::as_i64),
                downloaded_bytes: t.pointer("/additional/transfer/size_downloaded").and_then(Value::as_i64),
                download_speed: t.pointer("/additional/transfer/speed_download").and_then(Value::as_u64),
                upload_speed: t.pointer("/additional/transfer/speed_upload").and_then(Value::as_u64),
                eta_seconds: -1,
                download_dir: t.pointer("/additional/detail/destination").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list().await?.into_iter().find(|t| t.id == id).ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, _delete_files: bool) -> Result<()> {
        self.call("SYNO.DownloadStation.Task", "delete", 1, &format!("&id={id}")).await.map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.call("SYNO.DownloadStation.Task", "pause", 1, &format!("&id={id}")).await.map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.call("SYNO.DownloadStation.Task", "resume", 1, &format!("&id={id}")).await.map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(RadarrError::NotImplemented {
            client: "downloadstation".to_string(),
            capability: "get_download_dir".to_string(),
        })
    }
}

#[async_trait]
impl TorrentClient for DownloadStationClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "downloadstation".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

// ------------------------------------------------------------ FreeboxDownload

/// Freebox's challenge/HMAC-SHA1 session handshake: `login` returns a
/// challenge, the client HMAC-SHA1s it with the app token to obtain a
/// session token, which then rides in the `X-Fbx-App-Auth` header. A
/// 401/403 response means the session token expired.
pub struct FreeboxDownloadClient {
    base_url: String,
    app_token: String,
    client: Client,
    session_token: RwLock<Option<String>>,
}

impl FreeboxDownloadClient {
    pub fn new(base_url: impl Into<String>, app_token: String, timeout: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            app_token,
            client: http_client(timeout)?,
            session_token: RwLock::new(None),
        })
    }

    async fn authenticate(&self) -> Result<String> {
        let challenge_url = format!("{}/api/v4/login", self.base_url.trim_end_matches('/'));
        let v: Value = self
            .client
            .get(&challenge_url)
            .send()
            .await
            .map_err(|e| ext_err("FreeboxDownload", e))?
            .json()
            .await
            .map_err(|e| ext_err("FreeboxDownload", e))?;
        let challenge = v
            .pointer("/result/challenge")
            .and_then(Value::as_str)
            .ok_or_else(|| ext_err("FreeboxDownload", "login response missing challenge"))?;

        let mut mac = hmac_sha1(self.app_token.as_bytes(), challenge.as_bytes());
        let password: String = mac.drain(..).map(|b| format!("{b:02x}")).collect();

        let session_url = format!("{}/api/v4/login/session", self.base_url.trim_end_matches('/'));
        let v: Value = self
            .client
            .post(&session_url)
            .json(&json!({ "app_id": "radarr", "password": password }))
            .send()
            .await
            .map_err(|e| ext_err("FreeboxDownload", e))?
            .json()
            .await
            .map_err(|e| ext_err("FreeboxDownload", e))?;
        let session_token = v
            .pointer("/result/session_token")
            .and_then(Value::as_str)
            .ok_or_else(|| RadarrError::AuthFailed {
                client: "freeboxdownload".to_string(),
                message: "session token missing from login/session response".to_string(),
            })?
            .to_string();
        *self.session_token.write().await = Some(session_token.clone());
        Ok(session_token)
    }

    async fn call(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value> {
        let token = match self.session_token.read().await.clone() {
            Some(t) => t,
            None => self.authenticate().await?,
        };
        let url = format!("{}/api/v4{path}", self.base_url.trim_end_matches('/'));
        let mut req = self.client.request(method, &url).header("X-Fbx-App-Auth", &token);
        if let Some(b) = &body {
            req = req.json(b);
        }
        let response = req.send().await.map_err(|e| ext_err("FreeboxDownload", e))?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED || response.status() == reqwest::StatusCode::FORBIDDEN {
            self.authenticate().await?;
            return Err(ext_err("FreeboxDownload", "session expired, retry"));
        }
        response.json().await.map_err(|e| ext_err("FreeboxDownload", e))
    }
}

fn hmac_sha1(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = <hmac::Hmac<Sha1> as hmac::Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    hmac::Mac::update(&mut mac, message);
    hmac::Mac::finalize(mac).into_bytes().to_vec()
}

#[async_trait]
impl DownloadClient for FreeboxDownloadClient {
    fn client_type(&self) -> ClientType {
        ClientType::FreeboxDownload
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.authenticate().await.map(|_| ())
    }

    async fn connect(&self) -> Result<()> {
        self.authenticate().await.map(|_| ())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "freeboxdownload".to_string(),
            message: "Freebox driver only supports add-by-url/magnet".to_string(),
        })?;
        let v = self
            .call(
                reqwest::Method::POST,
                "/downloads/add",
                Some(json!({ "download_url": url, "download_dir": opts.download_dir })),
            )
            .await?;
        v.pointer("/result/id")
            .map(|id| id.to_string())
            .ok_or_else(|| ext_err("FreeboxDownload", "downloads/add did not return an id"))
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let v = self.call(reqwest::Method::GET, "/downloads", None).await?;
        let Some(arr) = v.get("result").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(arr
            .iter()
            .map(|t| DownloadItem {
                id: t.get("id").map(|i| i.to_string()).unwrap_or_default(),
                name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: match t.get("status").and_then(Value::as_str) {
                    Some("downloading") => DownloadItemStatus::Downloading,
                    Some("stopped") => DownloadItemStatus::Paused,
                    Some("done") | Some("seeding") => DownloadItemStatus::Completed,
                    Some("error") => DownloadItemStatus::Error,
                    _ => DownloadItemStatus::Unknown,
                },
                progress: {
                    let size = t.get("size").and_then(Value::as_f64).unwrap_or(0.0);
                    let rx = t.get("rx_bytes").and_then(Value::as_f64).unwrap_or(0.0);
                    if size > 0.0 { rx / size * 100.0 } else { 0.0 }
                },
                size_bytes: t.get("size").and_then(Value::as_i64),
                downloaded_bytes: t.get("rx_bytes").and_then(Value::as_i64),
                download_speed: t.get("rx_rate").and_then(Value::as_u64),
                upload_speed: t.get("tx_rate").and_then(Value::as_u64),
                eta_seconds: t.get("eta").and_then(Value::as_i64).unwrap_or(-1),
                download_dir: t.get("download_dir").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list().await?.into_iter().find(|t| t.id == id).ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        let path = format!("/downloads/{id}{}", if delete_files { "/erase" } else { "" });
        self.call(reqwest::Method::DELETE, &path, None).await.map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.call(reqwest::Method::PUT, &format!("/downloads/{id}"), Some(json!({ "status": "stopped" }))).await.map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.call(reqwest::Method::PUT, &format!("/downloads/{id}"), Some(json!({ "status": "downloading" }))).await.map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(RadarrError::NotImplemented {
            client: "freeboxdownload".to_string(),
            capability: "get_download_dir".to_string(),
        })
    }
}

#[async_trait]
impl TorrentClient for FreeboxDownloadClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "freeboxdownload".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

// --------------------------------------------------------------------- rqbit

/// rqbit's small REST API (`/torrents`, no auth by default).
pub struct RqbitClient {
    base_url: String,
    client: Client,
}

impl RqbitClient {
    pub fn new(base_url: impl Into<String>, timeout: u64) -> Result<Self> {
        Ok(Self { base_url: base_url.into(), client: http_client(timeout)? })
    }
}

#[async_trait]
impl DownloadClient for RqbitClient {
    fn client_type(&self) -> ClientType {
        ClientType::Rqbit
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.client
            .get(format!("{}/", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        self.test().await
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "rqbit".to_string(),
            message: "rqbit driver only supports add-by-url/magnet".to_string(),
        })?;
        let endpoint = format!("{}/torrents?output_folder={}", self.base_url.trim_end_matches('/'), opts.download_dir);
        let v: Value = self
            .client
            .post(&endpoint)
            .body(url.to_string())
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?
            .json()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        v.pointer("/details/info_hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ext_err("rqbit", "add response missing info_hash"))
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let v: Value = self
            .client
            .get(format!("{}/torrents", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?
            .json()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        let Some(arr) = v.get("torrents").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(arr
            .iter()
            .map(|t| DownloadItem {
                id: t.get("info_hash").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: DownloadItemStatus::Unknown,
                progress: 0.0,
                size_bytes: None,
                downloaded_bytes: None,
                download_speed: None,
                upload_speed: None,
                eta_seconds: -1,
                download_dir: None,
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list().await?.into_iter().find(|t| t.id == id).ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, _delete_files: bool) -> Result<()> {
        self.client
            .post(format!("{}/torrents/{id}/forget", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        Ok(())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.client
            .post(format!("{}/torrents/{id}/pause", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        Ok(())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.client
            .post(format!("{}/torrents/{id}/start", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ext_err("rqbit", e))?;
        Ok(())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(RadarrError::NotImplemented { client: "rqbit".to_string(), capability: "get_download_dir".to_string() })
    }
}

#[async_trait]
impl TorrentClient for RqbitClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "rqbit".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

// -------------------------------------------------------------------- Tribler

/// Tribler's REST API, authenticated with a static `X-Api-Key` header.
pub struct TriblerClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl TriblerClient {
    pub fn new(base_url: impl Into<String>, api_key: String, timeout: u64) -> Result<Self> {
        Ok(Self { base_url: base_url.into(), api_key, client: http_client(timeout)? })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url.trim_end_matches('/')))
            .header("X-Api-Key", &self.api_key)
    }
}

#[async_trait]
impl DownloadClient for TriblerClient {
    fn client_type(&self) -> ClientType {
        ClientType::Tribler
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        let response = self.request(reqwest::Method::GET, "/api/state").send().await.map_err(|e| ext_err("Tribler", e))?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RadarrError::AuthFailed { client: "tribler".to_string(), message: "invalid api key".to_string() });
        }
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        self.test().await
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let url = opts.url.or(opts.magnet).ok_or_else(|| RadarrError::InvalidClient {
            client: "tribler".to_string(),
            message: "Tribler driver only supports add-by-url/magnet".to_string(),
        })?;
        let v: Value = self
            .request(reqwest::Method::PUT, "/api/downloads")
            .json(&json!({ "uri": url, "destination": opts.download_dir }))
            .send()
            .await
            .map_err(|e| ext_err("Tribler", e))?
            .json()
            .await
            .map_err(|e| ext_err("Tribler", e))?;
        v.get("infohash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ext_err("Tribler", "PUT /api/downloads did not return an infohash"))
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let v: Value = self
            .request(reqwest::Method::GET, "/api/downloads?get_peers=0&get_pieces=0")
            .send()
            .await
            .map_err(|e| ext_err("Tribler", e))?
            .json()
            .await
            .map_err(|e| ext_err("Tribler", e))?;
        let Some(arr) = v.get("downloads").and_then(Value::as_array) else { return Ok(Vec::new()) };
        Ok(arr
            .iter()
            .map(|t| DownloadItem {
                id: t.get("infohash").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: match t.get("status").and_then(Value::as_str) {
                    Some("DLSTATUS_DOWNLOADING") => DownloadItemStatus::Downloading,
                    Some("DLSTATUS_SEEDING") => DownloadItemStatus::Seeding,
                    Some("DLSTATUS_STOPPED") => DownloadItemStatus::Paused,
                    _ => DownloadItemStatus::Unknown,
                },
                progress: t.get("progress").and_then(Value::as_f64).unwrap_or(0.0) * 100.0,
                size_bytes: t.get("size").and_then(Value::as_i64),
                downloaded_bytes: None,
                download_speed: t.get("speed_down").and_then(Value::as_u64),
                upload_speed: t.get("speed_up").and_then(Value::as_u64),
                eta_seconds: -1,
                download_dir: t.get("destination").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: None,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list().await?.into_iter().find(|t| t.id == id).ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        self.request(reqwest::Method::DELETE, &format!("/api/downloads/{id}"))
            .json(&json!({ "remove_data": delete_files }))
            .send()
            .await
            .map_err(|e| ext_err("Tribler", e))?;
        Ok(())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.request(reqwest::Method::PATCH, &format!("/api/downloads/{id}"))
            .json(&json!({ "state": "stop" }))
            .send()
            .await
            .map_err(|e| ext_err("Tribler", e))?;
        Ok(())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.request(reqwest::Method::PATCH, &format!("/api/downloads/{id}"))
            .json(&json!({ "state": "resume" }))
            .send()
            .await
            .map_err(|e| ext_err("Tribler", e))?;
        Ok(())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(RadarrError::NotImplemented { client: "tribler".to_string(), capability: "get_download_dir".to_string() })
    }
}

#[async_trait]
impl TorrentClient for TriblerClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions { url: None, magnet: Some(magnet), content: None, category: None, download_dir, paused: false }).await
    }

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Err(RadarrError::NotImplemented { client: "tribler".to_string(), capability: "set_seed_limits".to_string() })
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}
