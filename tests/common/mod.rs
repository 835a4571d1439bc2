//! Local stand-in for the GitHub API used by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Response, Server};
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct Route {
    method: String,
    path: String,
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

pub struct MockGithub {
    pub base: String,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockGithub {
    pub fn start() -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let routes: Arc<Mutex<Vec<Route>>> = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let thread_routes = Arc::clone(&routes);
        let thread_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);

                let recorded = RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|h| (h.field.to_string(), h.value.to_string()))
                        .collect(),
                    body,
                };

                let route = thread_routes
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|r| r.method == recorded.method && r.path == recorded.path())
                    .cloned();
                thread_requests.lock().unwrap().push(recorded);

                let response = match route {
                    Some(route) => Response::from_data(route.body)
                        .with_status_code(route.status)
                        .with_header(
                            Header::from_bytes(&b"Content-Type"[..], route.content_type.as_bytes())
                                .unwrap(),
                        ),
                    None => Response::from_data(br#"{"message":"Not Found"}"#.to_vec())
                        .with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base: format!("http://127.0.0.1:{port}"),
            routes,
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn route(&self, method: &str, path: &str, status: u16, content_type: &str, body: Vec<u8>) {
        self.routes.lock().unwrap().push(Route {
            method: method.to_string(),
            path: path.to_string(),
            status,
            content_type: content_type.to_string(),
            body,
        });
    }

    pub fn json(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.route(method, path, status, "application/json", body.to_string().into_bytes());
    }

    /// Serve a latest release for `owner/repo` with assets hosted by this server.
    pub fn release(&self, owner: &str, repo: &str, tag: &str, assets: &[(&str, Vec<u8>)]) {
        let mut listed = Vec::new();
        for (name, data) in assets {
            let path = format!("/download/{owner}/{repo}/{tag}/{name}");
            listed.push(serde_json::json!({
                "name": name,
                "browser_download_url": self.url(&path),
            }));
            self.route("GET", &path, 200, "application/octet-stream", data.clone());
        }

        self.json(
            "GET",
            &format!("/repos/{owner}/{repo}/releases/latest"),
            200,
            serde_json::json!({ "tag_name": tag, "assets": listed }),
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }
}

/// Build a zip in memory. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Stored zip holding `entries` with the first byte of `damaged`'s data
/// flipped, so reading that entry fails its CRC check.
pub fn zip_bytes_with_bad_crc(entries: &[(&str, &[u8])], damaged: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, stored).unwrap();
        writer.write_all(data).unwrap();
    }
    let mut bytes = writer.finish().unwrap().into_inner();

    let at = bytes
        .windows(damaged.len())
        .position(|w| w == damaged)
        .unwrap();
    bytes[at] ^= 0xff;
    bytes
}
