// HTTP client for the labeling server (the Flask app this editor talks to).
//
// Endpoints:
//   GET  /get_image_pair?img=<name>  -> JSON pair metadata
//   GET  /image/<folder>/<name>      -> raw raster bytes
//   POST /save_mask                  -> {image: data-URL JPEG, maskFilename}
//
// The client is deliberately dumb: no retries, no caching. A failed transfer
// is an `Error` for the caller to report; it never touches editor state.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metadata for one image/mask pair, as served by `/get_image_pair`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagePair {
    /// URL path of the source image bytes, e.g. "/image/images/cat.jpg".
    pub image: String,
    /// URL path of the stored mask bytes.
    pub mask: String,
    pub filename: String,
    pub prev_filename: String,
    pub next_filename: String,
    pub total_pairs: usize,
    pub current_index: usize,
}

#[derive(Serialize)]
struct SaveMaskBody<'a> {
    /// "data:image/jpeg;base64,…" — the shape the server's decoder expects.
    image: String,
    #[serde(rename = "maskFilename")]
    mask_filename: &'a str,
}

#[derive(Deserialize)]
struct SaveMaskReply {
    message: String,
}

#[derive(Clone)]
pub struct DatasetClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl DatasetClient {
    /// `base_url` without a trailing slash, e.g. "http://127.0.0.1:5000".
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch pair metadata. With `img = None` the server picks its first
    /// image; otherwise the named image becomes current.
    pub fn fetch_pair(&self, img: Option<&str>) -> Result<ImagePair> {
        let mut req = self.http.get(format!("{}/get_image_pair", self.base_url));
        if let Some(name) = img {
            req = req.query(&[("img", name)]);
        }
        let resp = req.send()?;
        if !resp.status().is_success() {
            return Err(Error::Server(format!(
                "get_image_pair returned {}",
                resp.status()
            )));
        }
        let pair: ImagePair = resp.json()?;
        debug!(
            "pair {} ({}/{})",
            pair.filename,
            pair.current_index + 1,
            pair.total_pairs
        );
        Ok(pair)
    }

    /// Fetch raw bytes for a server path like "/image/masks/cat.jpg".
    pub fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(format!("{}{}", self.base_url, path)).send()?;
        if !resp.status().is_success() {
            return Err(Error::Server(format!("{path} returned {}", resp.status())));
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// Upload an encoded mask for `filename`. Success means the server wrote
    /// the file; local state is none of this function's business.
    pub fn save_mask(&self, jpeg: &[u8], filename: &str) -> Result<()> {
        let body = SaveMaskBody {
            image: format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg)),
            mask_filename: filename,
        };
        let resp = self
            .http
            .post(format!("{}/save_mask", self.base_url))
            .json(&body)
            .send()?;
        if !resp.status().is_success() {
            return Err(Error::Server(format!(
                "save_mask returned {}",
                resp.status()
            )));
        }
        let reply: SaveMaskReply = serde_json::from_str(&resp.text()?)?;
        info!("server: {}", reply.message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;
    use tiny_http::{Response, Server};

    /// Serve `n` requests on an ephemeral port, dispatching on URL.
    fn spawn_server(n: usize) -> (String, thread::JoinHandle<Vec<String>>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let base = format!("http://127.0.0.1:{port}");
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..n {
                let mut request = server.recv().unwrap();
                seen.push(request.url().to_string());
                if request.url().starts_with("/get_image_pair") {
                    let json = r#"{
                        "image": "/image/images/cat.jpg",
                        "mask": "/image/masks/cat.jpg",
                        "filename": "cat.jpg",
                        "prev_filename": "bird.jpg",
                        "next_filename": "dog.jpg",
                        "total_pairs": 3,
                        "current_index": 1
                    }"#;
                    request.respond(Response::from_string(json)).unwrap();
                } else if request.url() == "/save_mask" {
                    let mut body = String::new();
                    request.as_reader().read_to_string(&mut body).unwrap();
                    assert!(body.contains("data:image/jpeg;base64,"));
                    assert!(body.contains("maskFilename"));
                    request
                        .respond(Response::from_string(
                            r#"{"message": "Mask saved successfully"}"#,
                        ))
                        .unwrap();
                } else if request.url().starts_with("/image/") {
                    request
                        .respond(Response::from_data(vec![1u8, 2, 3, 4]))
                        .unwrap();
                } else {
                    request
                        .respond(Response::from_string("nope").with_status_code(404))
                        .unwrap();
                }
            }
            seen
        });
        (base, handle)
    }

    #[test]
    fn fetch_pair_parses_server_json() {
        let (base, handle) = spawn_server(2);
        let client = DatasetClient::new(&base);

        let pair = client.fetch_pair(None).unwrap();
        assert_eq!(pair.filename, "cat.jpg");
        assert_eq!(pair.next_filename, "dog.jpg");
        assert_eq!(pair.total_pairs, 3);

        let pair = client.fetch_pair(Some("cat.jpg")).unwrap();
        assert_eq!(pair.current_index, 1);

        let seen = handle.join().unwrap();
        assert_eq!(seen[0], "/get_image_pair");
        assert!(seen[1].contains("img=cat.jpg"));
    }

    #[test]
    fn fetch_bytes_and_missing_path() {
        let (base, handle) = spawn_server(2);
        let client = DatasetClient::new(&base);

        let bytes = client.fetch_bytes("/image/masks/cat.jpg").unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);

        // A 404 surfaces as a Server error, not a panic.
        assert!(client.fetch_bytes("/not_here").is_err());
        handle.join().unwrap();
    }

    #[test]
    fn save_mask_posts_data_url_payload() {
        let (base, handle) = spawn_server(1);
        let client = DatasetClient::new(&base);
        client.save_mask(&[0xFF, 0xD8, 0xFF, 0xD9], "cat.jpg").unwrap();
        handle.join().unwrap();
    }
}
