//! HTTP adapter: Implementation of PredictionApi over reqwest.
//!
//! Uses the blocking client; callers that must stay responsive run it on a
//! background thread (see `application::PredictionWorker`).
//!
//! Error mapping:
//! - non-2xx status: `ApiError::Remote` with the server's `error`/`details`
//! - no response (refused, DNS, timeout): `ApiError::Transport`
//! - request never left (bad URL, unreadable upload): `ApiError::Request`

use std::path::Path;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::domain::{ClinicalInput, PredictionResponse};
use crate::ports::{ApiError, ErrorBody, HealthStatus, PredictionApi};

/// Largest CSV accepted for batch scoring.
pub const MAX_BATCH_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Blocking HTTP client for the prediction service.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    config: ClientConfig,
    http: Client,
}

impl HttpPredictionClient {
    /// Create a client for the configured service.
    ///
    /// # Errors
    /// Returns `ApiError::Request` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().map_err(|e| {
            if e.is_builder() {
                ApiError::Request(e.to_string())
            } else {
                tracing::warn!("Prediction service unreachable: {}", e);
                ApiError::Transport(e.to_string())
            }
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        tracing::debug!("GET {}", url);
        let response = self.send(self.http.get(&url))?;
        read_json(response)
    }
}

/// Decode a JSON body, or turn an error status into `ApiError::Remote`.
fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .ok()
            .and_then(|text| serde_json::from_str::<ErrorBody>(&text).ok())
            .unwrap_or_default();
        tracing::warn!(
            "Prediction service responded with {}: {}",
            status.as_u16(),
            body.error.as_deref().unwrap_or("<no message>")
        );
        return Err(ApiError::Remote {
            status: status.as_u16(),
            error: body.error,
            details: body.details,
        });
    }

    response.json::<T>().map_err(|e| ApiError::Decode(e.to_string()))
}

/// Local checks before uploading a batch file.
fn check_batch_file(csv_path: &Path) -> Result<u64, ApiError> {
    let is_csv = csv_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(ApiError::Request("File must be a CSV file".to_string()));
    }

    let metadata = std::fs::metadata(csv_path)
        .map_err(|e| ApiError::Request(format!("Cannot read {}: {e}", csv_path.display())))?;
    if metadata.len() > MAX_BATCH_FILE_BYTES {
        return Err(ApiError::Request(
            "File size must be less than 10MB".to_string(),
        ));
    }

    Ok(metadata.len())
}

impl PredictionApi for HttpPredictionClient {
    fn predict(&self, input: &ClinicalInput) -> Result<PredictionResponse, ApiError> {
        let url = self.config.endpoint("/predict");
        tracing::debug!("POST {}", url);

        let response = self.send(self.http.post(&url).json(input))?;
        read_json(response)
    }

    fn predict_batch(&self, csv_path: &Path) -> Result<serde_json::Value, ApiError> {
        let size = check_batch_file(csv_path)?;
        let form = multipart::Form::new()
            .file("file", csv_path)
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let url = self.config.endpoint("/predict/batch");
        tracing::debug!("POST {} ({} bytes)", url, size);

        let response = self.send(self.http.post(&url).multipart(form))?;
        read_json(response)
    }

    fn model_info(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json("/model/info")
    }

    fn features(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json("/features")
    }

    fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("/health")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// Serve exactly one canned response; the handle yields the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind");
        let addr = listener.local_addr().expect("Should have address");

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("Should accept");
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .expect("Should write response");
            request
        });

        (format!("http://{addr}/api"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("Should set timeout");

        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut buf).expect("Should read");
            if n == 0 {
                return String::from_utf8_lossy(&data).into_owned();
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());

        match content_length {
            Some(len) => {
                while data.len() < header_end + len {
                    let n = stream.read(&mut buf).expect("Should read body");
                    if n == 0 {
                        break;
                    }
                    data.extend_from_slice(&buf[..n]);
                }
            }
            None if headers.contains("transfer-encoding: chunked") => {
                while !data.ends_with(b"0\r\n\r\n") {
                    let n = stream.read(&mut buf).expect("Should read chunk");
                    if n == 0 {
                        break;
                    }
                    data.extend_from_slice(&buf[..n]);
                }
            }
            None => {}
        }

        String::from_utf8_lossy(&data).into_owned()
    }

    fn client(url: &str) -> HttpPredictionClient {
        HttpPredictionClient::new(ClientConfig::new(url).with_timeout(Duration::from_secs(5)))
            .expect("Should build client")
    }

    fn sample_input() -> ClinicalInput {
        ClinicalInput {
            age: 63.0,
            sex: 1.0,
            cp: 3.0,
            trestbps: 145.0,
            chol: 233.0,
            fbs: 1.0,
            restecg: 0.0,
            thalach: 150.0,
            exang: 0.0,
            oldpeak: 2.3,
            slope: 0.0,
            ca: 0.0,
            thal: 1.0,
        }
    }

    #[test]
    fn test_predict_success() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"prediction":1,"probability":0.87,"risk_level":"High","confidence":"87.0%","feature_importance":{"age":0.12},"recommendations":["Consult a cardiologist"]}"#,
        );

        let response = client(&url).predict(&sample_input()).expect("Should predict");
        assert_eq!(response.prediction, Some(1));
        assert_eq!(response.probability, Some(0.87));
        assert_eq!(response.recommendations, vec!["Consult a cardiologist"]);

        let request = server.join().expect("Server thread");
        assert!(request.starts_with("POST /api/predict "));
        assert!(request.contains("\"chol\":233.0"));
        assert!(request.contains("\"oldpeak\":2.3"));
    }

    #[test]
    fn test_predict_remote_error_with_details() {
        let (url, server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":"Prediction failed","details":"model not loaded"}"#,
        );

        let err = client(&url)
            .predict(&sample_input())
            .expect_err("Should fail");
        assert_eq!(
            err,
            ApiError::Remote {
                status: 500,
                error: Some("Prediction failed".to_string()),
                details: Some("model not loaded".to_string()),
            }
        );
        server.join().expect("Server thread");
    }

    #[test]
    fn test_predict_remote_error_without_body() {
        let (url, server) = serve_once("400 Bad Request", "not json");

        let err = client(&url)
            .predict(&sample_input())
            .expect_err("Should fail");
        assert!(matches!(
            err,
            ApiError::Remote {
                status: 400,
                error: None,
                details: None
            }
        ));
        server.join().expect("Server thread");
    }

    #[test]
    fn test_success_with_unreadable_body_is_decode_error() {
        let (url, server) = serve_once("200 OK", "not json");

        let err = client(&url)
            .predict(&sample_input())
            .expect_err("Should fail to decode");
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(err
            .user_message()
            .starts_with("Error: The prediction service returned an unreadable response"));
        server.join().expect("Server thread");
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind");
            listener.local_addr().expect("Should have address").port()
        };

        let err = client(&format!("http://127.0.0.1:{port}/api"))
            .health()
            .expect_err("Nothing listening");
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn test_health() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"status":"healthy","timestamp":"2024-01-01T00:00:00"}"#,
        );

        let health = client(&url).health().expect("Should be healthy");
        assert!(health.is_healthy());

        let request = server.join().expect("Server thread");
        assert!(request.starts_with("GET /api/health "));
    }

    #[test]
    fn test_batch_rejects_non_csv_locally() {
        let file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("Should create temp file");

        let err = client("http://127.0.0.1:9/api")
            .predict_batch(file.path())
            .expect_err("Not a CSV");
        assert_eq!(err, ApiError::Request("File must be a CSV file".to_string()));
    }

    #[test]
    fn test_batch_uploads_multipart() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("Should create temp file");
        writeln!(file, "age,sex,cp,trestbps,chol,fbs,restecg,thalach,exang,oldpeak,slope,ca,thal")
            .expect("Should write header");
        writeln!(file, "63,1,3,145,233,1,0,150,0,2.3,0,0,1").expect("Should write row");

        let (url, server) = serve_once("200 OK", r#"{"total":1,"predictions":[]}"#);

        let body = client(&url)
            .predict_batch(file.path())
            .expect("Should upload");
        assert_eq!(body["total"], serde_json::json!(1));

        let request = server.join().expect("Server thread");
        assert!(request.starts_with("POST /api/predict/batch "));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("63,1,3,145,233"));
    }
}
