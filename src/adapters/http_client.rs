//! HTTP delivery adapter.
//!
//! Implements [`DeliveryPort`]: one blocking JSON POST per call, bounded by
//! the configured timeout.  Any HTTP status is reported back as
//! [`DeliveryOutcome::Responded`]; only transport failures become
//! [`DeliveryOutcome::Failed`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`,
//!   a fresh connection per POST.
//! - **all other targets**: `reqwest` blocking client.

use log::debug;

use crate::app::ports::{DeliveryOutcome, DeliveryPort};
#[cfg(not(target_os = "espidf"))]
use crate::error::{CommsError, Error};
#[cfg(target_os = "espidf")]
use crate::error::CommsError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub struct HttpDeliveryClient {
    #[cfg(not(target_os = "espidf"))]
    client: reqwest::blocking::Client,
    #[cfg(target_os = "espidf")]
    timeout: core::time::Duration,
}

impl HttpDeliveryClient {
    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout_ms: u32) -> crate::error::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(u64::from(timeout_ms)))
            .build()
            .map_err(|e| {
                log::error!("HTTP: client init failed: {}", e);
                Error::Comms(CommsError::HttpClientInit)
            })?;
        Ok(Self { client })
    }

    #[cfg(target_os = "espidf")]
    pub fn new(timeout_ms: u32) -> crate::error::Result<Self> {
        Ok(Self {
            timeout: core::time::Duration::from_millis(u64::from(timeout_ms)),
        })
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(&mut self, url: &str, body: &str) -> Result<u16, CommsError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body.to_owned())
            .send()
            .map_err(|e| {
                debug!("HTTP: POST {} error: {}", url, e);
                if e.is_timeout() {
                    CommsError::HttpTimeout
                } else if e.is_connect() {
                    CommsError::HttpConnectFailed
                } else {
                    CommsError::HttpRequestFailed
                }
            })?;
        Ok(response.status().as_u16())
    }

    #[cfg(target_os = "espidf")]
    fn platform_post(&mut self, url: &str, body: &str) -> Result<u16, CommsError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            ..Default::default()
        })
        .map_err(|e| {
            log::error!("HTTP(espidf): connection init failed: {}", e);
            CommsError::HttpClientInit
        })?;

        let len = body.len().to_string();
        let headers = [("Content-Type", CONTENT_TYPE_JSON), ("Content-Length", len.as_str())];
        conn.initiate_request(Method::Post, url, &headers).map_err(|e| {
            debug!("HTTP(espidf): connect {} failed: {}", url, e);
            CommsError::HttpConnectFailed
        })?;

        let mut rest = body.as_bytes();
        while !rest.is_empty() {
            let n = conn.write(rest).map_err(|e| {
                debug!("HTTP(espidf): write failed: {}", e);
                CommsError::HttpRequestFailed
            })?;
            if n == 0 {
                return Err(CommsError::HttpRequestFailed);
            }
            rest = &rest[n..];
        }

        conn.initiate_response().map_err(|e| {
            debug!("HTTP(espidf): no response: {}", e);
            if e.code() == esp_idf_svc::sys::ESP_ERR_TIMEOUT as i32 {
                CommsError::HttpTimeout
            } else {
                CommsError::HttpRequestFailed
            }
        })?;
        Ok(conn.status())
    }
}

impl DeliveryPort for HttpDeliveryClient {
    fn post_json(&mut self, url: &str, body: &str) -> DeliveryOutcome {
        match self.platform_post(url, body) {
            Ok(status) => {
                debug!("HTTP: POST {} -> {}", url, status);
                DeliveryOutcome::Responded(status)
            }
            Err(e) => DeliveryOutcome::Failed(e),
        }
    }
}
