//! HTTP telemetry reporter.
//!
//! Implements [`ReportPort`] as a plain-HTTP GET:
//!
//! ```text
//! http://<host>:<port><path>?statusCode=<200|500>&info=<percent-encoded>
//! ```
//!
//! One connection per report, no retries.  Any HTTP status counts as
//! delivered and is returned to the caller; only transport failures are
//! errors.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` blocking client.
//! - **all other targets**: `ureq`, so the reporter can be pointed at a
//!   local server during host runs.

use core::fmt::Write;

use log::debug;

use crate::app::ports::{ReportError, ReportPort, ReportStatus};
use crate::config::SystemConfig;

/// Longest request URL the reporter will send.
pub const MAX_URL_LEN: usize = 512;

pub struct HttpReporter {
    host: heapless::String<64>,
    port: u16,
    path: heapless::String<64>,
    timeout_ms: u32,
}

impl HttpReporter {
    pub fn new(host: &str, port: u16, path: &str, timeout_ms: u32) -> Self {
        let mut h = heapless::String::new();
        let mut p = heapless::String::new();
        // Both fields come from validated config of the same capacity.
        let _ = h.push_str(host);
        let _ = p.push_str(path);
        Self {
            host: h,
            port,
            path: p,
            timeout_ms,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            &config.report_host,
            config.report_port,
            &config.report_path,
            config.report_timeout_ms,
        )
    }

    /// Full request URL for one report.
    pub fn url(&self, status: ReportStatus, info: &str) -> Result<String, ReportError> {
        let mut url = String::with_capacity(96 + info.len() * 3);
        // Writing to a String cannot fail.
        let _ = write!(
            url,
            "http://{}:{}{}?statusCode={}&info={}",
            self.host,
            self.port,
            self.path,
            status.code(),
            urlencoding::encode(info),
        );
        if url.len() > MAX_URL_LEN {
            return Err(ReportError::UrlTooLong);
        }
        Ok(url)
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, url: &str) -> Result<u16, ReportError> {
        use embedded_svc::http::client::Client;
        use embedded_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::EspIOError;
        use esp_idf_svc::sys::{ESP_ERR_HTTP_CONNECT, ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT};

        fn classify(e: EspIOError) -> ReportError {
            let code = e.0.code();
            if code == ESP_ERR_HTTP_CONNECT as i32 {
                ReportError::Connect
            } else if code == ESP_ERR_HTTP_EAGAIN as i32 || code == ESP_ERR_TIMEOUT as i32 {
                ReportError::Timeout
            } else {
                ReportError::Transport
            }
        }

        let config = Configuration {
            timeout: Some(core::time::Duration::from_millis(u64::from(self.timeout_ms))),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(|e| classify(e.into()))?;
        let mut client = Client::wrap(connection);
        let response = client
            .request(Method::Get, url, &[])
            .map_err(classify)?
            .submit()
            .map_err(classify)?;
        Ok(response.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, url: &str) -> Result<u16, ReportError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_millis(u64::from(self.timeout_ms)))
            .build();
        match agent.get(url).call() {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(t)) => Err(match t.kind() {
                ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed => ReportError::Connect,
                ureq::ErrorKind::Io if is_timeout(&t) => ReportError::Timeout,
                _ => ReportError::Transport,
            }),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn is_timeout(t: &ureq::Transport) -> bool {
    std::error::Error::source(t)
        .and_then(|s| s.downcast_ref::<std::io::Error>())
        .is_some_and(|io| matches!(io.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock))
}

impl ReportPort for HttpReporter {
    fn report(&mut self, status: ReportStatus, info: &str) -> Result<u16, ReportError> {
        let url = self.url(status, info)?;
        debug!("HTTP GET {}", url);
        self.get(&url)
    }
}
