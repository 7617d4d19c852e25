use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection details for one camera in COHN mode.
///
/// Loaded once from the device file and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    ip_address: String,
    username: String,
    password: String,
    /// PEM certificate issued by the camera. Empty means self-signed tolerance.
    #[serde(default)]
    certificate: String,
    /// Overrides `https://{ip_address}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

impl DeviceEndpoint {
    pub fn new(
        ip_address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            ip_address: ip_address.into(),
            username: username.into(),
            password: password.into(),
            certificate: String::new(),
            base_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.certificate = certificate.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Identifier used in logs, outcomes and alerts. Falls back to the IP address.
    pub fn id(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.ip_address)
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// PEM trust material, if the camera issued one.
    pub fn certificate(&self) -> Option<&str> {
        let cert = self.certificate.trim();
        (!cert.is_empty()).then_some(cert)
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.ip_address),
        }
    }

    /// Name of this device's directory under the download root (`192_168_1_10`).
    pub fn local_dir_name(&self) -> String {
        self.ip_address.replace(['.', ':'], "_")
    }
}

impl fmt::Debug for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceEndpoint")
            .field("name", &self.name)
            .field("ip_address", &self.ip_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("has_certificate", &self.certificate().is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}
