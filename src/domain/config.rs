//! Configuration and identity types for a construct run.
//!
//! Pure data — no I/O, no async, no filesystem access.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::ConfigError;

// ── Identity types ────────────────────────────────────────────────────────────

/// Credentials for authenticating inside the guest OS.
///
/// The `Debug` impl redacts the password so credentials never reach logs or
/// error chains verbatim.
#[derive(Clone)]
pub struct GuestCredentials {
    pub username: String,
    pub password: String,
}

impl GuestCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for GuestCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque handle to a VM located in the vCenter inventory.
///
/// Produced by `Hypervisor::find_vm` and passed through every stage
/// unchanged; nothing in the core inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmHandle(String);

impl VmHandle {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Source configuration ──────────────────────────────────────────────────────

/// Everything `stemprep construct` needs to reach vCenter and the guest.
///
/// Built once from CLI flags at command entry and never persisted.
#[derive(Clone)]
pub struct SourceConfig {
    pub vcenter_url: String,
    pub vcenter_username: String,
    pub vcenter_password: String,
    /// Optional CA bundle for the vCenter TLS endpoint.
    pub ca_cert_file: Option<PathBuf>,
    /// Full inventory path of the target VM, e.g. `/dc/vm/folder/vm-name`.
    pub vm_inventory_path: String,
    /// IP address the guest's WinRM endpoint listens on.
    pub guest_ip: String,
    pub guest_credentials: GuestCredentials,
}

impl SourceConfig {
    /// Reject configurations with empty required fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::MissingField`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("vcenter-url", &self.vcenter_url),
            ("vcenter-username", &self.vcenter_username),
            ("vcenter-password", &self.vcenter_password),
            ("vm-inventory-path", &self.vm_inventory_path),
            ("vm-ip", &self.guest_ip),
            ("vm-username", &self.guest_credentials.username),
            ("vm-password", &self.guest_credentials.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("vcenter_url", &self.vcenter_url)
            .field("vcenter_username", &self.vcenter_username)
            .field("vcenter_password", &"<redacted>")
            .field("ca_cert_file", &self.ca_cert_file)
            .field("vm_inventory_path", &self.vm_inventory_path)
            .field("guest_ip", &self.guest_ip)
            .field("guest_credentials", &self.guest_credentials)
            .finish()
    }
}

// ── Poll configuration ────────────────────────────────────────────────────────

/// Interval/timeout pair for the shutdown wait loop.
///
/// The interval must be non-zero and the timeout must be at least one
/// interval, so the loop always makes progress and the deadline is
/// meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    timeout: Duration,
}

impl PollConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the interval is zero or the timeout is
    /// shorter than the interval.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if timeout < interval {
            return Err(ConfigError::TimeoutShorterThanInterval { interval, timeout });
        }
        Ok(Self { interval, timeout })
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
