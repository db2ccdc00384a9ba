//! User-input validation for provisioning commands
//!
//! Acceptance is regular-expression based. Each failure variant carries
//! the corrective message shown back to the user; nothing here
//! propagates as a crash.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static HOSTNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

static IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .unwrap()
});

// The pattern admits up to five digits; the numeric range is checked
// separately after the match.
static IP_PORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?):([0-9]{1,5})$")
        .unwrap()
});

/// Rejection of a user-supplied value; the display text is user-facing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidateError {
    #[error("Invalid hostname. Ensure it is one word and does not contain special characters.")]
    Hostname,

    #[error("Invalid `IP` format. Ensure it's a valid IP address e.g. `100.64.0.1`")]
    Ipv4,

    #[error("Invalid `IP:Port` format. Ensure it's a valid IP address, followed by a port number e.g. `100.64.0.1:80`")]
    IpPort,

    #[error("Invalid port number. Ensure it's between `1` and `65535`.")]
    PortRange,
}

/// Validate a subdomain label: letters, digits, and hyphens only
pub fn hostname(s: &str) -> Result<(), ValidateError> {
    if HOSTNAME.is_match(s) {
        Ok(())
    } else {
        Err(ValidateError::Hostname)
    }
}

/// Validate a strict dotted-quad IPv4 address
pub fn ipv4(s: &str) -> Result<(), ValidateError> {
    if IPV4.is_match(s) {
        Ok(())
    } else {
        Err(ValidateError::Ipv4)
    }
}

/// Validate an `ip:port` pair; the port is range-checked to 1-65535
/// after the pattern match
pub fn ip_port(s: &str) -> Result<(), ValidateError> {
    let captures = IP_PORT.captures(s).ok_or(ValidateError::IpPort)?;
    let port: u32 = captures[1].parse().map_err(|_| ValidateError::IpPort)?;
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(ValidateError::PortRange)
    }
}
