//! TLS policy compilation for host blocks
//!
//! This module turns the already-tokenized `tls` directive of a host block
//! into a validated, immutable [`Configuration`].
//!
//! # Architecture
//!
//! Compilation runs leaf to root:
//!
//! 1. `tables` maps names to protocol, cipher, curve and key type identifiers
//! 2. `options` and `client_auth` resolve each sub-directive's arguments
//! 3. `directive` interprets the leading `tls` arguments
//! 4. `config` accumulates everything in a builder, applies defaults and
//!    cross-field checks, and emits the finished `Configuration`
//!
//! A finished configuration can be handed to OpenSSL through `context`.
//!
//! # Examples
//!
//! ```
//! use tlspolicy::tls::{assemble, HostContext, SubDirective, TlsDirective, TlsVersion};
//!
//! let directive = TlsDirective::new(1, ["admin@example.com"]).with_block(vec![
//!     SubDirective::new(2, "protocols", ["tls1.2"]),
//!     SubDirective::new(3, "alpn", ["h2", "http/1.1"]),
//! ]);
//!
//! let host = HostContext::new("example.com");
//! let config = assemble(&host, &directive).unwrap();
//!
//! assert!(config.enabled());
//! assert!(!config.manual());
//! assert_eq!(config.protocol_min_version(), TlsVersion::Tls12);
//! assert_eq!(config.protocol_max_version(), TlsVersion::Tls12);
//! assert_eq!(config.acme_email(), Some("admin@example.com"));
//! ```

pub mod builtin_cert;
pub mod cert;
pub mod client_auth;
pub mod config;
pub mod context;
pub mod directive;
pub mod options;
pub mod registry;
pub mod tables;

pub use cert::CertInfo;
pub use client_auth::{ClientAuth, ClientAuthPolicy};
pub use config::{
    assemble, CertManagerParams, ConfigBuilder, Configuration, HostContext, OnDemandPolicy,
};
pub use context::ServerContext;
pub use directive::{CertificateSource, SubDirective, TlsDirective};
pub use registry::HostRegistry;
pub use tables::{CipherSuite, Curve, KeyType, TlsVersion, DEFAULT_CURVES, FALLBACK_SENTINEL};

use std::fmt;

/// Result type for TLS policy operations
pub type Result<T> = std::result::Result<T, TlsError>;

/// Which name table a rejected value was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Protocol,
    Cipher,
    Curve,
    KeyType,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Protocol => "protocol",
            ValueKind::Cipher => "cipher",
            ValueKind::Curve => "curve",
            ValueKind::KeyType => "key type",
        })
    }
}

/// TLS policy errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("line {line}: wrong argument count or unexpected line ending after '{directive}'")]
    ArgumentCount { directive: String, line: usize },

    #[error("line {line}: wrong {kind} name or {kind} not supported: '{value}'")]
    UnknownValue {
        kind: ValueKind,
        value: String,
        line: usize,
    },

    #[error("line {line}: unknown subdirective '{name}'")]
    UnknownSubdirective { name: String, line: usize },

    #[error("line {line}: invalid value for '{directive}': {reason}")]
    InvalidValue {
        directive: String,
        reason: String,
        line: usize,
    },

    #[error("line {line}: {reason}")]
    Inconsistent { reason: String, line: usize },

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("Unsupported by the TLS backend: {0}")]
    Unsupported(String),

    #[error("Certificate error: {0}")]
    Certificate(String),
}

impl TlsError {
    pub(crate) fn arity(directive: &str, line: usize) -> Self {
        TlsError::ArgumentCount {
            directive: directive.to_string(),
            line,
        }
    }

    pub(crate) fn unknown(kind: ValueKind, value: &str, line: usize) -> Self {
        TlsError::UnknownValue {
            kind,
            value: value.to_string(),
            line,
        }
    }

    pub(crate) fn invalid(directive: &str, reason: impl Into<String>, line: usize) -> Self {
        TlsError::InvalidValue {
            directive: directive.to_string(),
            reason: reason.into(),
            line,
        }
    }

    /// Source line the error refers to, if it came from the directive text
    pub fn line(&self) -> Option<usize> {
        match self {
            TlsError::ArgumentCount { line, .. }
            | TlsError::UnknownValue { line, .. }
            | TlsError::UnknownSubdirective { line, .. }
            | TlsError::InvalidValue { line, .. }
            | TlsError::Inconsistent { line, .. } => Some(*line),
            TlsError::OpenSsl(_) | TlsError::Certificate(_) | TlsError::Unsupported(_) => None,
        }
    }
}
