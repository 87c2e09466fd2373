//! Client certificate authentication
//!
//! Resolves `clients [request|require|verify_if_given] [<ca-file>...]` into
//! a verification mode and the list of trusted client CA bundles.

use std::path::PathBuf;

use openssl::ssl::SslVerifyMode;

use super::directive::SubDirective;
use super::{Result, TlsError};

/// Client certificate policy (server-side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuth {
    /// Don't request client certificates
    #[default]
    None,
    /// Request a certificate, accept the connection either way
    Request,
    /// Require a certificate, don't verify it
    RequireAny,
    /// Require a certificate and verify it against the client CAs
    RequireAndVerify,
    /// Verify a certificate only if the client sends one
    VerifyIfGiven,
}

impl ClientAuth {
    /// OpenSSL verification flags for this mode
    pub fn verify_mode(&self) -> SslVerifyMode {
        match self {
            ClientAuth::None => SslVerifyMode::NONE,
            ClientAuth::Request | ClientAuth::VerifyIfGiven => SslVerifyMode::PEER,
            ClientAuth::RequireAny | ClientAuth::RequireAndVerify => {
                SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT
            }
        }
    }

    /// Whether the presented chain is checked against the client CAs
    pub fn verifies_chain(&self) -> bool {
        matches!(self, ClientAuth::RequireAndVerify | ClientAuth::VerifyIfGiven)
    }
}

/// Resolved `clients` sub-directive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientAuthPolicy {
    pub mode: ClientAuth,
    pub ca_files: Vec<PathBuf>,
}

/// Resolve the arguments of `clients`
pub fn resolve_client_auth(sub: &SubDirective) -> Result<ClientAuthPolicy> {
    let (first, rest) = sub.args.split_first().ok_or_else(|| sub.arity_error())?;

    let (mode, ca_files, needs_ca) = match first.as_str() {
        "request" => (ClientAuth::Request, rest, false),
        "require" => (ClientAuth::RequireAny, rest, false),
        "verify_if_given" => (ClientAuth::VerifyIfGiven, rest, true),
        // no modifier: every argument is a CA bundle
        _ => (ClientAuth::RequireAndVerify, sub.args.as_slice(), true),
    };

    if needs_ca && ca_files.is_empty() {
        return Err(TlsError::Inconsistent {
            reason: format!("client auth mode '{}' needs at least one CA file", first),
            line: sub.line,
        });
    }

    Ok(ClientAuthPolicy {
        mode,
        ca_files: ca_files.iter().map(PathBuf::from).collect(),
    })
}
