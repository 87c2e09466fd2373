//! OpenSSL server context from a finished configuration
//!
//! This is the hand-off to the handshake layer: protocol bounds, cipher
//! order, groups, ALPN, client verification and (for manual and
//! self-signed hosts) the certificate are installed on an `SslContext`.
//! Managed hosts get a context without a certificate; the certificate
//! manager supplies one later.

use std::path::{Path, PathBuf};

use openssl::ssl::{
    AlpnError, SslContext, SslContextBuilder, SslFiletype, SslMethod, SslOptions, SslVersion,
};
use tracing::{debug, trace};

use super::builtin_cert;
use super::cert::CertInfo;
use super::client_auth::ClientAuth;
use super::config::Configuration;
use super::directive::CertificateSource;
use super::tables::TlsVersion;
use super::{Result, TlsError};

/// Server-side OpenSSL context for one host (immutable after building)
#[derive(Clone)]
pub struct ServerContext {
    ctx: SslContext,
    certificate: Option<CertInfo>,
    min_version: Option<SslVersion>,
    max_version: Option<SslVersion>,
}

impl ServerContext {
    /// Build the context described by `config`
    pub fn from_config(config: &Configuration) -> Result<Self> {
        if !config.enabled() {
            return Err(TlsError::Certificate(format!(
                "TLS is disabled for host '{}'",
                config.hostname()
            )));
        }

        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_server())?;

        ctx_builder.set_min_proto_version(Some(config.protocol_min_version().to_openssl_version()))?;
        ctx_builder.set_max_proto_version(Some(config.protocol_max_version().to_openssl_version()))?;

        set_ciphers(&mut ctx_builder, config)?;
        set_groups(&mut ctx_builder, config)?;

        if !config.alpn_protocols().is_empty() {
            set_alpn(&mut ctx_builder, config.alpn_protocols());
        }

        set_client_verify(&mut ctx_builder, config.client_auth(), config.client_ca_cert_files())?;

        let has_cert = match config.certificate_source() {
            CertificateSource::Files {
                cert_file,
                key_file,
            } => {
                load_cert_files(&mut ctx_builder, cert_file, key_file)?;
                true
            }
            CertificateSource::SelfSigned => {
                let cert = builtin_cert::certificate()?;
                let key = builtin_cert::private_key()?;
                ctx_builder.set_certificate(&cert)?;
                ctx_builder.set_private_key(&key)?;
                true
            }
            CertificateSource::Managed => false,
        };

        if has_cert {
            ctx_builder.check_private_key().map_err(|e| {
                TlsError::Certificate(format!("Certificate and private key do not match: {}", e))
            })?;
        }

        let min_version = ctx_builder.min_proto_version();
        let max_version = ctx_builder.max_proto_version();
        let ctx = ctx_builder.build();
        let certificate = ctx.certificate().map(CertInfo::from_x509);

        debug!(
            hostname = %config.hostname(),
            certificate = ?certificate.as_ref().map(|c| c.subject.as_str()),
            "Built OpenSSL server context"
        );

        Ok(ServerContext {
            ctx,
            certificate,
            min_version,
            max_version,
        })
    }

    /// The underlying OpenSSL context
    pub fn ssl_context(&self) -> &SslContext {
        &self.ctx
    }

    /// Certificate the context presents, if one is installed
    pub fn certificate(&self) -> Option<&CertInfo> {
        self.certificate.as_ref()
    }

    /// Minimum protocol version as OpenSSL accepted it
    pub fn min_proto_version(&self) -> Option<SslVersion> {
        self.min_version
    }

    /// Maximum protocol version as OpenSSL accepted it
    pub fn max_proto_version(&self) -> Option<SslVersion> {
        self.max_version
    }
}

/// Cipher list for TLS <= 1.2; the fallback sentinel has no OpenSSL name
///
/// Legacy suites and pre-1.2 protocols only work at security level 0 on
/// OpenSSL 3, so the level is lowered when the configuration asks for them.
fn set_ciphers(ctx_builder: &mut SslContextBuilder, config: &Configuration) -> Result<()> {
    let names: Vec<&str> = config
        .ciphers()
        .iter()
        .filter_map(|c| c.openssl_name())
        .collect();

    let legacy = config.protocol_min_version() < TlsVersion::Tls12
        || config.ciphers().iter().any(|c| c.is_legacy());

    if !names.is_empty() || legacy {
        let mut list = if names.is_empty() {
            "DEFAULT".to_string()
        } else {
            names.join(":")
        };
        if legacy {
            list.push_str(":@SECLEVEL=0");
        }
        trace!(ciphers = %list, "Setting cipher list");
        ctx_builder.set_cipher_list(&list).map_err(|e| {
            TlsError::Unsupported(format!(
                "OpenSSL accepts none of the ciphers {}: {}",
                names.join(", "),
                e
            ))
        })?;
    }
    if config.prefer_server_cipher_suites() {
        ctx_builder.set_options(SslOptions::CIPHER_SERVER_PREFERENCE);
    }
    Ok(())
}

fn set_groups(ctx_builder: &mut SslContextBuilder, config: &Configuration) -> Result<()> {
    let groups: Vec<&str> = config
        .curve_preferences()
        .iter()
        .map(|c| c.openssl_group())
        .collect();
    ctx_builder.set_groups_list(&groups.join(":"))?;
    Ok(())
}

/// Select the first server protocol the client also offers
fn set_alpn(ctx_builder: &mut SslContextBuilder, protocols: &[String]) {
    let protocols_vec: Vec<Vec<u8>> = protocols.iter().map(|p| p.as_bytes().to_vec()).collect();

    ctx_builder.set_alpn_select_callback(move |_ssl, client_protos| {
        for proto in &protocols_vec {
            // client list is length-prefixed
            let mut pos = 0;
            while pos < client_protos.len() {
                let len = client_protos[pos] as usize;
                pos += 1;
                if pos + len > client_protos.len() {
                    break;
                }
                let client_proto = &client_protos[pos..pos + len];
                if client_proto == proto.as_slice() {
                    return Ok(client_proto);
                }
                pos += len;
            }
        }

        Err(AlpnError::NOACK)
    });
}

fn set_client_verify(
    ctx_builder: &mut SslContextBuilder,
    mode: ClientAuth,
    ca_files: &[PathBuf],
) -> Result<()> {
    match mode {
        // take whatever the client presents
        ClientAuth::Request | ClientAuth::RequireAny => {
            ctx_builder.set_verify_callback(mode.verify_mode(), |_preverify, _store| true)
        }
        _ => ctx_builder.set_verify(mode.verify_mode()),
    }

    for ca_file in ca_files {
        ctx_builder.set_ca_file(ca_file).map_err(|e| {
            TlsError::Certificate(format!(
                "Failed to load client CA file {}: {}",
                ca_file.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn load_cert_files(
    ctx_builder: &mut SslContextBuilder,
    cert_file: &Path,
    key_file: &Path,
) -> Result<()> {
    ctx_builder.set_certificate_chain_file(cert_file).map_err(|e| {
        TlsError::Certificate(format!(
            "Failed to load certificate {}: {}",
            cert_file.display(),
            e
        ))
    })?;
    ctx_builder
        .set_private_key_file(key_file, SslFiletype::PEM)
        .map_err(|e| {
            TlsError::Certificate(format!(
                "Failed to load private key {}: {}",
                key_file.display(),
                e
            ))
        })?;
    Ok(())
}
