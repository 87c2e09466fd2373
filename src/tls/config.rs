//! TLS configuration assembly
//!
//! [`ConfigBuilder`] collects the resolved value of every sub-directive in a
//! local record; [`ConfigBuilder::finish`] applies defaults, checks the
//! cross-field rules and emits the immutable [`Configuration`]. Nothing
//! outside this module ever sees a half-built configuration.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use url::Url;

use super::client_auth::{resolve_client_auth, ClientAuth, ClientAuthPolicy};
use super::directive::{resolve_leading_args, CertificateSource, SubDirective, TlsDirective};
use super::options;
use super::tables::{
    preferred_default_ciphers, CipherSuite, Curve, KeyType, TlsVersion, DEFAULT_CURVES,
    FALLBACK_SENTINEL,
};
use super::{Result, TlsError};

/// Default minimum protocol version
pub const DEFAULT_MIN_VERSION: TlsVersion = TlsVersion::Tls12;

/// Default maximum protocol version
pub const DEFAULT_MAX_VERSION: TlsVersion = TlsVersion::Tls13;

/// On-demand issuance limits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnDemandPolicy {
    /// Maximum number of certificates obtained during the handshake
    pub max_certs: Option<u32>,
    /// Endpoint asked for permission before obtaining a certificate
    pub ask_url: Option<Url>,
}

/// Parameters handed to the certificate manager
///
/// These are set here and never interpreted; issuance happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertManagerParams {
    /// ACME directory URL
    pub ca_url: Option<String>,
    /// ACME account email
    pub email: Option<String>,
    pub key_type: KeyType,
    pub must_staple: bool,
    /// DNS challenge provider name
    pub dns_provider: Option<String>,
    pub on_demand: Option<OnDemandPolicy>,
}

/// Per-host input to assembly
///
/// Replaces a process-wide host lookup: the caller passes in everything
/// assembly needs to know about the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub hostname: String,
    /// Starting certificate manager parameters (e.g. a site-wide CA URL)
    pub cert_manager: CertManagerParams,
}

impl HostContext {
    pub fn new(hostname: impl Into<String>) -> Self {
        HostContext {
            hostname: hostname.into(),
            cert_manager: CertManagerParams::default(),
        }
    }

    /// Use `params` as the starting certificate manager parameters
    pub fn with_cert_manager(mut self, params: CertManagerParams) -> Self {
        self.cert_manager = params;
        self
    }
}

/// Finished TLS configuration for one host (immutable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    hostname: String,
    enabled: bool,
    certificate_source: CertificateSource,
    protocol_min_version: TlsVersion,
    protocol_max_version: TlsVersion,
    ciphers: Vec<CipherSuite>,
    prefer_server_cipher_suites: bool,
    alpn_protocols: Vec<String>,
    curve_preferences: Vec<Curve>,
    client_auth: ClientAuth,
    client_ca_cert_files: Vec<PathBuf>,
    acme_email: Option<String>,
    cert_manager: CertManagerParams,
}

impl Configuration {
    /// Host the configuration applies to (rewritten by `wildcard`)
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// False only when the host opted out with `tls off`
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// True when certificate and key files were given directly
    pub fn manual(&self) -> bool {
        matches!(self.certificate_source, CertificateSource::Files { .. })
    }

    /// True when certificates come from the certificate manager
    pub fn managed(&self) -> bool {
        matches!(self.certificate_source, CertificateSource::Managed)
    }

    pub fn certificate_source(&self) -> &CertificateSource {
        &self.certificate_source
    }

    pub fn protocol_min_version(&self) -> TlsVersion {
        self.protocol_min_version
    }

    pub fn protocol_max_version(&self) -> TlsVersion {
        self.protocol_max_version
    }

    /// Cipher suites in server preference order, sentinel first
    pub fn ciphers(&self) -> &[CipherSuite] {
        &self.ciphers
    }

    pub fn prefer_server_cipher_suites(&self) -> bool {
        self.prefer_server_cipher_suites
    }

    pub fn alpn_protocols(&self) -> &[String] {
        &self.alpn_protocols
    }

    pub fn curve_preferences(&self) -> &[Curve] {
        &self.curve_preferences
    }

    pub fn client_auth(&self) -> ClientAuth {
        self.client_auth
    }

    pub fn client_ca_cert_files(&self) -> &[PathBuf] {
        &self.client_ca_cert_files
    }

    pub fn acme_email(&self) -> Option<&str> {
        self.acme_email.as_deref()
    }

    pub fn cert_manager(&self) -> &CertManagerParams {
        &self.cert_manager
    }

    /// Certificate and key paths in manual mode
    pub fn certificate_files(&self) -> Option<(&Path, &Path)> {
        match &self.certificate_source {
            CertificateSource::Files {
                cert_file,
                key_file,
            } => Some((cert_file.as_path(), key_file.as_path())),
            _ => None,
        }
    }
}

/// Accumulates resolved options for one host
///
/// Only [`ConfigBuilder::finish`] produces a [`Configuration`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    hostname: String,
    enabled: bool,
    certificate_source: CertificateSource,
    acme_email: Option<String>,
    protocols: Option<(TlsVersion, TlsVersion, usize)>,
    ciphers: Option<Vec<CipherSuite>>,
    curves: Option<Vec<Curve>>,
    alpn_protocols: Vec<String>,
    client_auth: ClientAuthPolicy,
    cert_manager: CertManagerParams,
}

impl ConfigBuilder {
    /// Start from the host's context
    pub fn new(host: &HostContext) -> Self {
        ConfigBuilder {
            hostname: host.hostname.clone(),
            enabled: true,
            certificate_source: CertificateSource::Managed,
            acme_email: host.cert_manager.email.clone(),
            protocols: None,
            ciphers: None,
            curves: None,
            alpn_protocols: Vec::new(),
            client_auth: ClientAuthPolicy::default(),
            cert_manager: host.cert_manager.clone(),
        }
    }

    /// Apply the leading arguments of the `tls` directive
    pub fn directive_args(&mut self, directive: &TlsDirective) -> Result<&mut Self> {
        let leading = resolve_leading_args(directive)?;

        self.enabled = leading.enabled;
        self.certificate_source = leading.source;
        if let Some(email) = leading.email {
            self.cert_manager.email = Some(email.clone());
            self.acme_email = Some(email);
        }
        Ok(self)
    }

    /// Apply one sub-directive of the block
    pub fn sub_directive(&mut self, sub: &SubDirective) -> Result<&mut Self> {
        trace!(line = sub.line, name = %sub.name, args = ?sub.args, "Applying TLS sub-directive");

        match sub.name.as_str() {
            "protocols" => {
                let (min, max) = options::resolve_protocols(sub)?;
                self.protocols = Some((min, max, sub.line));
            }
            "ciphers" => {
                let ciphers = options::resolve_ciphers(sub)?;
                self.ciphers.get_or_insert_with(Vec::new).extend(ciphers);
            }
            "curves" => {
                let curves = options::resolve_curves(sub)?;
                let list = self.curves.get_or_insert_with(Vec::new);
                // OpenSSL rejects a group list with duplicates
                for curve in curves {
                    if !list.contains(&curve) {
                        list.push(curve);
                    }
                }
            }
            "clients" => self.client_auth = resolve_client_auth(sub)?,
            "key_type" => self.cert_manager.key_type = options::resolve_key_type(sub)?,
            "ca" => self.cert_manager.ca_url = Some(options::resolve_ca_url(sub)?),
            "alpn" => self.alpn_protocols.extend(options::resolve_alpn(sub)?),
            "must_staple" => self.cert_manager.must_staple = options::resolve_flag(sub)?,
            "dns" => self.cert_manager.dns_provider = Some(options::resolve_dns_provider(sub)?),
            "max_certs" => {
                let max_certs = options::resolve_max_certs(sub)?;
                self.on_demand().max_certs = Some(max_certs);
            }
            "ask" => {
                let ask_url = options::resolve_ask_url(sub)?;
                self.on_demand().ask_url = Some(ask_url);
            }
            "wildcard" => self.hostname = options::resolve_wildcard(sub, &self.hostname)?,
            _ => {
                return Err(TlsError::UnknownSubdirective {
                    name: sub.name.clone(),
                    line: sub.line,
                })
            }
        }
        Ok(self)
    }

    fn on_demand(&mut self) -> &mut OnDemandPolicy {
        self.cert_manager
            .on_demand
            .get_or_insert_with(OnDemandPolicy::default)
    }

    /// Apply defaults, check consistency and emit the configuration
    pub fn finish(self) -> Result<Configuration> {
        let (protocol_min_version, protocol_max_version) = match self.protocols {
            Some((min, max, line)) if min > max => {
                return Err(TlsError::Inconsistent {
                    reason: format!(
                        "minimum protocol version {} cannot be higher than maximum {} (reverse the order)",
                        min, max
                    ),
                    line,
                });
            }
            Some((min, max, _)) => (min, max),
            None => (DEFAULT_MIN_VERSION, DEFAULT_MAX_VERSION),
        };

        let selected = self
            .ciphers
            .unwrap_or_else(|| preferred_default_ciphers().to_vec());
        let mut ciphers = Vec::with_capacity(selected.len() + 1);
        ciphers.push(FALLBACK_SENTINEL);
        ciphers.extend(selected.into_iter().filter(|c| *c != FALLBACK_SENTINEL));

        let curve_preferences = self.curves.unwrap_or_else(|| DEFAULT_CURVES.to_vec());

        let config = Configuration {
            hostname: self.hostname,
            enabled: self.enabled,
            certificate_source: self.certificate_source,
            protocol_min_version,
            protocol_max_version,
            ciphers,
            prefer_server_cipher_suites: true,
            alpn_protocols: self.alpn_protocols,
            curve_preferences,
            client_auth: self.client_auth.mode,
            client_ca_cert_files: self.client_auth.ca_files,
            acme_email: self.acme_email,
            cert_manager: self.cert_manager,
        };

        debug!(
            hostname = %config.hostname,
            enabled = config.enabled,
            manual = config.manual(),
            min_version = %config.protocol_min_version,
            max_version = %config.protocol_max_version,
            ciphers = config.ciphers.len(),
            curves = config.curve_preferences.len(),
            client_auth = ?config.client_auth,
            "Assembled TLS configuration"
        );

        Ok(config)
    }
}

/// Compile a host's `tls` directive into its configuration
///
/// Stops at the first error; no partially applied configuration is
/// returned.
pub fn assemble(host: &HostContext, directive: &TlsDirective) -> Result<Configuration> {
    trace!(hostname = %host.hostname, line = directive.line, "Assembling TLS configuration");

    let mut builder = ConfigBuilder::new(host);
    builder.directive_args(directive)?;
    for sub in directive.sub_directives() {
        builder.sub_directive(sub)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostContext {
        HostContext::new("www.example.com")
    }

    fn block(subs: Vec<SubDirective>) -> TlsDirective {
        TlsDirective::new(1, Vec::<String>::new()).with_block(subs)
    }

    #[test]
    fn test_defaults() {
        let config = assemble(&host(), &TlsDirective::new(1, ["cert.pem", "key.pem"])).unwrap();

        assert!(config.enabled());
        assert!(config.manual());
        assert_eq!(config.protocol_min_version(), TlsVersion::Tls12);
        assert_eq!(config.protocol_max_version(), TlsVersion::Tls13);
        assert_eq!(config.ciphers()[0], FALLBACK_SENTINEL);
        assert_eq!(&config.ciphers()[1..], preferred_default_ciphers());
        assert!(config.prefer_server_cipher_suites());
        assert!(config.alpn_protocols().is_empty());
        assert_eq!(config.curve_preferences(), &DEFAULT_CURVES);
        assert_eq!(config.client_auth(), ClientAuth::None);
        assert!(config.client_ca_cert_files().is_empty());
        assert_eq!(config.cert_manager().key_type, KeyType::Ec256);
    }

    #[test]
    fn test_reversed_protocols_rejected() {
        let err = assemble(
            &host(),
            &block(vec![SubDirective::new(2, "protocols", ["tls1.3", "tls1.0"])]),
        )
        .unwrap_err();
        assert!(matches!(err, TlsError::Inconsistent { line: 2, .. }));
    }

    #[test]
    fn test_order_of_sub_directives_is_irrelevant() {
        let a = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "curves", ["p384"]),
                SubDirective::new(3, "protocols", ["tls1.2", "tls1.3"]),
                SubDirective::new(4, "key_type", ["rsa2048"]),
            ]),
        )
        .unwrap();
        let b = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "key_type", ["rsa2048"]),
                SubDirective::new(3, "curves", ["p384"]),
                SubDirective::new(4, "protocols", ["tls1.2", "tls1.3"]),
            ]),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_repeated_lists_append() {
        let config = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "ciphers", ["RSA-AES128-CBC-SHA"]),
                SubDirective::new(3, "alpn", ["h2"]),
                SubDirective::new(4, "ciphers", ["RSA-AES256-CBC-SHA"]),
                SubDirective::new(5, "alpn", ["http/1.1"]),
            ]),
        )
        .unwrap();
        assert_eq!(
            config.ciphers(),
            &[
                FALLBACK_SENTINEL,
                CipherSuite::RsaAes128CbcSha,
                CipherSuite::RsaAes256CbcSha
            ]
        );
        assert_eq!(config.alpn_protocols(), &["h2", "http/1.1"]);
    }

    #[test]
    fn test_first_error_wins() {
        let err = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "ciphers", ["bogus"]),
                SubDirective::new(3, "key_type", ["bogus"]),
            ]),
        )
        .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_unknown_sub_directive() {
        let err = assemble(&host(), &block(vec![SubDirective::flag(2, "hsts")])).unwrap_err();
        assert_eq!(err.to_string(), "line 2: unknown subdirective 'hsts'");
    }

    #[test]
    fn test_host_context_defaults_carried() {
        let host = host().with_cert_manager(CertManagerParams {
            ca_url: Some("https://ca.internal/directory".to_string()),
            key_type: KeyType::Rsa4096,
            ..Default::default()
        });
        let config = assemble(&host, &TlsDirective::new(1, ["ops@example.com"])).unwrap();
        assert_eq!(
            config.cert_manager().ca_url.as_deref(),
            Some("https://ca.internal/directory")
        );
        assert_eq!(config.cert_manager().key_type, KeyType::Rsa4096);
        assert_eq!(config.cert_manager().email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.acme_email(), Some("ops@example.com"));
    }

    #[test]
    fn test_host_context_email_without_directive_email() {
        let host = host().with_cert_manager(CertManagerParams {
            email: Some("site@example.com".to_string()),
            ..Default::default()
        });
        let config = assemble(&host, &block(vec![SubDirective::new(2, "key_type", ["p384"])]))
            .unwrap();
        assert_eq!(config.acme_email(), Some("site@example.com"));
        assert_eq!(config.cert_manager().email.as_deref(), Some("site@example.com"));
    }

    #[test]
    fn test_repeated_curves_deduplicated() {
        let config = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "curves", ["p256", "p256"]),
                SubDirective::new(3, "curves", ["x25519", "p256"]),
            ]),
        )
        .unwrap();
        assert_eq!(config.curve_preferences(), &[Curve::P256, Curve::X25519]);
    }

    #[test]
    fn test_on_demand_and_dns() {
        let config = assemble(
            &host(),
            &block(vec![
                SubDirective::new(2, "max_certs", ["25"]),
                SubDirective::new(3, "ask", ["http://localhost:9123/allowed"]),
                SubDirective::new(4, "dns", ["cloudflare"]),
            ]),
        )
        .unwrap();
        let params = config.cert_manager();
        let on_demand = params.on_demand.as_ref().unwrap();
        assert_eq!(on_demand.max_certs, Some(25));
        assert_eq!(
            on_demand.ask_url.as_ref().map(Url::as_str),
            Some("http://localhost:9123/allowed")
        );
        assert_eq!(params.dns_provider.as_deref(), Some("cloudflare"));
    }

    #[test]
    fn test_wildcard_rewrites_hostname() {
        let config = assemble(&host(), &block(vec![SubDirective::flag(2, "wildcard")])).unwrap();
        assert_eq!(config.hostname(), "*.example.com");
    }

    #[test]
    fn test_off_still_validates_block() {
        let config = assemble(&host(), &TlsDirective::new(1, ["off"])).unwrap();
        assert!(!config.enabled());

        let bad = TlsDirective::new(1, ["off"])
            .with_block(vec![SubDirective::new(2, "curves", ["p999"])]);
        assert!(assemble(&host(), &bad).is_err());
    }
}
