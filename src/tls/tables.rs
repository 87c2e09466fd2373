//! Name tables for TLS policy values
//!
//! Closed mappings from the names accepted in a `tls` block to protocol,
//! cipher suite, curve and key type identifiers, plus the canonical
//! default cipher and curve lists.

use std::fmt;

/// TLS protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Look up a protocol name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "tls1.0" => Some(TlsVersion::Tls10),
            "tls1.1" => Some(TlsVersion::Tls11),
            "tls1.2" => Some(TlsVersion::Tls12),
            "tls1.3" => Some(TlsVersion::Tls13),
            _ => None,
        }
    }

    /// Wire version number (0x0301 for TLS 1.0)
    pub fn wire_version(&self) -> u16 {
        match self {
            TlsVersion::Tls10 => 0x0301,
            TlsVersion::Tls11 => 0x0302,
            TlsVersion::Tls12 => 0x0303,
            TlsVersion::Tls13 => 0x0304,
        }
    }

    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> openssl::ssl::SslVersion {
        use openssl::ssl::SslVersion;
        match self {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Get version as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "tls1.0",
            TlsVersion::Tls11 => "tls1.1",
            TlsVersion::Tls12 => "tls1.2",
            TlsVersion::Tls13 => "tls1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cipher suite, identified by its IANA code point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    /// Downgrade-protection signalling value; never negotiated
    FallbackScsv,
    EcdheEcdsaAes256GcmSha384,
    EcdheRsaAes256GcmSha384,
    EcdheEcdsaAes128GcmSha256,
    EcdheRsaAes128GcmSha256,
    EcdheEcdsaChacha20Poly1305,
    EcdheRsaChacha20Poly1305,
    EcdheRsaAes256CbcSha,
    EcdheRsaAes128CbcSha,
    EcdheEcdsaAes256CbcSha,
    EcdheEcdsaAes128CbcSha,
    RsaAes128GcmSha256,
    RsaAes256GcmSha384,
    RsaAes128CbcSha,
    RsaAes256CbcSha,
    EcdheRsa3desEdeCbcSha,
    Rsa3desEdeCbcSha,
}

impl CipherSuite {
    /// Look up a cipher name (case-insensitive).
    ///
    /// The fallback sentinel has no name and cannot be selected here.
    pub fn from_name(name: &str) -> Option<Self> {
        use CipherSuite::*;
        match name.to_ascii_uppercase().as_str() {
            "ECDHE-ECDSA-AES256-GCM-SHA384" => Some(EcdheEcdsaAes256GcmSha384),
            "ECDHE-RSA-AES256-GCM-SHA384" => Some(EcdheRsaAes256GcmSha384),
            "ECDHE-ECDSA-AES128-GCM-SHA256" => Some(EcdheEcdsaAes128GcmSha256),
            "ECDHE-RSA-AES128-GCM-SHA256" => Some(EcdheRsaAes128GcmSha256),
            "ECDHE-ECDSA-WITH-CHACHA20-POLY1305" => Some(EcdheEcdsaChacha20Poly1305),
            "ECDHE-RSA-WITH-CHACHA20-POLY1305" => Some(EcdheRsaChacha20Poly1305),
            "ECDHE-RSA-AES256-CBC-SHA" => Some(EcdheRsaAes256CbcSha),
            "ECDHE-RSA-AES128-CBC-SHA" => Some(EcdheRsaAes128CbcSha),
            "ECDHE-ECDSA-AES256-CBC-SHA" => Some(EcdheEcdsaAes256CbcSha),
            "ECDHE-ECDSA-AES128-CBC-SHA" => Some(EcdheEcdsaAes128CbcSha),
            "RSA-AES128-GCM-SHA256" => Some(RsaAes128GcmSha256),
            "RSA-AES256-GCM-SHA384" => Some(RsaAes256GcmSha384),
            "RSA-AES128-CBC-SHA" => Some(RsaAes128CbcSha),
            "RSA-AES256-CBC-SHA" => Some(RsaAes256CbcSha),
            "ECDHE-RSA-3DES-EDE-CBC-SHA" => Some(EcdheRsa3desEdeCbcSha),
            "RSA-3DES-EDE-CBC-SHA" => Some(Rsa3desEdeCbcSha),
            _ => None,
        }
    }

    /// IANA cipher suite identifier
    pub fn id(&self) -> u16 {
        use CipherSuite::*;
        match self {
            FallbackScsv => 0x5600,
            EcdheEcdsaAes256GcmSha384 => 0xc02c,
            EcdheRsaAes256GcmSha384 => 0xc030,
            EcdheEcdsaAes128GcmSha256 => 0xc02b,
            EcdheRsaAes128GcmSha256 => 0xc02f,
            EcdheEcdsaChacha20Poly1305 => 0xcca9,
            EcdheRsaChacha20Poly1305 => 0xcca8,
            EcdheRsaAes256CbcSha => 0xc014,
            EcdheRsaAes128CbcSha => 0xc013,
            EcdheEcdsaAes256CbcSha => 0xc00a,
            EcdheEcdsaAes128CbcSha => 0xc009,
            RsaAes128GcmSha256 => 0x009c,
            RsaAes256GcmSha384 => 0x009d,
            RsaAes128CbcSha => 0x002f,
            RsaAes256CbcSha => 0x0035,
            EcdheRsa3desEdeCbcSha => 0xc012,
            Rsa3desEdeCbcSha => 0x000a,
        }
    }

    /// OpenSSL cipher string name, `None` for the sentinel
    pub fn openssl_name(&self) -> Option<&'static str> {
        use CipherSuite::*;
        let name = match self {
            FallbackScsv => return None,
            EcdheEcdsaAes256GcmSha384 => "ECDHE-ECDSA-AES256-GCM-SHA384",
            EcdheRsaAes256GcmSha384 => "ECDHE-RSA-AES256-GCM-SHA384",
            EcdheEcdsaAes128GcmSha256 => "ECDHE-ECDSA-AES128-GCM-SHA256",
            EcdheRsaAes128GcmSha256 => "ECDHE-RSA-AES128-GCM-SHA256",
            EcdheEcdsaChacha20Poly1305 => "ECDHE-ECDSA-CHACHA20-POLY1305",
            EcdheRsaChacha20Poly1305 => "ECDHE-RSA-CHACHA20-POLY1305",
            EcdheRsaAes256CbcSha => "ECDHE-RSA-AES256-SHA",
            EcdheRsaAes128CbcSha => "ECDHE-RSA-AES128-SHA",
            EcdheEcdsaAes256CbcSha => "ECDHE-ECDSA-AES256-SHA",
            EcdheEcdsaAes128CbcSha => "ECDHE-ECDSA-AES128-SHA",
            RsaAes128GcmSha256 => "AES128-GCM-SHA256",
            RsaAes256GcmSha384 => "AES256-GCM-SHA384",
            RsaAes128CbcSha => "AES128-SHA",
            RsaAes256CbcSha => "AES256-SHA",
            EcdheRsa3desEdeCbcSha => "ECDHE-RSA-DES-CBC3-SHA",
            Rsa3desEdeCbcSha => "DES-CBC3-SHA",
        };
        Some(name)
    }

    /// 3DES suites, refused by OpenSSL 3 at its default security level
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            CipherSuite::EcdheRsa3desEdeCbcSha | CipherSuite::Rsa3desEdeCbcSha
        )
    }
}

/// Placed first in every non-empty resolved cipher list
pub const FALLBACK_SENTINEL: CipherSuite = CipherSuite::FallbackScsv;

/// Default ciphers when the CPU accelerates AES
const DEFAULT_CIPHERS_AES_HW: [CipherSuite; 12] = [
    CipherSuite::EcdheEcdsaAes256GcmSha384,
    CipherSuite::EcdheRsaAes256GcmSha384,
    CipherSuite::EcdheEcdsaAes128GcmSha256,
    CipherSuite::EcdheRsaAes128GcmSha256,
    CipherSuite::EcdheEcdsaChacha20Poly1305,
    CipherSuite::EcdheRsaChacha20Poly1305,
    CipherSuite::EcdheRsaAes256CbcSha,
    CipherSuite::EcdheRsaAes128CbcSha,
    CipherSuite::EcdheEcdsaAes256CbcSha,
    CipherSuite::EcdheEcdsaAes128CbcSha,
    CipherSuite::RsaAes256CbcSha,
    CipherSuite::RsaAes128CbcSha,
];

/// Default ciphers without AES acceleration: ChaCha20 is cheaper in software
const DEFAULT_CIPHERS_SOFTWARE: [CipherSuite; 12] = [
    CipherSuite::EcdheEcdsaChacha20Poly1305,
    CipherSuite::EcdheRsaChacha20Poly1305,
    CipherSuite::EcdheEcdsaAes256GcmSha384,
    CipherSuite::EcdheRsaAes256GcmSha384,
    CipherSuite::EcdheEcdsaAes128GcmSha256,
    CipherSuite::EcdheRsaAes128GcmSha256,
    CipherSuite::EcdheRsaAes256CbcSha,
    CipherSuite::EcdheRsaAes128CbcSha,
    CipherSuite::EcdheEcdsaAes256CbcSha,
    CipherSuite::EcdheEcdsaAes128CbcSha,
    CipherSuite::RsaAes256CbcSha,
    CipherSuite::RsaAes128CbcSha,
];

/// Canonical default cipher list for this machine, without the sentinel
pub fn preferred_default_ciphers() -> &'static [CipherSuite] {
    if has_aes_hardware() {
        &DEFAULT_CIPHERS_AES_HW
    } else {
        &DEFAULT_CIPHERS_SOFTWARE
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn has_aes_hardware() -> bool {
    std::arch::is_x86_feature_detected!("aes")
}

#[cfg(target_arch = "aarch64")]
fn has_aes_hardware() -> bool {
    std::arch::is_aarch64_feature_detected!("aes")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn has_aes_hardware() -> bool {
    false
}

/// Elliptic curve / key exchange group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    X25519,
    P256,
    P384,
    P521,
}

impl Curve {
    /// Look up a curve name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "X25519" => Some(Curve::X25519),
            "P256" => Some(Curve::P256),
            "P384" => Some(Curve::P384),
            "P521" => Some(Curve::P521),
            _ => None,
        }
    }

    /// IANA named group identifier
    pub fn id(&self) -> u16 {
        match self {
            Curve::X25519 => 29,
            Curve::P256 => 23,
            Curve::P384 => 24,
            Curve::P521 => 25,
        }
    }

    /// Group name understood by `SSL_CTX_set1_groups_list`
    pub fn openssl_group(&self) -> &'static str {
        match self {
            Curve::X25519 => "X25519",
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
        }
    }
}

/// Canonical default curve preference order
pub const DEFAULT_CURVES: [Curve; 4] = [Curve::X25519, Curve::P256, Curve::P384, Curve::P521];

/// Private key algorithm for issued certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    #[default]
    Ec256,
    Ec384,
    Rsa2048,
    Rsa4096,
    Rsa8192,
}

impl KeyType {
    /// Look up a key type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "P256" => Some(KeyType::Ec256),
            "P384" => Some(KeyType::Ec384),
            "RSA2048" => Some(KeyType::Rsa2048),
            "RSA4096" => Some(KeyType::Rsa4096),
            "RSA8192" => Some(KeyType::Rsa8192),
            _ => None,
        }
    }

    /// Identifier as used by ACME clients
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ec256 => "P256",
            KeyType::Ec384 => "P384",
            KeyType::Rsa2048 => "2048",
            KeyType::Rsa4096 => "4096",
            KeyType::Rsa8192 => "8192",
        }
    }
}
