//! Shared helpers for integration tests

use std::path::PathBuf;

use tempfile::TempDir;
use tlspolicy::tls::builtin_cert::BUILTIN_CERT;
use tlspolicy::tls::{SubDirective, TlsDirective};

/// Split a host-block snippet into a `TlsDirective`
///
/// Whitespace separated, one sub-directive per line, no quoting. Just
/// enough to write test input the way it appears in a config file.
pub fn directive(src: &str) -> TlsDirective {
    let mut lines = src.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));
    let (line, head) = lines.next().expect("empty directive");

    let mut tokens: Vec<&str> = head.split_whitespace().collect();
    assert_eq!(tokens.first(), Some(&"tls"), "directive must start with tls");
    tokens.remove(0);

    let opens_block = tokens.last() == Some(&"{");
    if opens_block {
        tokens.pop();
    }

    let mut directive = TlsDirective::new(line, tokens);
    if opens_block {
        let block = lines
            .take_while(|(_, l)| *l != "}")
            .filter(|(_, l)| !l.is_empty())
            .map(|(n, l)| {
                let mut words = l.split_whitespace();
                let name = words.next().unwrap_or_default();
                SubDirective::new(n, name, words)
            })
            .collect();
        directive = directive.with_block(block);
    }
    directive
}

/// PEM files written to a temporary directory
pub struct PemFixture {
    _dir: TempDir,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub ca_file: PathBuf,
}

impl PemFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cert_file = dir.path().join("test_cert.pem");
        let key_file = dir.path().join("test_key.pem");
        let ca_file = dir.path().join("ca_cert.crt");

        // the bundle holds both certificate and key; OpenSSL picks what it needs
        for path in [&cert_file, &key_file, &ca_file] {
            std::fs::write(path, BUILTIN_CERT).unwrap();
        }

        PemFixture {
            _dir: dir,
            cert_file,
            key_file,
            ca_file,
        }
    }

    pub fn cert_arg(&self) -> String {
        self.cert_file.display().to_string()
    }

    pub fn key_arg(&self) -> String {
        self.key_file.display().to_string()
    }
}
