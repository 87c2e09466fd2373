//! Scalar sub-directive resolvers
//!
//! Each resolver validates the arguments of one sub-directive and returns
//! the typed value. None of them look at other sub-directives; ordering and
//! defaulting are the assembler's job.

use std::net::IpAddr;

use url::Url;

use super::directive::SubDirective;
use super::tables::{CipherSuite, Curve, KeyType, TlsVersion};
use super::{Result, TlsError, ValueKind};

fn lookup_version(name: &str, line: usize) -> Result<TlsVersion> {
    TlsVersion::from_name(name).ok_or_else(|| TlsError::unknown(ValueKind::Protocol, name, line))
}

fn single_arg(sub: &SubDirective) -> Result<&str> {
    match sub.args.as_slice() {
        [arg] => Ok(arg.as_str()),
        _ => Err(sub.arity_error()),
    }
}

fn at_least_one_arg(sub: &SubDirective) -> Result<&[String]> {
    if sub.args.is_empty() {
        return Err(sub.arity_error());
    }
    Ok(&sub.args)
}

/// `protocols <min> [<max>]`, returned as `(min, max)` without reordering
pub fn resolve_protocols(sub: &SubDirective) -> Result<(TlsVersion, TlsVersion)> {
    match sub.args.as_slice() {
        [only] => {
            let version = lookup_version(only, sub.line)?;
            Ok((version, version))
        }
        [min, max] => Ok((lookup_version(min, sub.line)?, lookup_version(max, sub.line)?)),
        _ => Err(sub.arity_error()),
    }
}

/// `ciphers <name>...`, in the order given
pub fn resolve_ciphers(sub: &SubDirective) -> Result<Vec<CipherSuite>> {
    at_least_one_arg(sub)?
        .iter()
        .map(|name| {
            CipherSuite::from_name(name)
                .ok_or_else(|| TlsError::unknown(ValueKind::Cipher, name, sub.line))
        })
        .collect()
}

/// `curves <name>...`, in the order given
pub fn resolve_curves(sub: &SubDirective) -> Result<Vec<Curve>> {
    at_least_one_arg(sub)?
        .iter()
        .map(|name| {
            Curve::from_name(name).ok_or_else(|| TlsError::unknown(ValueKind::Curve, name, sub.line))
        })
        .collect()
}

/// `key_type <name>`
pub fn resolve_key_type(sub: &SubDirective) -> Result<KeyType> {
    let name = single_arg(sub)?;
    KeyType::from_name(name).ok_or_else(|| TlsError::unknown(ValueKind::KeyType, name, sub.line))
}

/// `ca <url>`; the directory URL is kept verbatim
pub fn resolve_ca_url(sub: &SubDirective) -> Result<String> {
    single_arg(sub).map(str::to_string)
}

/// `alpn <protocol>...`; names are not checked against any registry
pub fn resolve_alpn(sub: &SubDirective) -> Result<Vec<String>> {
    at_least_one_arg(sub).map(<[String]>::to_vec)
}

/// Zero-argument flags such as `must_staple` and `wildcard`
pub fn resolve_flag(sub: &SubDirective) -> Result<bool> {
    if !sub.args.is_empty() {
        return Err(sub.arity_error());
    }
    Ok(true)
}

/// `dns <provider>`
pub fn resolve_dns_provider(sub: &SubDirective) -> Result<String> {
    single_arg(sub).map(str::to_string)
}

/// `max_certs <n>` with `n >= 1`
pub fn resolve_max_certs(sub: &SubDirective) -> Result<u32> {
    let raw = single_arg(sub)?;
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(TlsError::invalid(
            &sub.name,
            format!("max_certs must be a positive integer, got '{}'", raw),
            sub.line,
        )),
    }
}

/// `ask <url>`; must be an absolute http or https URL
pub fn resolve_ask_url(sub: &SubDirective) -> Result<Url> {
    let raw = single_arg(sub)?;
    let url = Url::parse(raw)
        .map_err(|e| TlsError::invalid(&sub.name, format!("'{}': {}", raw, e), sub.line))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TlsError::invalid(
            &sub.name,
            format!("ask URL must use http or https, not '{}'", other),
            sub.line,
        )),
    }
}

/// Whether a hostname could get a publicly trusted certificate
pub fn host_qualifies(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname != "localhost"
        && !hostname.ends_with(".localhost")
        && hostname.contains('.')
        && !hostname.starts_with('.')
        && !hostname.ends_with('.')
        && !hostname.contains("..")
        && !hostname.chars().any(|c| c.is_whitespace() || c == '/' || c == ':')
        && hostname.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>().is_err()
}

/// `wildcard`: replace the left-most label of `hostname` with `*`
pub fn resolve_wildcard(sub: &SubDirective, hostname: &str) -> Result<String> {
    resolve_flag(sub)?;

    if !host_qualifies(hostname) {
        return Err(TlsError::invalid(
            &sub.name,
            format!("hostname '{}' does not qualify for managed TLS", hostname),
            sub.line,
        ));
    }
    if hostname.contains('*') {
        return Err(TlsError::invalid(
            &sub.name,
            format!(
                "cannot convert '{}' to a wildcard: already has a wildcard label",
                hostname
            ),
            sub.line,
        ));
    }

    let mut labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 3 {
        return Err(TlsError::invalid(
            &sub.name,
            format!("cannot convert '{}' to a wildcard: too few labels", hostname),
            sub.line,
        ));
    }
    labels[0] = "*";
    Ok(labels.join("."))
}
