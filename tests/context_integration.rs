//! OpenSSL context integration tests
//!
//! Build server contexts from compiled configurations and run real
//! handshakes against them over loopback TCP.

mod common;

use std::net::{TcpListener, TcpStream};
use std::thread;

use common::{directive, PemFixture};
use openssl::ssl::{Ssl, SslConnector, SslMethod, SslVerifyMode, SslVersion};
use tlspolicy::tls::{assemble, HostContext, ServerContext};

fn server_context(src: &str) -> tlspolicy::tls::Result<ServerContext> {
    let config = assemble(&HostContext::new("example.com"), &directive(src))?;
    ServerContext::from_config(&config)
}

/// Handshake once; returns (negotiated version, selected ALPN) as the server saw them
fn handshake(ctx: ServerContext, client_alpn: &[u8]) -> (String, Option<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server_handle = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        let ssl = Ssl::new(ctx.ssl_context()).unwrap();
        let stream = ssl.accept(tcp_stream).unwrap();
        (
            stream.ssl().version_str().to_string(),
            stream.ssl().selected_alpn_protocol().map(|p| p.to_vec()),
        )
    });

    let mut connector = SslConnector::builder(SslMethod::tls_client()).unwrap();
    connector.set_verify(SslVerifyMode::NONE);
    if !client_alpn.is_empty() {
        connector.set_alpn_protos(client_alpn).unwrap();
    }
    let connector = connector.build();

    let tcp_stream = TcpStream::connect(addr).unwrap();
    let client = connector
        .configure()
        .unwrap()
        .verify_hostname(false)
        .connect("example.com", tcp_stream)
        .unwrap();

    // keep the client open until the server is done with its side
    let seen = server_handle.join().unwrap();
    drop(client);
    seen
}

#[test]
fn test_manual_certificate_context() {
    let pem = PemFixture::new();
    let ctx = server_context(&format!("tls {} {}", pem.cert_arg(), pem.key_arg())).unwrap();

    let cert = ctx.certificate().unwrap();
    assert_eq!(cert.subject, "example.com");
    assert!(cert.covers("www.example.com"));
}

#[test]
fn test_client_ca_files_loaded() {
    let pem = PemFixture::new();
    let ctx = server_context(&format!(
        "tls self_signed {{
            clients verify_if_given {}
        }}",
        pem.ca_file.display()
    ));
    assert!(ctx.is_ok());

    let missing = server_context(
        "tls self_signed {
            clients /nonexistent/client_ca.crt
        }",
    );
    assert!(missing.is_err());
}

#[test]
fn test_handshake_respects_protocol_bounds() {
    let ctx = server_context(
        "tls self_signed {
            protocols tls1.2
        }",
    )
    .unwrap();
    assert!(ctx.max_proto_version() == Some(SslVersion::TLS1_2));

    let (version, alpn) = handshake(ctx, b"");
    assert_eq!(version, "TLSv1.2");
    assert_eq!(alpn, None);
}

#[test]
fn test_handshake_selects_alpn() {
    let ctx = server_context(
        "tls self_signed {
            alpn h2 http/1.1
        }",
    )
    .unwrap();

    // client prefers http/1.1, server preference wins
    let (_, alpn) = handshake(ctx, b"\x08http/1.1\x02h2");
    assert_eq!(alpn.as_deref(), Some(&b"h2"[..]));
}

#[test]
fn test_handshake_alpn_fallback() {
    let ctx = server_context(
        "tls self_signed {
            alpn h2
        }",
    )
    .unwrap();

    // no overlap: the server does not acknowledge ALPN
    let (_, alpn) = handshake(ctx, b"\x08http/1.1");
    assert_eq!(alpn, None);
}

#[test]
fn test_legacy_cipher_builds_or_names_cipher() {
    // 3DES may be compiled out of the OpenSSL build entirely
    match server_context(
        "tls self_signed {
            ciphers RSA-3DES-EDE-CBC-SHA
        }",
    ) {
        Ok(ctx) => assert!(ctx.certificate().is_some()),
        Err(err) => {
            assert!(err.line().is_none());
            assert!(err.to_string().contains("DES-CBC3-SHA"), "{}", err);
        }
    }
}

#[test]
fn test_repeated_curves_context() {
    let ctx = server_context(
        "tls self_signed {
            curves p256
            curves p256
        }",
    );
    assert!(ctx.is_ok());
}
