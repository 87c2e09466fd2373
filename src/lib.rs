//! tlspolicy - host TLS directive compiler
//!
//! This crate compiles the `tls` directive of a server host block into a
//! validated, immutable TLS configuration, and can hand that configuration
//! to OpenSSL as a server context.

pub mod tls;
