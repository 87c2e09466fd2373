//! Directive input and leading-argument resolution
//!
//! The tokenizer hands over a `tls` directive as a [`TlsDirective`]: its
//! leading arguments plus the sub-directives of its nested block. This
//! module also decides, from the leading arguments alone, where the host's
//! certificate comes from.

use std::path::PathBuf;

use tracing::trace;

use super::{Result, TlsError};

/// One line inside the `tls { ... }` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubDirective {
    /// Source line number
    pub line: usize,
    /// Sub-directive keyword, e.g. `protocols`
    pub name: String,
    /// Argument tokens following the keyword
    pub args: Vec<String>,
}

impl SubDirective {
    pub fn new<I, S>(line: usize, name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SubDirective {
            line,
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A sub-directive that takes no arguments
    pub fn flag(line: usize, name: impl Into<String>) -> Self {
        SubDirective {
            line,
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub(crate) fn arity_error(&self) -> TlsError {
        TlsError::arity(&self.name, self.line)
    }
}

/// A tokenized `tls` directive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsDirective {
    /// Source line number of the `tls` keyword
    pub line: usize,
    /// Arguments between `tls` and the block
    pub args: Vec<String>,
    /// Nested block, if one was opened
    pub block: Option<Vec<SubDirective>>,
}

impl TlsDirective {
    pub fn new<I, S>(line: usize, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TlsDirective {
            line,
            args: args.into_iter().map(Into::into).collect(),
            block: None,
        }
    }

    /// Attach the nested block
    pub fn with_block(mut self, block: Vec<SubDirective>) -> Self {
        self.block = Some(block);
        self
    }

    /// Sub-directives of the block, empty when there is none
    pub fn sub_directives(&self) -> &[SubDirective] {
        self.block.as_deref().unwrap_or(&[])
    }

    fn has_block(&self) -> bool {
        !self.sub_directives().is_empty()
    }
}

/// Where the host's certificate comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CertificateSource {
    /// Obtained and renewed by the certificate manager
    #[default]
    Managed,
    /// Certificate and key supplied as PEM files
    Files { cert_file: PathBuf, key_file: PathBuf },
    /// Built-in self-signed certificate
    SelfSigned,
}

/// What the leading arguments of `tls` decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LeadingArgs {
    pub enabled: bool,
    pub source: CertificateSource,
    pub email: Option<String>,
}

/// Interpret `tls [<cert> <key> | <email> | off | self_signed]`
pub(crate) fn resolve_leading_args(directive: &TlsDirective) -> Result<LeadingArgs> {
    let mut leading = LeadingArgs {
        enabled: true,
        source: CertificateSource::Managed,
        email: None,
    };

    match directive.args.as_slice() {
        // a naked tls directive changes nothing, so it is rejected
        [] if !directive.has_block() => return Err(TlsError::arity("tls", directive.line)),
        [] => {}
        [arg] if arg == "off" => leading.enabled = false,
        [arg] if arg == "self_signed" => leading.source = CertificateSource::SelfSigned,
        [email] => leading.email = Some(email.clone()),
        [cert_file, key_file] => {
            leading.source = CertificateSource::Files {
                cert_file: PathBuf::from(cert_file),
                key_file: PathBuf::from(key_file),
            };
        }
        _ => return Err(TlsError::arity("tls", directive.line)),
    }

    trace!(
        line = directive.line,
        enabled = leading.enabled,
        source = ?leading.source,
        email = ?leading.email,
        "Resolved tls arguments"
    );

    Ok(leading)
}
