//! Concrete byte-stream transports: a raw TCP socket and a TLS-wrapped one.
//!
//! Both implement [`mgbolt_core::Transport`] so a [`mgbolt_core::Session`]
//! can drive either without knowing which one it holds.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use mgbolt_core::Transport;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme, StreamOwned};
use sha2::{Digest, Sha512};
use socket2::{Socket, TcpKeepalive};

use crate::config::{Config, SslMode, TrustContext};
use crate::error::ClientError;

/// How long a socket may sit idle before the OS probes it, and how the
/// probes are spaced. Mirrors common driver defaults; the client has no
/// independent opinion about liveness beyond "don't leave dead sockets
/// around forever."
const KEEPALIVE_IDLE: Duration = Duration::from_secs(20);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);
const KEEPALIVE_RETRIES: u32 = 4;

/// A raw, unencrypted TCP transport.
pub struct RawTcpTransport {
    stream: TcpStream,
}

impl RawTcpTransport {
    /// Connects to `addr` and applies the client's standard socket tuning.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NetworkFailure`] if the socket cannot be
    /// created, connected, or configured.
    pub fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let domain = socket2::Domain::for_address(addr);
        let socket = Socket::new(domain, socket2::Type::STREAM, Some(socket2::Protocol::TCP))?;
        socket.connect(&addr.into())?;
        tune_socket(&socket);
        let stream: TcpStream = socket.into();
        Ok(Self { stream })
    }
}

/// Best-effort `TCP_NODELAY`/keepalive tuning. Failures are not fatal: a
/// connection without these options still works, just less efficiently.
fn tune_socket(socket: &Socket) {
    if let Err(err) = socket.set_nodelay(true) {
        tracing::debug!(error = %err, "failed to set TCP_NODELAY");
    }
    let keepalive = TcpKeepalive::new()
        .with_time(KEEPALIVE_IDLE)
        .with_interval(KEEPALIVE_INTERVAL)
        .with_retries(KEEPALIVE_RETRIES);
    if let Err(err) = socket.set_tcp_keepalive(&keepalive) {
        tracing::debug!(error = %err, "failed to configure TCP keepalive");
    }
}

impl Transport for RawTcpTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)
    }

    fn recv_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown(std::net::Shutdown::Both)
    }
}

/// A TLS-wrapped TCP transport.
pub struct TlsTransport {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsTransport {
    /// Connects to `addr`, negotiates TLS, and invokes `config`'s trust
    /// callback (if any) once the handshake produces a peer certificate.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NetworkFailure`] on socket failure,
    /// [`ClientError::Ssl`] on TLS configuration or handshake failure, and
    /// [`ClientError::TrustCallbackRejected`] if the application-supplied
    /// callback declines the peer.
    pub fn connect(addr: SocketAddr, config: &Config) -> Result<Self, ClientError> {
        let raw = RawTcpTransport::connect(addr)?;
        let verifier = Arc::new(TrustCallbackVerifier {
            hostname: config.hostname().map(str::to_owned),
            peer_addr: addr.ip(),
            trust_callback: config.trust_callback().cloned(),
        });
        let builder = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(verifier);

        let tls_config = if let Some((cert_path, key_path)) = config.client_cert() {
            let cert_chain = load_cert_chain(cert_path)?;
            let key = load_private_key(key_path)?;
            builder
                .with_client_auth_cert(cert_chain, key)
                .map_err(ClientError::from)?
        } else {
            builder.with_no_client_auth()
        };

        let server_name = ServerName::try_from(config.target().to_owned())
            .map_err(|err| ClientError::Ssl(err.to_string()))?;
        let connection =
            ClientConnection::new(Arc::new(tls_config), server_name).map_err(ClientError::from)?;

        Ok(Self {
            stream: StreamOwned::new(connection, raw.stream),
        })
    }
}

impl Transport for TlsTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)
    }

    fn recv_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.stream.sock.shutdown(std::net::Shutdown::Both)
    }
}

fn load_cert_chain(path: &std::path::Path) -> Result<Vec<CertificateDer<'static>>, ClientError> {
    let file = std::fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ClientError::NetworkFailure)
}

fn load_private_key(
    path: &std::path::Path,
) -> Result<rustls::pki_types::PrivateKeyDer<'static>, ClientError> {
    let file = std::fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| ClientError::Ssl(format!("no private key found in {}", path.display())))
}

/// Certificate verifier that delegates the trust decision to an
/// application-supplied [`crate::config::TrustCallback`] instead of
/// validating against a root store.
///
/// Signature verification is still performed for real (unlike a verifier
/// that unconditionally asserts trust): the callback only replaces chain
/// validation, not the cryptographic proof that the handshake messages
/// were actually signed by the presented key.
struct TrustCallbackVerifier {
    hostname: Option<String>,
    peer_addr: std::net::IpAddr,
    trust_callback: Option<Arc<dyn crate::config::TrustCallback>>,
}

impl std::fmt::Debug for TrustCallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustCallbackVerifier")
            .field("hostname", &self.hostname)
            .field("peer_addr", &self.peer_addr)
            .field("trust_callback", &self.trust_callback.is_some())
            .finish()
    }
}

impl ServerCertVerifier for TrustCallbackVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let Some(callback) = &self.trust_callback else {
            return Ok(ServerCertVerified::assertion());
        };

        let spki = extract_subject_public_key_info(end_entity.as_ref())
            .map_err(|err| rustls::Error::General(err.to_owned()))?;
        let fingerprint_sha512 = hex::encode(Sha512::digest(spki.bytes));
        let ctx = TrustContext {
            hostname: self.hostname.clone(),
            peer_addr: self.peer_addr,
            key_algorithm: spki.algorithm.to_owned(),
            fingerprint_sha512,
        };

        if callback.check(&ctx) {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &rustls::crypto::ring::default_provider().signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// A certificate's `SubjectPublicKeyInfo`, as extracted by
/// [`extract_subject_public_key_info`].
struct SubjectPublicKeyInfo<'a> {
    /// Human-readable name of the key algorithm, or `"unknown"`.
    algorithm: &'static str,
    /// The DER-encoded `SubjectPublicKeyInfo` structure, fingerprinted
    /// as-is.
    bytes: &'a [u8],
}

/// Locates the `SubjectPublicKeyInfo` field inside a DER-encoded X.509
/// certificate and names its key algorithm.
///
/// No X.509 parsing crate is available, so this walks only as much ASN.1
/// DER as is needed to reach `tbsCertificate.subjectPublicKeyInfo`: a
/// minimal tag/length/value walker, not a general parser.
fn extract_subject_public_key_info(cert_der: &[u8]) -> Result<SubjectPublicKeyInfo<'_>, &'static str> {
    // Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signature }
    let (cert_body, _) = read_tlv(cert_der, 0x30)?;
    // TBSCertificate ::= SEQUENCE { version?, serialNumber, signature,
    //   issuer, validity, subject, subjectPublicKeyInfo, ... }
    let (tbs_body, _) = read_tlv(cert_body, 0x30)?;

    let mut cursor = tbs_body;
    // version is an explicit context tag [0]; skip it if present.
    if cursor.first() == Some(&0xA0) {
        let (_, rest) = read_tlv(cursor, 0xA0)?;
        cursor = rest;
    }
    // serialNumber (INTEGER)
    let (_, cursor) = read_tlv(cursor, 0x02)?;
    // signature (AlgorithmIdentifier, SEQUENCE)
    let (_, cursor) = read_tlv(cursor, 0x30)?;
    // issuer (Name, SEQUENCE)
    let (_, cursor) = read_tlv(cursor, 0x30)?;
    // validity (SEQUENCE)
    let (_, cursor) = read_tlv(cursor, 0x30)?;
    // subject (Name, SEQUENCE)
    let (_, cursor) = read_tlv(cursor, 0x30)?;
    // subjectPublicKeyInfo (SEQUENCE) -- this is the span we fingerprint
    let (spki_body, spki_full) = read_tlv_full(cursor, 0x30)?;
    // AlgorithmIdentifier ::= SEQUENCE { algorithm OBJECT IDENTIFIER, ... }
    let (algorithm_body, _) = read_tlv(spki_body, 0x30)?;
    let (oid_bytes, _) = read_tlv(algorithm_body, 0x06)?;

    Ok(SubjectPublicKeyInfo {
        algorithm: name_for_oid(oid_bytes),
        bytes: spki_full,
    })
}

/// Reads one DER TLV matching `expected_tag`, returning its value and the
/// bytes following it.
fn read_tlv(input: &[u8], expected_tag: u8) -> Result<(&[u8], &[u8]), &'static str> {
    let (value, _full, rest) = read_tlv_impl(input, expected_tag)?;
    Ok((value, rest))
}

/// Like [`read_tlv`] but also returns the full tag+length+value span.
fn read_tlv_full(input: &[u8], expected_tag: u8) -> Result<(&[u8], &[u8]), &'static str> {
    let (value, full, _rest) = read_tlv_impl(input, expected_tag)?;
    Ok((value, full))
}

fn read_tlv_impl(input: &[u8], expected_tag: u8) -> Result<(&[u8], &[u8], &[u8]), &'static str> {
    let (&tag, rest) = input.split_first().ok_or("truncated DER: missing tag")?;
    if tag != expected_tag {
        return Err("unexpected DER tag");
    }
    let (&len_byte, rest) = rest.split_first().ok_or("truncated DER: missing length")?;
    let (len, rest) = if len_byte & 0x80 == 0 {
        (usize::from(len_byte), rest)
    } else {
        let n_bytes = usize::from(len_byte & 0x7F);
        if n_bytes == 0 || n_bytes > rest.len() || n_bytes > std::mem::size_of::<usize>() {
            return Err("unsupported DER length encoding");
        }
        let (len_bytes, rest) = rest.split_at(n_bytes);
        let mut len: usize = 0;
        for &b in len_bytes {
            len = len.checked_shl(8).ok_or("DER length overflow")? | usize::from(b);
        }
        (len, rest)
    };
    if len > rest.len() {
        return Err("truncated DER: value shorter than declared length");
    }
    let header_len = input.len() - rest.len();
    let (value, tail) = rest.split_at(len);
    let full = &input[..header_len + len];
    Ok((value, full, tail))
}

/// Key-algorithm OIDs this client recognizes by name. Anything else is
/// reported to the trust callback as `"unknown"`.
const KNOWN_OIDS: &[(&[u8], &str)] = &[
    // rsaEncryption
    (&[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01], "rsaEncryption"),
    // id-ecPublicKey
    (&[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01], "id-ecPublicKey"),
    // id-Ed25519
    (&[0x2B, 0x65, 0x70], "Ed25519"),
    // id-Ed448
    (&[0x2B, 0x65, 0x71], "Ed448"),
    // dsa
    (&[0x2A, 0x86, 0x48, 0xCE, 0x38, 0x04, 0x01], "dsa"),
];

/// We cannot cheaply allocate a `String` to hand back a `'static str`, so
/// unknown OIDs are reported generically rather than dotted-decimal
/// decoded; the fingerprint and raw SPKI bytes are what actually matter
/// for a trust decision.
fn name_for_oid(oid: &[u8]) -> &'static str {
    for (bytes, name) in KNOWN_OIDS {
        if *bytes == oid {
            return *name;
        }
    }
    "unknown"
}

/// Establishes a transport for `config`, resolving its host/address and
/// dispatching to [`RawTcpTransport`] or [`TlsTransport`] per its
/// [`SslMode`].
///
/// # Errors
///
/// Returns [`ClientError::NetworkFailure`] if the target cannot be
/// resolved or connected to, and any error [`TlsTransport::connect`] can
/// raise when TLS is requested.
pub fn connect(config: &Config) -> Result<Box<dyn Transport>, ClientError> {
    let addr = resolve(config)?;
    match config.sslmode() {
        SslMode::Disable => Ok(Box::new(RawTcpTransport::connect(addr)?)),
        SslMode::Require => Ok(Box::new(TlsTransport::connect(addr, config)?)),
    }
}

fn resolve(config: &Config) -> Result<SocketAddr, ClientError> {
    use std::net::ToSocketAddrs;

    let target = format!("{}:{}", config.target(), config.port());
    target
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ClientError::NetworkFailure(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("could not resolve {target}"),
        )))
}

#[cfg(test)]
mod tests {
    use super::{extract_subject_public_key_info, name_for_oid};

    #[test]
    fn unknown_oid_reports_generic_name() {
        assert_eq!(name_for_oid(&[0x2A, 0x03, 0x04]), "unknown");
    }

    #[test]
    fn known_oid_reports_algorithm_name() {
        assert_eq!(
            name_for_oid(&[0x2B, 0x65, 0x70]),
            "Ed25519"
        );
    }

    #[test]
    fn rejects_truncated_der() {
        let err = extract_subject_public_key_info(&[0x30, 0x05, 0x00]).unwrap_err();
        assert_eq!(err, "truncated DER: value shorter than declared length");
    }
}
