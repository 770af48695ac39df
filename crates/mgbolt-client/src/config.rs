//! Connection configuration: a builder-style container of recognized
//! options, validated eagerly before any I/O.

use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ClientError;

/// Whether a connection is plaintext or TLS-wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    /// Connect over a raw TCP socket.
    Disable,
    /// Negotiate TLS immediately after the TCP connection is established.
    Require,
}

/// Context handed to a [`TrustCallback`] after a successful TLS handshake.
#[derive(Debug, Clone)]
pub struct TrustContext {
    /// The hostname the caller asked to connect to, if DNS-resolved.
    pub hostname: Option<String>,
    /// The numeric address actually connected to.
    pub peer_addr: IpAddr,
    /// The peer public key's algorithm name (e.g. `"rsaEncryption"`,
    /// `"id-ecPublicKey"`), derived from the `SubjectPublicKeyInfo`'s
    /// algorithm OID. `"unknown"` if the OID has no recognized name.
    pub key_algorithm: String,
    /// Lower-case hex SHA-512 digest of the peer's `SubjectPublicKeyInfo`.
    pub fingerprint_sha512: String,
}

/// Decides whether to trust a peer's TLS certificate, invoked once per
/// handshake with the extracted key algorithm and fingerprint.
///
/// Returning `true` accepts the connection; `false` aborts it with
/// [`ClientError::TrustCallbackRejected`]. A `Fn(&TrustContext) -> bool`
/// closure implements this automatically.
pub trait TrustCallback: Send + Sync {
    /// Evaluates `ctx` and decides whether to proceed.
    fn check(&self, ctx: &TrustContext) -> bool;
}

impl<F> TrustCallback for F
where
    F: Fn(&TrustContext) -> bool + Send + Sync,
{
    fn check(&self, ctx: &TrustContext) -> bool {
        self(ctx)
    }
}

/// The resolved connection target: exactly one of a DNS name or a numeric
/// address, enforced by construction rather than by a runtime invariant.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Host(String),
    Address(String),
}

impl Target {
    fn as_str(&self) -> &str {
        match self {
            Target::Host(s) | Target::Address(s) => s,
        }
    }
}

/// Validated connection configuration produced by [`ConfigBuilder::build`].
#[derive(Clone)]
pub struct Config {
    pub(crate) target: Target,
    pub(crate) port: u16,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) client_name: String,
    pub(crate) sslmode: SslMode,
    pub(crate) sslcert: Option<PathBuf>,
    pub(crate) sslkey: Option<PathBuf>,
    pub(crate) trust_callback: Option<Arc<dyn TrustCallback>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("target", &self.target)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("client_name", &self.client_name)
            .field("sslmode", &self.sslmode)
            .field("sslcert", &self.sslcert)
            .field("sslkey", &self.sslkey)
            .field("trust_callback", &self.trust_callback.is_some())
            .finish()
    }
}

impl Config {
    /// Starts building a new configuration.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The host name or numeric address dialed, whichever was configured.
    #[must_use]
    pub fn target(&self) -> &str {
        self.target.as_str()
    }

    /// The DNS host name, if that's what was configured (as opposed to a
    /// numeric address). Used to populate [`TrustContext::hostname`].
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        match &self.target {
            Target::Host(s) => Some(s),
            Target::Address(_) => None,
        }
    }

    /// TCP port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Basic-auth credentials, if configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    /// Client identification string sent during `HELLO`/`INIT`.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Whether this connection negotiates TLS.
    #[must_use]
    pub fn sslmode(&self) -> SslMode {
        self.sslmode
    }

    /// Application-supplied certificate/key pair, if configured.
    #[must_use]
    pub fn client_cert(&self) -> Option<(&PathBuf, &PathBuf)> {
        match (&self.sslcert, &self.sslkey) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }

    /// The trust callback to invoke after a TLS handshake, if any.
    #[must_use]
    pub fn trust_callback(&self) -> Option<&Arc<dyn TrustCallback>> {
        self.trust_callback.as_ref()
    }
}

/// Default client identification string sent during `HELLO`/`INIT`.
const DEFAULT_CLIENT_NAME: &str = "MemgraphBolt/0.1";

/// Builds and validates a [`Config`].
///
/// Validation happens eagerly in [`ConfigBuilder::build`], mirroring the
/// teacher's `ServerRuntimeConfig`/`DriverConfig` pattern of surfacing
/// configuration mistakes before any socket is touched.
#[derive(Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    address: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    client_name: Option<String>,
    sslmode: Option<SslMode>,
    sslcert: Option<PathBuf>,
    sslkey: Option<PathBuf>,
    trust_callback: Option<Arc<dyn TrustCallback>>,
}

impl ConfigBuilder {
    /// DNS name of the server to connect to. Mutually exclusive with
    /// [`ConfigBuilder::address`].
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Numeric address of the server to connect to. Mutually exclusive with
    /// [`ConfigBuilder::host`].
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// TCP port to connect to. There is no default; the caller must set it.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Basic-auth username. Requires [`ConfigBuilder::password`] to also be
    /// set.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Basic-auth password. Requires [`ConfigBuilder::username`] to also be
    /// set.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Client identification string sent during `HELLO`/`INIT`. Defaults to
    /// `"MemgraphBolt/0.1"`.
    #[must_use]
    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    /// Whether to negotiate TLS. Defaults to [`SslMode::Disable`].
    #[must_use]
    pub fn sslmode(mut self, sslmode: SslMode) -> Self {
        self.sslmode = Some(sslmode);
        self
    }

    /// Application certificate to present during a TLS handshake. Requires
    /// [`ConfigBuilder::sslkey`] to also be set.
    #[must_use]
    pub fn sslcert(mut self, path: impl Into<PathBuf>) -> Self {
        self.sslcert = Some(path.into());
        self
    }

    /// Private key matching [`ConfigBuilder::sslcert`].
    #[must_use]
    pub fn sslkey(mut self, path: impl Into<PathBuf>) -> Self {
        self.sslkey = Some(path.into());
        self
    }

    /// Callback invoked after a TLS handshake with the peer's key algorithm
    /// and fingerprint; returning `false` aborts the connection.
    #[must_use]
    pub fn trust_callback(mut self, callback: impl TrustCallback + 'static) -> Self {
        self.trust_callback = Some(Arc::new(callback));
        self
    }

    /// Validates the accumulated options and produces a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BadParameter`] if neither or both of
    /// `host`/`address` are set, if `port` was never set, if exactly one of
    /// `username`/`password` is set, or if exactly one of
    /// `sslcert`/`sslkey` is set.
    pub fn build(self) -> Result<Config, ClientError> {
        let target = match (self.host, self.address) {
            (Some(host), None) => Target::Host(host),
            (None, Some(address)) => Target::Address(address),
            (None, None) | (Some(_), Some(_)) => {
                return Err(ClientError::BadParameter(
                    "exactly one of host or address must be set".to_owned(),
                ));
            }
        };
        let Some(port) = self.port else {
            return Err(ClientError::BadParameter("port must be set".to_owned()));
        };
        if self.username.is_some() != self.password.is_some() {
            return Err(ClientError::BadParameter(
                "username and password must both be set or both be absent".to_owned(),
            ));
        }
        if self.sslcert.is_some() != self.sslkey.is_some() {
            return Err(ClientError::BadParameter(
                "sslcert and sslkey must both be set or both be absent".to_owned(),
            ));
        }

        Ok(Config {
            target,
            port,
            username: self.username,
            password: self.password,
            client_name: self.client_name.unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_owned()),
            sslmode: self.sslmode.unwrap_or(SslMode::Disable),
            sslcert: self.sslcert,
            sslkey: self.sslkey,
            trust_callback: self.trust_callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, SslMode};
    use crate::error::ClientError;

    #[test]
    fn rejects_missing_host_and_address() {
        let err = Config::builder().port(7687).build().unwrap_err();
        assert!(matches!(err, ClientError::BadParameter(_)));
    }

    #[test]
    fn rejects_both_host_and_address() {
        let err = Config::builder()
            .host("db.example.com")
            .address("127.0.0.1")
            .port(7687)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::BadParameter(_)));
    }

    #[test]
    fn rejects_missing_port() {
        let err = Config::builder().host("db.example.com").build().unwrap_err();
        assert!(matches!(err, ClientError::BadParameter(_)));
    }

    #[test]
    fn rejects_username_without_password() {
        let err = Config::builder()
            .host("db.example.com")
            .port(7687)
            .username("neo")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::BadParameter(_)));
    }

    #[test]
    fn rejects_sslcert_without_sslkey() {
        let err = Config::builder()
            .host("db.example.com")
            .port(7687)
            .sslcert("cert.pem")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::BadParameter(_)));
    }

    #[test]
    fn accepts_minimal_valid_config() {
        let config = Config::builder()
            .host("db.example.com")
            .port(7687)
            .build()
            .unwrap();
        assert_eq!(config.target(), "db.example.com");
        assert_eq!(config.port(), 7687);
        assert_eq!(config.client_name(), "MemgraphBolt/0.1");
        assert_eq!(config.sslmode(), SslMode::Disable);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn accepts_credentials_and_address() {
        let config = Config::builder()
            .address("10.0.0.5")
            .port(7687)
            .username("neo4j")
            .password("hunter2")
            .sslmode(SslMode::Require)
            .build()
            .unwrap();
        assert_eq!(config.credentials(), Some(("neo4j", "hunter2")));
        assert_eq!(config.sslmode(), SslMode::Require);
    }
}
