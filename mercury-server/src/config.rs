//! Server configuration.

use mercury_crypto::rsa;
use mercury_mtproto::dc::{DcConfiguration, DcFlags, DcOption};
use mercury_mtproto::dev_keys;

/// RSA key material as decimal strings, the way key files store it.
#[derive(Clone, Debug)]
pub struct RsaKeyConfig {
    pub n: String,
    pub e: String,
    pub d: String,
}

/// Everything the server needs at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub rsa_key: RsaKeyConfig,
    pub dc_options: Vec<DcOption>,
    /// The DC id this instance serves as.
    pub this_dc: u32,
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rsa_key: RsaKeyConfig {
                n: dev_keys::RSA_N.to_owned(),
                e: dev_keys::RSA_E.to_owned(),
                d: dev_keys::RSA_D.to_owned(),
            },
            dc_options: vec![DcOption {
                id: 1,
                address: "127.0.0.1".into(),
                port: 4430,
                flags: DcFlags::NONE,
            }],
            this_dc: 1,
            listen_address: "127.0.0.1:4430".into(),
        }
    }
}

impl ServerConfig {
    /// Parse the configured RSA key. `None` if the strings are malformed.
    pub fn private_key(&self) -> Option<rsa::Key> {
        rsa::Key::new_private(&self.rsa_key.n, &self.rsa_key.e, &self.rsa_key.d)
    }

    /// The DC options as a lookup structure.
    pub fn dc_configuration(&self) -> DcConfiguration {
        DcConfiguration { options: self.dc_options.clone() }
    }
}
