//! TLS certificate settings per host.

use super::{ConfigStore, decode, decode_all, encode, force_find, require};
use crate::error::{ConfigError, Result};
use crate::node::Key;
use crate::patch::{find_by_identity, remove_by_identity, upsert_by_identity};
use crate::types::Cert;

const CERTS: &str = "certs";
const HOST: &str = "host";

impl ConfigStore {
    pub fn get_cert(&self, host: &str) -> Result<Cert> {
        require(host, "cert", "host")?;
        let tree = self.snapshot()?;
        tree.find(&[Key::sequence(CERTS)])
            .and_then(|certs| find_by_identity(certs, HOST, host))
            .map(|node| decode(node, "cert"))
            .transpose()?
            .ok_or_else(|| ConfigError::not_found("cert", host))
    }

    pub fn cert_exists(&self, host: &str) -> Result<bool> {
        let tree = self.snapshot()?;
        Ok(tree
            .find(&[Key::sequence(CERTS)])
            .and_then(|certs| find_by_identity(certs, HOST, host))
            .is_some())
    }

    pub fn get_all_certs(&self) -> Result<Vec<Cert>> {
        decode_all(self.snapshot()?.find(&[Key::sequence(CERTS)]), "cert")
    }

    pub fn set_cert(&self, cert: &Cert) -> Result<bool> {
        require(&cert.host, "cert", "host")?;
        self.update(&format!("cert '{}'", cert.host), |tree, strategies| {
            let node = encode(cert, "cert")?;
            let certs = force_find(tree, &[Key::sequence(CERTS)])?;
            Ok(upsert_by_identity(certs, &node, HOST, strategies, CERTS)?)
        })
    }

    pub fn delete_cert(&self, host: &str) -> Result<()> {
        require(host, "cert", "host")?;
        self.delete("cert", host, |tree| {
            Ok(tree
                .find_mut(&[Key::sequence(CERTS)], false)
                .is_some_and(|certs| remove_by_identity(certs, HOST, host)))
        })
    }
}
