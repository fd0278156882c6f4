//! Data-center configuration: which endpoints exist and how they are
//! looked up.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Endpoint selection flags.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DcFlags(u32);

impl DcFlags {
    pub const NONE: DcFlags = DcFlags(0);
    pub const IPV4_ONLY: DcFlags = DcFlags(1 << 1);
    pub const IPV6_ONLY: DcFlags = DcFlags(1 << 2);
    pub const MEDIA_ONLY: DcFlags = DcFlags(1 << 3);

    /// The raw bit pattern.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set in `self`.
    pub fn contains(self, other: DcFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DcFlags {
    type Output = DcFlags;
    fn bitor(self, rhs: DcFlags) -> DcFlags {
        DcFlags(self.0 | rhs.0)
    }
}

/// One data-center endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct DcOption {
    pub id: u32,
    pub address: String,
    pub port: u16,
    pub flags: DcFlags,
}

/// A `(dc_id, flags)` pair identifying the endpoint a caller wants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectionSpec {
    pub dc_id: u32,
    pub flags: DcFlags,
}

impl ConnectionSpec {
    pub fn new(dc_id: u32) -> Self {
        Self { dc_id, flags: DcFlags::NONE }
    }

    pub fn with_flags(dc_id: u32, flags: DcFlags) -> Self {
        Self { dc_id, flags }
    }

    /// The combined key both hashing and caching use.
    fn combined(self) -> u32 {
        self.dc_id | (self.flags.bits() << 20)
    }
}

impl Hash for ConnectionSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.combined().hash(state);
    }
}

/// The set of known DC endpoints.
#[derive(Clone, Debug, Default)]
pub struct DcConfiguration {
    pub options: Vec<DcOption>,
}

impl DcConfiguration {
    /// True when at least one endpoint is known.
    pub fn is_valid(&self) -> bool {
        !self.options.is_empty()
    }

    /// Find the endpoint matching `spec`: same DC id, and carrying every
    /// flag the spec demands.
    pub fn get_option(&self, spec: ConnectionSpec) -> Option<&DcOption> {
        self.options
            .iter()
            .find(|opt| opt.id == spec.dc_id && opt.flags.contains(spec.flags))
    }

    /// Index the options by spec for repeated lookups.
    pub fn build_index(&self) -> HashMap<ConnectionSpec, DcOption> {
        self.options
            .iter()
            .map(|opt| (ConnectionSpec::with_flags(opt.id, opt.flags), opt.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DcConfiguration {
        DcConfiguration {
            options: vec![
                DcOption {
                    id: 1,
                    address: "10.0.0.1".into(),
                    port: 443,
                    flags: DcFlags::NONE,
                },
                DcOption {
                    id: 1,
                    address: "10.0.0.2".into(),
                    port: 443,
                    flags: DcFlags::MEDIA_ONLY,
                },
                DcOption {
                    id: 2,
                    address: "fd00::2".into(),
                    port: 443,
                    flags: DcFlags::IPV6_ONLY,
                },
            ],
        }
    }

    #[test]
    fn lookup_by_id_and_flags() {
        let cfg = sample();
        assert_eq!(cfg.get_option(ConnectionSpec::new(1)).unwrap().address, "10.0.0.1");
        assert_eq!(
            cfg.get_option(ConnectionSpec::with_flags(1, DcFlags::MEDIA_ONLY)).unwrap().address,
            "10.0.0.2"
        );
        assert!(cfg.get_option(ConnectionSpec::new(9)).is_none());
    }

    #[test]
    fn spec_hash_combines_id_and_flags() {
        let a = ConnectionSpec::with_flags(1, DcFlags::MEDIA_ONLY);
        let b = ConnectionSpec::new(1);
        assert_ne!(a.combined(), b.combined());
        assert_eq!(a.combined(), 1 | ((1 << 3) << 20));
    }

    #[test]
    fn index_is_keyed_by_spec() {
        let idx = sample().build_index();
        assert_eq!(idx.len(), 3);
        assert!(idx.contains_key(&ConnectionSpec::with_flags(2, DcFlags::IPV6_ONLY)));
    }
}
