//! Certificate fixtures generated with rcgen.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
};

use crate::cert::Certificate;

/// A generated certificate with the material needed to issue from it.
pub struct Issued {
    pub cert: Certificate,
    pub issued: rcgen::Certificate,
    pub key: KeyPair,
}

fn params(common_name: &str, ca: bool) -> CertificateParams {
    let mut params = CertificateParams::new(vec![common_name.to_string()]).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;
    if ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    }
    params
}

fn wrap(issued: rcgen::Certificate, key: KeyPair) -> Issued {
    Issued {
        cert: Certificate::from_der(issued.der().to_vec()).unwrap(),
        issued,
        key,
    }
}

/// Self-signed CA certificate.
pub fn root(common_name: &str) -> Issued {
    let key = KeyPair::generate().unwrap();
    let issued = params(common_name, true).self_signed(&key).unwrap();
    wrap(issued, key)
}

/// Self-signed end-entity certificate.
pub fn self_signed_leaf(host: &str) -> Issued {
    let key = KeyPair::generate().unwrap();
    let issued = params(host, false).self_signed(&key).unwrap();
    wrap(issued, key)
}

/// Certificate for `common_name` issued by `issuer`.
pub fn issued_by(common_name: &str, ca: bool, issuer: &Issued) -> Issued {
    let key = KeyPair::generate().unwrap();
    let issued = params(common_name, ca)
        .signed_by(&key, &issuer.issued, &issuer.key)
        .unwrap();
    wrap(issued, key)
}
