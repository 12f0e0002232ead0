//! Peer certificate metadata extracted after a handshake

use openssl::hash::MessageDigest;
use openssl::x509::{X509NameRef, X509Ref};
use serde::{Deserialize, Serialize};

/// One certificate of the chain a server presented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerCertificate {
    /// Distinguished name, e.g. `CN=example.com, O=Example`
    pub subject: String,
    pub issuer: String,
    /// Serial number in upper-case hex
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
    /// DNS subject alternative names
    pub dns_names: Vec<String>,
    /// SHA-256 over the DER encoding, colon separated hex
    pub fingerprint_sha256: String,
    #[serde(skip)]
    pub der: Vec<u8>,
}

impl PeerCertificate {
    /// Extract the printable fields of an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Result<Self, openssl::error::ErrorStack> {
        let serial = cert.serial_number().to_bn()?.to_hex_str()?.to_string();

        let dns_names = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let digest = cert.digest(MessageDigest::sha256())?;
        let fingerprint_sha256 = digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":");

        Ok(Self {
            subject: format_name(cert.subject_name()),
            issuer: format_name(cert.issuer_name()),
            serial,
            not_before: cert.not_before().to_string(),
            not_after: cert.not_after().to_string(),
            dns_names,
            fingerprint_sha256,
            der: cert.to_der()?,
        })
    }

    /// Common name of the subject, if present
    pub fn common_name(&self) -> Option<&str> {
        self.subject
            .split(", ")
            .find_map(|part| part.strip_prefix("CN="))
    }
}

fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(entry.data().as_slice()).into_owned());
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;
    use openssl::x509::extension::SubjectAlternativeName;
    use openssl::x509::{X509Builder, X509NameBuilder};

    fn self_signed() -> openssl::x509::X509 {
        let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("O", "Certsweep Test").unwrap();
        name.append_entry_by_text("CN", "scan.test").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(0xbeef).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&pkey).unwrap();
        builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
        let san = SubjectAlternativeName::new()
            .dns("scan.test")
            .dns("alt.scan.test")
            .build(&builder.x509v3_context(None, None))
            .unwrap();
        builder.append_extension(san).unwrap();
        builder.sign(&pkey, MessageDigest::sha256()).unwrap();
        builder.build()
    }

    #[test]
    fn test_from_x509() {
        let cert = self_signed();
        let info = PeerCertificate::from_x509(&cert).unwrap();

        assert_eq!(info.subject, "O=Certsweep Test, CN=scan.test");
        assert_eq!(info.subject, info.issuer);
        assert_eq!(info.serial, "BEEF");
        assert_eq!(info.dns_names, vec!["scan.test", "alt.scan.test"]);
        assert_eq!(info.common_name(), Some("scan.test"));
        assert_eq!(info.fingerprint_sha256.split(':').count(), 32);
        assert_eq!(info.der, cert.to_der().unwrap());
    }
}
