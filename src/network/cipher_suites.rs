//! Known TLS cipher suites
//!
//! The table is immutable and lives in static memory; the id index is built
//! on first use and read-only afterwards.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A TLS cipher suite the scanner knows how to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite {
    /// IANA identifier as sent on the wire
    pub id: u16,
    /// IANA / RFC name
    pub name: &'static str,
    /// Name OpenSSL accepts in a cipher list (equals `name` for TLS 1.3)
    pub openssl_name: &'static str,
    /// Negotiable only under TLS 1.3
    pub tls13: bool,
}

const fn suite(id: u16, name: &'static str, openssl_name: &'static str) -> CipherSuite {
    CipherSuite { id, name, openssl_name, tls13: false }
}

const fn suite13(id: u16, name: &'static str) -> CipherSuite {
    CipherSuite { id, name, openssl_name: name, tls13: true }
}

static CIPHER_SUITES: [CipherSuite; 25] = [
    suite(0x0005, "TLS_RSA_WITH_RC4_128_SHA", "RC4-SHA"),
    suite(0x000a, "TLS_RSA_WITH_3DES_EDE_CBC_SHA", "DES-CBC3-SHA"),
    suite(0x002f, "TLS_RSA_WITH_AES_128_CBC_SHA", "AES128-SHA"),
    suite(0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA", "AES256-SHA"),
    suite(0x003c, "TLS_RSA_WITH_AES_128_CBC_SHA256", "AES128-SHA256"),
    suite(0x009c, "TLS_RSA_WITH_AES_128_GCM_SHA256", "AES128-GCM-SHA256"),
    suite(0x009d, "TLS_RSA_WITH_AES_256_GCM_SHA384", "AES256-GCM-SHA384"),
    suite(0xc007, "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA", "ECDHE-ECDSA-RC4-SHA"),
    suite(0xc009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA", "ECDHE-ECDSA-AES128-SHA"),
    suite(0xc00a, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA", "ECDHE-ECDSA-AES256-SHA"),
    suite(0xc011, "TLS_ECDHE_RSA_WITH_RC4_128_SHA", "ECDHE-RSA-RC4-SHA"),
    suite(0xc012, "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA", "ECDHE-RSA-DES-CBC3-SHA"),
    suite(0xc013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA", "ECDHE-RSA-AES128-SHA"),
    suite(0xc014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA", "ECDHE-RSA-AES256-SHA"),
    suite(0xc023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256", "ECDHE-ECDSA-AES128-SHA256"),
    suite(0xc027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256", "ECDHE-RSA-AES128-SHA256"),
    suite(0xc02f, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", "ECDHE-RSA-AES128-GCM-SHA256"),
    suite(0xc02b, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256", "ECDHE-ECDSA-AES128-GCM-SHA256"),
    suite(0xc030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384", "ECDHE-RSA-AES256-GCM-SHA384"),
    suite(0xc02c, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384", "ECDHE-ECDSA-AES256-GCM-SHA384"),
    suite(0xcca8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256", "ECDHE-RSA-CHACHA20-POLY1305"),
    suite(0xcca9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256", "ECDHE-ECDSA-CHACHA20-POLY1305"),
    suite13(0x1301, "TLS_AES_128_GCM_SHA256"),
    suite13(0x1302, "TLS_AES_256_GCM_SHA384"),
    suite13(0x1303, "TLS_CHACHA20_POLY1305_SHA256"),
];

static BY_ID: Lazy<HashMap<u16, &'static CipherSuite>> =
    Lazy::new(|| CIPHER_SUITES.iter().map(|s| (s.id, s)).collect());

/// Every suite the scanner can enumerate, in table order
pub fn all() -> &'static [CipherSuite] {
    &CIPHER_SUITES
}

/// Look up a suite by its IANA identifier
pub fn lookup(id: u16) -> Option<&'static CipherSuite> {
    BY_ID.get(&id).copied()
}

/// Canonical name for an identifier, or its hex form when unknown
pub fn name_of(id: u16) -> String {
    match lookup(id) {
        Some(suite) => suite.name.to_string(),
        None => format!("0x{:04x}", id),
    }
}
