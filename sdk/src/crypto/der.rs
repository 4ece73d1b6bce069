//! DER framing for key material.
//!
//! Keys travel in three shapes: raw bytes, PKCS#8 `PrivateKeyInfo` and SPKI
//! `SubjectPublicKeyInfo`. Encoding always uses the compact prefixed forms
//! from [`crate::config`], which is what every wallet in the ecosystem
//! emits. Decoding goes through a real ASN.1 parser so that the standard
//! `id-ecPublicKey` wrappers produced by OpenSSL are accepted too.

use pkcs8::der::asn1::OctetStringRef;
use pkcs8::der::Decode;
use pkcs8::spki::SubjectPublicKeyInfoRef;
use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use zeroize::Zeroizing;

use super::keys::{KeyError, KeyScheme};
use crate::config;

/// `id-Ed25519` (RFC 8410).
pub const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// `secp256k1` named curve (SEC 2).
pub const SECP256K1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

/// `id-ecPublicKey` (RFC 5480). Curve carried in the algorithm parameters.
pub const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Wraps raw private key bytes in the compact PKCS#8 framing.
pub fn encode_private_key(scheme: KeyScheme, key: &[u8]) -> Vec<u8> {
    let prefix = match scheme {
        KeyScheme::Ed25519 => config::ED25519_PRIVATE_KEY_DER_PREFIX,
        KeyScheme::EcdsaSecp256k1 => config::ECDSA_PRIVATE_KEY_DER_PREFIX,
    };
    with_prefix(prefix, key)
}

/// Wraps raw public key bytes (compressed for ECDSA) in the compact SPKI
/// framing.
pub fn encode_public_key(scheme: KeyScheme, key: &[u8]) -> Vec<u8> {
    let prefix = match scheme {
        KeyScheme::Ed25519 => config::ED25519_PUBLIC_KEY_DER_PREFIX,
        KeyScheme::EcdsaSecp256k1 => config::ECDSA_PUBLIC_KEY_DER_PREFIX,
    };
    with_prefix(prefix, key)
}

fn with_prefix(prefix_hex: &str, key: &[u8]) -> Vec<u8> {
    // The prefixes are compile-time constants checked by a unit test.
    let mut out = hex::decode(prefix_hex).unwrap_or_default();
    out.extend_from_slice(key);
    out
}

/// Parses a PKCS#8 document into its scheme and the raw 32-byte secret.
///
/// Anything that does not parse as `PrivateKeyInfo` is reported as a length
/// problem, because from the caller's side it is: the bytes matched neither
/// the raw nor the DER framing.
pub fn decode_private_key(der: &[u8]) -> Result<(KeyScheme, Zeroizing<Vec<u8>>), KeyError> {
    let info = PrivateKeyInfo::try_from(der).map_err(|_| KeyError::InvalidKeyLength(der.len()))?;
    let oid = info.algorithm.oid;

    if oid == ED25519_OID {
        let secret = unwrap_octet_string(info.private_key)?;
        return Ok((KeyScheme::Ed25519, secret));
    }

    if oid == SECP256K1_OID {
        let secret = unwrap_octet_string(info.private_key)?;
        return Ok((KeyScheme::EcdsaSecp256k1, secret));
    }

    if oid == EC_PUBLIC_KEY_OID {
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|_| KeyError::UnsupportedScheme(oid.to_string()))?;
        if curve != SECP256K1_OID {
            return Err(KeyError::UnsupportedScheme(curve.to_string()));
        }
        let secret = k256::SecretKey::from_sec1_der(info.private_key)
            .map_err(|_| KeyError::InvalidKeyBytes(KeyScheme::EcdsaSecp256k1))?;
        return Ok((
            KeyScheme::EcdsaSecp256k1,
            Zeroizing::new(secret.to_bytes().to_vec()),
        ));
    }

    Err(KeyError::UnsupportedScheme(oid.to_string()))
}

/// Parses an SPKI document into its scheme and the raw public key bytes.
/// ECDSA keys may come back compressed (33 bytes) or uncompressed (65).
pub fn decode_public_key(der: &[u8]) -> Result<(KeyScheme, Vec<u8>), KeyError> {
    let spki =
        SubjectPublicKeyInfoRef::from_der(der).map_err(|_| KeyError::InvalidKeyLength(der.len()))?;
    let oid = spki.algorithm.oid;
    let raw = spki.subject_public_key.raw_bytes();

    if oid == ED25519_OID {
        return Ok((KeyScheme::Ed25519, raw.to_vec()));
    }

    if oid == SECP256K1_OID {
        // The compact form nests the point in an OCTET STRING inside the
        // BIT STRING: 04 21 <33 bytes>.
        let point = match raw {
            [0x04, 0x21, rest @ ..] if rest.len() == 33 => rest,
            _ => raw,
        };
        return Ok((KeyScheme::EcdsaSecp256k1, point.to_vec()));
    }

    if oid == EC_PUBLIC_KEY_OID {
        let curve = spki
            .algorithm
            .parameters_oid()
            .map_err(|_| KeyError::UnsupportedScheme(oid.to_string()))?;
        if curve != SECP256K1_OID {
            return Err(KeyError::UnsupportedScheme(curve.to_string()));
        }
        return Ok((KeyScheme::EcdsaSecp256k1, raw.to_vec()));
    }

    Err(KeyError::UnsupportedScheme(oid.to_string()))
}

fn unwrap_octet_string(bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let octets = OctetStringRef::from_der(bytes).map_err(|_| KeyError::InvalidKeyLength(bytes.len()))?;
    Ok(Zeroizing::new(octets.as_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_SECRET: &str = "db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10";

    #[test]
    fn compact_ed25519_private_key_round_trips() {
        let secret = hex::decode(ED25519_SECRET).unwrap();
        let der = encode_private_key(KeyScheme::Ed25519, &secret);
        assert_eq!(
            hex::encode(&der),
            format!("{}{}", config::ED25519_PRIVATE_KEY_DER_PREFIX, ED25519_SECRET)
        );

        let (scheme, decoded) = decode_private_key(&der).unwrap();
        assert_eq!(scheme, KeyScheme::Ed25519);
        assert_eq!(decoded.as_slice(), secret.as_slice());
    }

    #[test]
    fn compact_ecdsa_private_key_is_recognized() {
        let der = hex::decode(
            "3030020100300706052b8104000a04220420d790c27a81d745ad3340e27dacedc982d1f9252c0d7a4582da9847e2094603d4",
        )
        .unwrap();
        let (scheme, decoded) = decode_private_key(&der).unwrap();
        assert_eq!(scheme, KeyScheme::EcdsaSecp256k1);
        assert_eq!(
            hex::encode(decoded.as_slice()),
            "d790c27a81d745ad3340e27dacedc982d1f9252c0d7a4582da9847e2094603d4"
        );
    }

    #[test]
    fn compact_ecdsa_public_key_strips_inner_octet_string() {
        let der = hex::decode(
            "302f300706052b8104000a032400042102b46925b64940f5d7d3f394aba914c05f1607fa42e9e721afee0770cb55797d99",
        )
        .unwrap();
        let (scheme, point) = decode_public_key(&der).unwrap();
        assert_eq!(scheme, KeyScheme::EcdsaSecp256k1);
        assert_eq!(point.len(), 33);
        assert_eq!(point[0], 0x02);
    }

    #[test]
    fn unknown_algorithm_is_unsupported() {
        // PKCS#8 with the X25519 OID (1.3.101.110).
        let der = hex::decode(format!("302e020100300506032b656e04220420{}", ED25519_SECRET)).unwrap();
        match decode_private_key(&der) {
            Err(KeyError::UnsupportedScheme(oid)) => assert_eq!(oid, "1.3.101.110"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_length_error() {
        let err = decode_private_key(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, KeyError::InvalidKeyLength(4)));
    }
}
