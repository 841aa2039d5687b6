use std::fmt;
use std::sync::Arc;

use aws_lc_rs::{
    digest::{Digest, SHA256, digest},
    rsa::{KeySize, PrivateDecryptingKey},
    signature::{KeyPair as _, RsaKeyPair},
};
use base64::{Engine as _, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::{der, error::CryptoError};

/// [`JWK`] is the key handed to the [`Signer`] and the algorithm
/// providers: declared restrictions (`alg`, `use`, `kid`) on top of the
/// actual RSA key material.
///
/// The declared attributes are enforced by the [`Signer`], never by the
/// key itself: a key declaring `use = "enc"` will be refused by
/// `add_signature`, and a key declaring an `alg` can only be used with
/// exactly that algorithm.
///
/// [`Signer`]: crate::Signer
#[derive(Debug, Clone)]
pub struct JWK {
    alg: Option<String>,
    usage: Option<JWKUse>,
    kid: Option<String>,
    material: KeyMaterial,
}

/// [`JWKUse`] identifies the intended use of the key,
/// the `use` parameter of [`rfc7517, section 4.2`].
///
/// [`rfc7517, section 4.2`]: https://datatracker.ietf.org/doc/html/rfc7517#section-4.2
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum JWKUse {
    #[serde(rename = "sig")]
    Signature,
    #[serde(rename = "enc")]
    Encryption,
}

/// The cryptographic material carried by a [`JWK`].
///
/// Which operations a key supports follows from its material, and a
/// provider fails with [`CryptoError::IncompatibleKey`] when asked for
/// an operation the material cannot perform.
#[derive(Clone)]
pub enum KeyMaterial {
    /// RSA private key pair, usable for signing and for deriving the
    /// public components.
    RsaSigning(Arc<RsaKeyPair>),
    /// RSA private decrypting key, usable for key wrap and unwrap.
    RsaDecrypting(PrivateDecryptingKey),
    /// Bare RSA public components (big-endian modulus and exponent),
    /// usable for verification and key wrap.
    RsaPublic { n: Vec<u8>, e: Vec<u8> },
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // private material is never printed
        f.write_str(match self {
            Self::RsaSigning(_) => "KeyMaterial::RsaSigning",
            Self::RsaDecrypting(_) => "KeyMaterial::RsaDecrypting",
            Self::RsaPublic { .. } => "KeyMaterial::RsaPublic",
        })
    }
}

/// Canonical thumbprint input for an RSA key.
///
/// Member order is significant: [`rfc7638, section 3.2`] requires the
/// required members in lexicographic order, here e, kty, n.
///
/// [`rfc7638, section 3.2`]: https://datatracker.ietf.org/doc/html/rfc7638#section-3.2
#[derive(Serialize)]
struct RsaThumbprintInput<'a> {
    e: &'a str,
    kty: &'static str,
    n: &'a str,
}

impl JWK {
    fn new(material: KeyMaterial) -> Self {
        Self {
            alg: None,
            usage: None,
            kid: None,
            material,
        }
    }

    /// Generate a fresh RSA signing key of the given size.
    pub fn generate_rsa(size: KeySize) -> Result<Self, CryptoError> {
        let key_pair = RsaKeyPair::generate(size)
            .map_err(|_| CryptoError::OperationFailed("generate RSA key pair"))?;
        Ok(Self::new(KeyMaterial::RsaSigning(Arc::new(key_pair))))
    }

    /// Generate a fresh RSA decrypting key of the given size, for use
    /// with the key-encryption algorithms.
    pub fn generate_rsa_decrypting(size: KeySize) -> Result<Self, CryptoError> {
        let key = PrivateDecryptingKey::generate(size)
            .map_err(|_| CryptoError::OperationFailed("generate RSA decrypting key"))?;
        Ok(Self::new(KeyMaterial::RsaDecrypting(key)))
    }

    /// Create a signing [`JWK`] from a PKCS#8 (v1) DER document.
    pub fn from_rsa_pkcs8_der(pkcs8_der: &[u8]) -> Result<Self, CryptoError> {
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8_der)?;
        Ok(Self::new(KeyMaterial::RsaSigning(Arc::new(key_pair))))
    }

    /// Create a decrypting [`JWK`] from a PKCS#8 (v1) DER document.
    pub fn from_rsa_decrypting_pkcs8_der(pkcs8_der: &[u8]) -> Result<Self, CryptoError> {
        let key = PrivateDecryptingKey::from_pkcs8(pkcs8_der)?;
        Ok(Self::new(KeyMaterial::RsaDecrypting(key)))
    }

    /// Create a public [`JWK`] from raw big-endian RSA components.
    pub fn from_rsa_public_components(n: impl Into<Vec<u8>>, e: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyMaterial::RsaPublic {
            n: n.into(),
            e: e.into(),
        })
    }

    /// Restrict this key to a single algorithm name.
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Declare the intended use of this key.
    pub fn with_use(mut self, usage: JWKUse) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Attach a key id to this key.
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// The algorithm this key is restricted to, if any.
    pub fn algorithm(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// The declared use of this key, if any.
    pub fn declared_use(&self) -> Option<JWKUse> {
        self.usage
    }

    /// The key id, if any.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub(crate) fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Raw big-endian public components `(n, e)` of this key.
    ///
    /// Available for signing keys and public keys; decrypting keys do
    /// not expose their components.
    pub fn public_components(&self) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        match &self.material {
            KeyMaterial::RsaSigning(key_pair) => {
                der::parse_rsa_public_key(key_pair.public_key().as_ref())
            }
            KeyMaterial::RsaPublic { n, e } => Ok((n.clone(), e.clone())),
            KeyMaterial::RsaDecrypting(_) => Err(CryptoError::IncompatibleKey(
                "decrypting keys do not expose public components",
            )),
        }
    }

    /// Derive the public [`JWK`] for this key, carrying over the
    /// declared attributes.
    pub fn public_jwk(&self) -> Result<Self, CryptoError> {
        let (n, e) = self.public_components()?;
        Ok(Self {
            alg: self.alg.clone(),
            usage: self.usage,
            kid: self.kid.clone(),
            material: KeyMaterial::RsaPublic { n, e },
        })
    }

    /// JWK thumbprint as defined in [`rfc7638`]: the SHA-256 digest of
    /// the canonical JSON of the required public members.
    ///
    /// [`rfc7638`]: https://datatracker.ietf.org/doc/html/rfc7638
    pub fn thumb_sha256(&self) -> Result<Digest, CryptoError> {
        let (n, e) = self.public_components()?;
        let input = RsaThumbprintInput {
            e: &BASE64_URL_SAFE_NO_PAD.encode(&e),
            kty: "RSA",
            n: &BASE64_URL_SAFE_NO_PAD.encode(&n),
        };
        let json = serde_json::to_vec(&input)
            .map_err(|_| CryptoError::OperationFailed("serialize thumbprint input"))?;
        Ok(digest(&SHA256, &json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbprint_member_order_is_canonical() {
        let input = RsaThumbprintInput {
            e: "e",
            kty: "RSA",
            n: "n",
        };
        let output = serde_json::to_string(&input).unwrap();
        assert_eq!(&output, r##"{"e":"e","kty":"RSA","n":"n"}"##);
    }

    #[test]
    fn public_jwk_matches_key_pair() {
        let key = JWK::generate_rsa(KeySize::Rsa2048)
            .unwrap()
            .with_algorithm("RS256")
            .with_key_id("k1");
        let public = key.public_jwk().unwrap();

        assert_eq!(public.algorithm(), Some("RS256"));
        assert_eq!(public.key_id(), Some("k1"));
        assert_eq!(
            key.public_components().unwrap(),
            public.public_components().unwrap()
        );
        assert_eq!(
            key.thumb_sha256().unwrap().as_ref(),
            public.thumb_sha256().unwrap().as_ref()
        );
    }

    #[test]
    fn generated_components_look_like_rsa_2048() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        let (n, e) = key.public_components().unwrap();
        assert_eq!(n.len(), 256);
        assert_eq!(e, vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn decrypting_keys_hide_components() {
        let key = JWK::generate_rsa_decrypting(KeySize::Rsa2048).unwrap();
        assert!(matches!(
            key.public_components(),
            Err(CryptoError::IncompatibleKey(_))
        ));
    }

    #[test]
    fn declared_attributes_round_trip() {
        let key = JWK::generate_rsa(KeySize::Rsa2048)
            .unwrap()
            .with_use(JWKUse::Encryption);
        assert_eq!(key.declared_use(), Some(JWKUse::Encryption));
        assert_eq!(key.algorithm(), None);
    }
}
