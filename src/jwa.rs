use aws_lc_rs::{
    rand::SystemRandom,
    rsa::{
        OAEP_SHA1_MGF1SHA1, OAEP_SHA256_MGF1SHA256, OAEP_SHA384_MGF1SHA384, OAEP_SHA512_MGF1SHA512,
        OaepAlgorithm, OaepPrivateDecryptingKey, OaepPublicEncryptingKey, PublicEncryptingKey,
    },
    signature::{
        RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
        RSA_PKCS1_SHA256, RSA_PKCS1_SHA384, RSA_PKCS1_SHA512, RSA_PSS_2048_8192_SHA256,
        RSA_PSS_2048_8192_SHA384, RSA_PSS_2048_8192_SHA512, RSA_PSS_SHA256, RSA_PSS_SHA384,
        RSA_PSS_SHA512, RsaEncoding, RsaParameters, RsaPublicKeyComponents, UnparsedPublicKey,
    },
};

use crate::{
    der,
    error::CryptoError,
    jwk::{JWK, KeyMaterial},
};

/// The capability of a JWA algorithm: what kind of operation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Produces and verifies digital signatures.
    Signature,
    /// Wraps and unwraps content-encryption keys.
    KeyEncryption,
}

/// A JWA signature algorithm, as defined in [`rfc7518, section 3`].
///
/// `name` is the stable, case-sensitive identifier from the IANA JOSE
/// registry. Implementations must never coerce incompatible key material:
/// a structurally wrong key fails with [`CryptoError`]. A signature that
/// simply does not match is `Ok(false)` from `verify`, not an error.
///
/// [`rfc7518, section 3`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3
pub trait SignatureAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn sign(&self, key: &JWK, message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn verify(&self, key: &JWK, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError>;
}

/// A JWA key-encryption algorithm, as defined in [`rfc7518, section 4`].
///
/// Shares the provider abstraction with [`SignatureAlgorithm`] but wraps
/// content-encryption keys instead of signing.
///
/// [`rfc7518, section 4`]: https://datatracker.ietf.org/doc/html/rfc7518#section-4
pub trait KeyEncryptionAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn wrap(&self, key: &JWK, cek: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn unwrap(&self, key: &JWK, wrapped: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// RSA signature algorithm variants.
///
/// Each variant is a configuration of the one generic RSA routine below:
/// it fixes the public name, the padding encoding and the digest, nothing
/// else. Adding a variant means adding a row to the matches, never a new
/// code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsaSignature {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    Rs512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    Ps256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    Ps384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    Ps512,
}

impl RsaSignature {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Ps256 => "PS256",
            Self::Ps384 => "PS384",
            Self::Ps512 => "PS512",
        }
    }

    /// All variants, for registry bootstrapping.
    pub const ALL: [Self; 6] = [
        Self::Rs256,
        Self::Rs384,
        Self::Rs512,
        Self::Ps256,
        Self::Ps384,
        Self::Ps512,
    ];

    fn encoding(&self) -> &'static dyn RsaEncoding {
        match self {
            Self::Rs256 => &RSA_PKCS1_SHA256,
            Self::Rs384 => &RSA_PKCS1_SHA384,
            Self::Rs512 => &RSA_PKCS1_SHA512,
            Self::Ps256 => &RSA_PSS_SHA256,
            Self::Ps384 => &RSA_PSS_SHA384,
            Self::Ps512 => &RSA_PSS_SHA512,
        }
    }

    fn verification(&self) -> &'static RsaParameters {
        match self {
            Self::Rs256 => &RSA_PKCS1_2048_8192_SHA256,
            Self::Rs384 => &RSA_PKCS1_2048_8192_SHA384,
            Self::Rs512 => &RSA_PKCS1_2048_8192_SHA512,
            Self::Ps256 => &RSA_PSS_2048_8192_SHA256,
            Self::Ps384 => &RSA_PSS_2048_8192_SHA384,
            Self::Ps512 => &RSA_PSS_2048_8192_SHA512,
        }
    }
}

impl SignatureAlgorithm for RsaSignature {
    fn name(&self) -> &'static str {
        Self::name(self)
    }

    fn sign(&self, key: &JWK, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let KeyMaterial::RsaSigning(key_pair) = key.material() else {
            return Err(CryptoError::IncompatibleKey(
                "RSA signing requires an RSA private key pair",
            ));
        };

        let mut signature = vec![0u8; key_pair.public_modulus_len()];
        key_pair
            .sign(
                self.encoding(),
                &SystemRandom::new(),
                message,
                &mut signature,
            )
            .map_err(|_| CryptoError::OperationFailed("RSA signing"))?;
        Ok(signature)
    }

    fn verify(&self, key: &JWK, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        match key.material() {
            KeyMaterial::RsaSigning(key_pair) => {
                use aws_lc_rs::signature::KeyPair as _;
                let public_key =
                    UnparsedPublicKey::new(self.verification(), key_pair.public_key().as_ref());
                Ok(public_key.verify(message, signature).is_ok())
            }
            KeyMaterial::RsaPublic { n, e } => {
                let components = RsaPublicKeyComponents { n, e };
                Ok(components
                    .verify(self.verification(), message, signature)
                    .is_ok())
            }
            KeyMaterial::RsaDecrypting(_) => Err(CryptoError::IncompatibleKey(
                "RSA verification requires an RSA signing or public key",
            )),
        }
    }
}

/// The padding mode of an RSA key-encryption variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Optimal asymmetric encryption padding, [`rfc8017, section 7.1`].
    ///
    /// [`rfc8017, section 7.1`]: https://datatracker.ietf.org/doc/html/rfc8017#section-7.1
    Oaep,
}

/// The digest an OAEP variant uses for padding and MGF1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OaepDigest {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// RSA key-encryption algorithm variants.
///
/// Same configuration-over-one-routine shape as [`RsaSignature`]: a
/// variant is the triple (name, encryption mode, digest). `RSA-OAEP`
/// fixes OAEP with SHA-1, the other variants only swap the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsaKeyWrap {
    /// RSAES OAEP using the default (SHA-1) parameters
    Oaep,
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256
    Oaep256,
    /// RSAES OAEP using SHA-384 and MGF1 with SHA-384
    Oaep384,
    /// RSAES OAEP using SHA-512 and MGF1 with SHA-512
    Oaep512,
}

impl RsaKeyWrap {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Oaep => "RSA-OAEP",
            Self::Oaep256 => "RSA-OAEP-256",
            Self::Oaep384 => "RSA-OAEP-384",
            Self::Oaep512 => "RSA-OAEP-512",
        }
    }

    /// All variants, for registry bootstrapping.
    pub const ALL: [Self; 4] = [Self::Oaep, Self::Oaep256, Self::Oaep384, Self::Oaep512];

    pub const fn encryption_mode(&self) -> EncryptionMode {
        EncryptionMode::Oaep
    }

    pub const fn digest(&self) -> OaepDigest {
        match self {
            Self::Oaep => OaepDigest::Sha1,
            Self::Oaep256 => OaepDigest::Sha256,
            Self::Oaep384 => OaepDigest::Sha384,
            Self::Oaep512 => OaepDigest::Sha512,
        }
    }

    fn oaep_algorithm(&self) -> &'static OaepAlgorithm {
        let EncryptionMode::Oaep = self.encryption_mode();
        match self.digest() {
            OaepDigest::Sha1 => &OAEP_SHA1_MGF1SHA1,
            OaepDigest::Sha256 => &OAEP_SHA256_MGF1SHA256,
            OaepDigest::Sha384 => &OAEP_SHA384_MGF1SHA384,
            OaepDigest::Sha512 => &OAEP_SHA512_MGF1SHA512,
        }
    }

    fn public_encrypting_key(key: &JWK) -> Result<PublicEncryptingKey, CryptoError> {
        match key.material() {
            KeyMaterial::RsaDecrypting(private) => Ok(private.public_key()),
            KeyMaterial::RsaPublic { .. } | KeyMaterial::RsaSigning(_) => {
                let (n, e) = key.public_components()?;
                let spki = der::subject_public_key_info(&n, &e);
                PublicEncryptingKey::from_der(&spki).map_err(Into::into)
            }
        }
    }
}

impl KeyEncryptionAlgorithm for RsaKeyWrap {
    fn name(&self) -> &'static str {
        Self::name(self)
    }

    fn wrap(&self, key: &JWK, cek: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let public_key = Self::public_encrypting_key(key)?;
        let oaep_key = OaepPublicEncryptingKey::new(public_key)
            .map_err(|_| CryptoError::OperationFailed("construct OAEP encrypting key"))?;

        let mut ciphertext = vec![0u8; oaep_key.ciphertext_size()];
        let written = oaep_key
            .encrypt(self.oaep_algorithm(), cek, &mut ciphertext, None)
            .map_err(|_| CryptoError::OperationFailed("OAEP key wrap"))?
            .len();
        ciphertext.truncate(written);
        Ok(ciphertext)
    }

    fn unwrap(&self, key: &JWK, wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let KeyMaterial::RsaDecrypting(private) = key.material() else {
            return Err(CryptoError::IncompatibleKey(
                "OAEP unwrap requires an RSA decrypting key",
            ));
        };
        let oaep_key = OaepPrivateDecryptingKey::new(private.clone())
            .map_err(|_| CryptoError::OperationFailed("construct OAEP decrypting key"))?;

        let mut cek = vec![0u8; oaep_key.min_output_size()];
        let written = oaep_key
            .decrypt(self.oaep_algorithm(), wrapped, &mut cek, None)
            .map_err(|_| CryptoError::OperationFailed("OAEP key unwrap"))?
            .len();
        cek.truncate(written);
        Ok(cek)
    }
}

#[cfg(test)]
mod tests {
    use aws_lc_rs::rsa::KeySize;

    use super::*;

    #[test]
    fn rsa_sign_verify_round_trip() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        let message = b"protected.payload";

        for algorithm in RsaSignature::ALL {
            let signature = algorithm.sign(&key, message).unwrap();
            assert_eq!(signature.len(), 256);
            assert!(algorithm.verify(&key, message, &signature).unwrap());
            assert!(!algorithm.verify(&key, b"tampered", &signature).unwrap());
        }
    }

    #[test]
    fn rsa_verify_with_public_components() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        let public = key.public_jwk().unwrap();
        let message = b"payload";

        let signature = RsaSignature::Rs256.sign(&key, message).unwrap();
        assert!(RsaSignature::Rs256.verify(&public, message, &signature).unwrap());

        let mut corrupted = signature.clone();
        corrupted[0] ^= 0x01;
        assert!(!RsaSignature::Rs256.verify(&public, message, &corrupted).unwrap());
    }

    #[test]
    fn rs256_is_deterministic() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        let message = b"same input";
        let first = RsaSignature::Rs256.sign(&key, message).unwrap();
        let second = RsaSignature::Rs256.sign(&key, message).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sign_rejects_public_key() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        let public = key.public_jwk().unwrap();
        assert!(matches!(
            RsaSignature::Rs256.sign(&public, b"message"),
            Err(CryptoError::IncompatibleKey(_))
        ));
    }

    #[test]
    fn oaep_wrap_unwrap_round_trip() {
        let key = JWK::generate_rsa_decrypting(KeySize::Rsa2048).unwrap();
        let cek = [0x42u8; 32];

        for algorithm in RsaKeyWrap::ALL {
            let wrapped = algorithm.wrap(&key, &cek).unwrap();
            assert_ne!(wrapped.as_slice(), cek.as_slice());
            let unwrapped = algorithm.unwrap(&key, &wrapped).unwrap();
            assert_eq!(unwrapped.as_slice(), cek.as_slice());
        }
    }

    #[test]
    fn oaep_configuration_triples() {
        assert_eq!(RsaKeyWrap::Oaep.name(), "RSA-OAEP");
        assert_eq!(RsaKeyWrap::Oaep.encryption_mode(), EncryptionMode::Oaep);
        assert_eq!(RsaKeyWrap::Oaep.digest(), OaepDigest::Sha1);
        assert_eq!(RsaKeyWrap::Oaep256.digest(), OaepDigest::Sha256);
    }

    #[test]
    fn unwrap_rejects_signing_key() {
        let key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
        assert!(matches!(
            RsaKeyWrap::Oaep.unwrap(&key, &[0u8; 256]),
            Err(CryptoError::IncompatibleKey(_))
        ));
    }

    #[test]
    fn wrap_accepts_public_components() {
        let private = JWK::generate_rsa_decrypting(KeySize::Rsa2048).unwrap();
        // a receiver-published public key: wrap there, unwrap with the private part
        let signing_style_public = {
            let sign_key = JWK::generate_rsa(KeySize::Rsa2048).unwrap();
            sign_key.public_jwk().unwrap()
        };
        let cek = [7u8; 32];
        // wrapping with an unrelated public key must still produce a ciphertext
        let wrapped = RsaKeyWrap::Oaep256.wrap(&signing_style_public, &cek).unwrap();
        assert_eq!(wrapped.len(), 256);
        // but the unrelated private key cannot recover it
        assert!(RsaKeyWrap::Oaep256.unwrap(&private, &wrapped).is_err());
    }
}
