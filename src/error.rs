use std::{error, fmt};

use crate::jwk::JWKUse;

/// Errors raised by the signing path.
///
/// Every variant aborts the operation as a whole: the input [`JWS`] is
/// never modified when one of these is returned.
///
/// [`JWS`]: crate::JWS
#[derive(Debug)]
pub enum SignError {
    /// `add_signature` was called on a [`JWS`] without an embedded payload.
    ///
    /// [`JWS`]: crate::JWS
    MissingPayload,

    /// The merged JOSE headers carry no (string valued) `alg` parameter.
    MissingAlgorithm,

    /// The key declares an algorithm which differs from the header `alg`.
    AlgorithmKeyMismatch {
        key_alg: String,
        header_alg: String,
    },

    /// No algorithm with this name is registered.
    UnsupportedAlgorithm(String),

    /// The resolved algorithm exists but is not a signature algorithm.
    WrongCapability(String),

    /// The key declares a usage which does not permit signing.
    KeyUsage { declared: JWKUse },

    /// The cryptographic primitive rejected the key or the operation.
    Crypto(CryptoError),

    /// A header value was not a JSON object where one is required.
    Header(&'static str),

    /// Header data could not be (de)serialized to JSON.
    Json(serde_json::Error),
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPayload => f.write_str("no payload set on the JWS"),
            Self::MissingAlgorithm => {
                f.write_str("no \"alg\" parameter set in the merged JOSE headers")
            }
            Self::AlgorithmKeyMismatch { key_alg, header_alg } => write!(
                f,
                "key is restricted to algorithm {key_alg:?} but header declares {header_alg:?}"
            ),
            Self::UnsupportedAlgorithm(name) => {
                write!(f, "algorithm {name:?} is not supported")
            }
            Self::WrongCapability(name) => {
                write!(f, "algorithm {name:?} is not a signature algorithm")
            }
            Self::KeyUsage { declared } => {
                write!(f, "key usage {declared:?} does not permit signing")
            }
            Self::Crypto(err) => write!(f, "crypto operation failed: {err}"),
            Self::Header(reason) => f.write_str(reason),
            Self::Json(err) => write!(f, "header serialization failed: {err}"),
        }
    }
}

impl error::Error for SignError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Crypto(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CryptoError> for SignError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err)
    }
}

impl From<serde_json::Error> for SignError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Errors raised by a concrete cryptographic algorithm.
///
/// These surface structural problems with the key material or a failure
/// of the underlying primitive, never a plain verification mismatch
/// (that one is reported as `Ok(false)` by `verify`).
#[derive(Debug)]
pub enum CryptoError {
    /// The key material is the wrong shape for this algorithm.
    IncompatibleKey(&'static str),

    /// The backend rejected the key (e.g. insufficient key size).
    KeyRejected(String),

    /// The primitive operation itself failed.
    OperationFailed(&'static str),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleKey(reason) => write!(f, "incompatible key: {reason}"),
            Self::KeyRejected(reason) => write!(f, "key rejected: {reason}"),
            Self::OperationFailed(op) => write!(f, "operation failed: {op}"),
        }
    }
}

impl error::Error for CryptoError {}

impl From<aws_lc_rs::error::KeyRejected> for CryptoError {
    fn from(err: aws_lc_rs::error::KeyRejected) -> Self {
        Self::KeyRejected(err.to_string())
    }
}
