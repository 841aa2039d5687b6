use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    error::SignError,
    jwk::{JWK, JWKUse},
    jws::{Headers, JWS, Signature},
    registry::{AlgorithmProvider, AlgorithmRegistry},
};

/// [`Signer`] produces signatures over a [`JWS`] by resolving the
/// declared algorithm in an [`AlgorithmRegistry`], enforcing
/// key/algorithm consistency and appending the signed record.
///
/// Signing is a pure function over the input [`JWS`]: the result is a
/// new value with one record appended, and on any failure the error is
/// returned with the input untouched. One [`Signer`] can be shared
/// freely across threads.
#[derive(Debug, Clone)]
pub struct Signer {
    registry: Arc<AlgorithmRegistry>,
}

impl Signer {
    pub fn new(registry: Arc<AlgorithmRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this signer resolves algorithms in.
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Sign the embedded payload of `jws` with `key` and the given header
    /// fragments, returning a new [`JWS`] with the signed record appended.
    ///
    /// Fails with [`SignError::MissingPayload`] if `jws` has no embedded
    /// payload and with [`SignError::KeyUsage`] if the key declares a use
    /// other than signature.
    pub fn add_signature(
        &self,
        jws: &JWS,
        key: &JWK,
        protected: Headers,
        unprotected: Headers,
    ) -> Result<JWS, SignError> {
        let payload = jws.payload().ok_or(SignError::MissingPayload)?.to_owned();

        if let Some(declared) = key.declared_use()
            && declared != JWKUse::Signature
        {
            return Err(SignError::KeyUsage { declared });
        }

        self.add_signature_with_detached_payload(jws, key, &payload, protected, unprotected)
    }

    /// Sign the given (already encoded) detached payload with `key` and
    /// the supplied header fragments, returning a new [`JWS`] with the
    /// signed record appended.
    ///
    /// The signing input is the wire-fixed
    /// `base64url(protected_headers) "." detached_payload`. The `alg`
    /// parameter is required in the merged header view, and a key
    /// declaring its own `alg` must match it exactly.
    pub fn add_signature_with_detached_payload(
        &self,
        jws: &JWS,
        key: &JWK,
        detached_payload: &str,
        protected: Headers,
        unprotected: Headers,
    ) -> Result<JWS, SignError> {
        let record = Signature::new(protected, unprotected);

        let merged = record.merged_headers();
        let Some(alg) = merged.get("alg").and_then(Value::as_str) else {
            return Err(SignError::MissingAlgorithm);
        };

        if let Some(key_alg) = key.algorithm()
            && key_alg != alg
        {
            return Err(SignError::AlgorithmKeyMismatch {
                key_alg: key_alg.to_owned(),
                header_alg: alg.to_owned(),
            });
        }

        let Some(provider) = self.registry.resolve(alg) else {
            return Err(SignError::UnsupportedAlgorithm(alg.to_owned()));
        };
        let AlgorithmProvider::Signature(algorithm) = provider else {
            return Err(SignError::WrongCapability(alg.to_owned()));
        };
        trace!(algorithm = alg, "resolved signature algorithm");

        let encoded_protected = record.encoded_protected_headers()?;
        let signing_input = format!("{encoded_protected}.{detached_payload}");

        let signature = algorithm.sign(key, signing_input.as_bytes())?;
        debug!(
            algorithm = alg,
            signature_len = signature.len(),
            "appending signature record"
        );

        Ok(jws.with_appended(record.into_signed(signature)))
    }
}
