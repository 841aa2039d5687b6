use base64::{Engine as _, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{
    Deserialize, Serialize,
    de::Error as _,
    ser::{Error as _, SerializeStruct as _},
};
use serde_json::{Map, Value};

use crate::error::SignError;

/// [`Headers`] store protected or unprotected JOSE headers as JSON
/// values.
///
/// An empty header fragment is not stored as an empty mapping: it
/// normalizes to the absent state and is omitted from any serialized
/// form.
#[derive(Default, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Headers(Option<Map<String, Value>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set provided header in the header map
    ///
    /// Warning: this function will replace an already existing header
    /// with the same name.
    pub fn try_set_header(
        &mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<(), SignError> {
        let value = serde_json::to_value(value)?;
        self.0.get_or_insert_default().insert(name.into(), value);
        Ok(())
    }

    /// Set provided header in the header map
    ///
    /// Warning: this function will replace an already existing header
    /// with the same name.
    pub fn try_with_header(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, SignError> {
        self.try_set_header(name, value)?;
        Ok(self)
    }

    /// Set provided headers in the header map
    ///
    /// The input has to serialize to a JSON object; existing headers
    /// with colliding names are replaced.
    pub fn try_set_headers(&mut self, headers: impl Serialize) -> Result<(), SignError> {
        let mut headers = match serde_json::to_value(headers)? {
            Value::Object(map) => map,
            _ => {
                return Err(SignError::Header(
                    "can only set multiple headers if input is a key value object",
                ));
            }
        };
        match &mut self.0 {
            Some(existing) => existing.append(&mut headers),
            None => self.0 = Some(headers),
        }
        Ok(())
    }

    /// Set provided headers in the header map
    ///
    /// The input has to serialize to a JSON object; existing headers
    /// with colliding names are replaced.
    pub fn try_with_headers(mut self, headers: impl Serialize) -> Result<Self, SignError> {
        self.try_set_headers(headers)?;
        Ok(self)
    }

    /// Get the value stored under the given header name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.as_ref().and_then(|headers| headers.get(name))
    }

    /// Try decode headers to the provided `T`
    pub fn decode<'de, 'a: 'de, T>(&'a self) -> Result<T, SignError>
    where
        T: Deserialize<'de>,
    {
        match &self.0 {
            Some(headers) => Ok(T::deserialize(headers)?),
            None => Err(SignError::Header(
                "headers are absent, deserialize not supported",
            )),
        }
    }

    /// Encode headers to their base64 url safe representation; absent
    /// headers encode to the empty string.
    pub fn as_encoded_string(&self) -> Result<String, SignError> {
        let encoded = match &self.0 {
            Some(headers) => {
                let headers = serde_json::to_vec(headers)?;
                BASE64_URL_SAFE_NO_PAD.encode(headers)
            }
            None => String::new(),
        };
        Ok(encoded)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Some(headers) => headers.is_empty(),
            None => true,
        }
    }

    pub(crate) fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Normalize the empty-mapping state to the absent state.
    pub(crate) fn normalized(mut self) -> Self {
        if self.0.as_ref().is_some_and(|headers| headers.is_empty()) {
            self.0 = None;
        }
        self
    }

    fn as_map(&self) -> Option<&Map<String, Value>> {
        self.0.as_ref()
    }
}

impl From<Map<String, Value>> for Headers {
    fn from(map: Map<String, Value>) -> Self {
        Self(Some(map)).normalized()
    }
}

/// A single signature over a [`JWS`], combining protected headers
/// (covered by the signature), unprotected headers (carried alongside)
/// and the raw signature bytes.
///
/// A record starts out unsigned and transitions exactly once to the
/// signed state, under control of the [`Signer`]; once signed it exposes
/// no mutators.
///
/// [`Signer`]: crate::Signer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    protected: Headers,
    unprotected: Headers,
    signature: Option<Vec<u8>>,
}

impl Signature {
    pub(crate) fn new(protected: Headers, unprotected: Headers) -> Self {
        Self {
            protected: protected.normalized(),
            unprotected: unprotected.normalized(),
            signature: None,
        }
    }

    pub(crate) fn into_signed(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Reference to the protected [`Headers`]
    pub fn protected_headers(&self) -> &Headers {
        &self.protected
    }

    /// Reference to the unprotected [`Headers`]
    pub fn unprotected_headers(&self) -> &Headers {
        &self.unprotected
    }

    /// Read-only union of protected and unprotected headers, with
    /// protected entries taking precedence on name collision.
    ///
    /// Recomputed on demand, never stored.
    pub fn merged_headers(&self) -> Map<String, Value> {
        let mut merged = self.unprotected.as_map().cloned().unwrap_or_default();
        if let Some(protected) = self.protected.as_map() {
            for (name, value) in protected {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }

    /// The canonical base64 url safe encoding of the protected headers:
    /// the part of the signing input this record contributes.
    pub fn encoded_protected_headers(&self) -> Result<String, SignError> {
        self.protected.as_encoded_string()
    }

    /// The raw signature bytes, present once the record is signed.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let protected = self
            .protected
            .as_encoded_string()
            .map_err(S::Error::custom)?;

        let len = usize::from(!protected.is_empty())
            + usize::from(!self.unprotected.is_none())
            + usize::from(self.signature.is_some());
        let mut state = serializer.serialize_struct("Signature", len)?;
        if !protected.is_empty() {
            state.serialize_field("protected", &protected)?;
        }
        if !self.unprotected.is_none() {
            state.serialize_field("header", &self.unprotected)?;
        }
        if let Some(signature) = &self.signature {
            state.serialize_field("signature", &BASE64_URL_SAFE_NO_PAD.encode(signature))?;
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct SignatureWire {
    #[serde(default)]
    protected: Option<String>,
    #[serde(default)]
    header: Option<Map<String, Value>>,
    #[serde(default)]
    signature: Option<String>,
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = SignatureWire::deserialize(deserializer)?;

        let protected = match wire.protected.filter(|encoded| !encoded.is_empty()) {
            Some(encoded) => {
                let bytes = BASE64_URL_SAFE_NO_PAD
                    .decode(&encoded)
                    .map_err(D::Error::custom)?;
                let map: Map<String, Value> =
                    serde_json::from_slice(&bytes).map_err(D::Error::custom)?;
                Headers::from(map)
            }
            None => Headers::new(),
        };
        let unprotected = wire.header.map(Headers::from).unwrap_or_default();
        let signature = wire
            .signature
            .map(|signature| BASE64_URL_SAFE_NO_PAD.decode(signature))
            .transpose()
            .map_err(D::Error::custom)?;

        Ok(Self {
            protected,
            unprotected,
            signature,
        })
    }
}

/// [`JWS`] is a signed object in the general serialization layout of
/// [`rfc7515, section 7.2.1`]: an optional base64 url safe encoded
/// payload plus an ordered sequence of [`Signature`] records.
///
/// A missing payload signals the detached-payload flow. The payload is
/// fixed at construction; signatures are appended by the [`Signer`] and
/// only by constructing a new [`JWS`] value, so a value in hand is never
/// mutated behind the caller's back.
///
/// [`rfc7515, section 7.2.1`]: https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.1
/// [`Signer`]: crate::Signer
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct JWS {
    payload: Option<String>,
    signatures: Vec<Signature>,
}

impl JWS {
    /// Create a [`JWS`] without an embedded payload (the detached flow).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`JWS`] embedding the given raw payload, base64 url safe
    /// encoded.
    pub fn with_payload(payload: impl AsRef<[u8]>) -> Self {
        Self {
            payload: Some(BASE64_URL_SAFE_NO_PAD.encode(payload)),
            signatures: Vec::new(),
        }
    }

    /// Create a [`JWS`] from an already encoded payload.
    pub fn with_encoded_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
            signatures: Vec::new(),
        }
    }

    /// The base64 url safe encoded payload, if embedded.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The signature records attached so far, in attach order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub(crate) fn with_appended(&self, signature: Signature) -> Self {
        let mut signatures = Vec::with_capacity(self.signatures.len() + 1);
        signatures.extend(self.signatures.iter().cloned());
        signatures.push(signature);
        Self {
            payload: self.payload.clone(),
            signatures,
        }
    }
}

impl Serialize for JWS {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let len = 1 + usize::from(self.payload.is_some());
        let mut state = serializer.serialize_struct("JWS", len)?;
        if let Some(payload) = &self.payload {
            state.serialize_field("payload", payload)?;
        }
        state.serialize_field("signatures", &self.signatures)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct JWSWire {
    #[serde(default)]
    payload: Option<String>,
    #[serde(default)]
    signatures: Vec<Signature>,
}

impl<'de> Deserialize<'de> for JWS {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = JWSWire::deserialize(deserializer)?;
        Ok(Self {
            payload: wire.payload,
            signatures: wire.signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Extra<'a> {
        kid: &'a str,
        cty: &'a str,
    }

    #[test]
    fn empty_headers_normalize_to_absent() {
        let headers = Headers::new()
            .try_with_headers(serde_json::json!({}))
            .unwrap();
        assert!(headers.normalized().is_none());
    }

    #[test]
    fn merged_headers_prefer_protected() {
        let protected = Headers::new()
            .try_with_header("alg", "RS256")
            .unwrap()
            .try_with_header("kid", "protected-kid")
            .unwrap();
        let unprotected = Headers::new()
            .try_with_header("kid", "unprotected-kid")
            .unwrap()
            .try_with_header("cty", "text/plain")
            .unwrap();

        let record = Signature::new(protected, unprotected);
        let merged = record.merged_headers();

        assert_eq!(merged.get("alg").unwrap(), "RS256");
        assert_eq!(merged.get("kid").unwrap(), "protected-kid");
        assert_eq!(merged.get("cty").unwrap(), "text/plain");
    }

    #[test]
    fn encoded_protected_headers_are_deterministic() {
        let build = || {
            Headers::new()
                .try_with_headers(Extra {
                    kid: "key-1",
                    cty: "application/json",
                })
                .unwrap()
                .try_with_header("alg", "RS256")
                .unwrap()
        };
        let first = Signature::new(build(), Headers::new());
        let second = Signature::new(build(), Headers::new());
        assert_eq!(
            first.encoded_protected_headers().unwrap(),
            second.encoded_protected_headers().unwrap()
        );
    }

    #[test]
    fn absent_headers_encode_to_empty_string() {
        let headers = Headers::new();
        assert_eq!(headers.as_encoded_string().unwrap(), "");
    }

    #[test]
    fn record_transitions_to_signed_once() {
        let record = Signature::new(
            Headers::new().try_with_header("alg", "RS256").unwrap(),
            Headers::new(),
        );
        assert!(!record.is_signed());
        assert_eq!(record.signature(), None);

        let record = record.into_signed(vec![1, 2, 3]);
        assert!(record.is_signed());
        assert_eq!(record.signature(), Some([1u8, 2, 3].as_slice()));
    }

    #[test]
    fn serde_round_trip_general_layout() {
        let protected = Headers::new().try_with_header("alg", "RS256").unwrap();
        let unprotected = Headers::new().try_with_header("kid", "key-1").unwrap();
        let record = Signature::new(protected, unprotected).into_signed(vec![0xde, 0xad]);
        let jws = JWS::with_payload("hello").with_appended(record);

        let json = serde_json::to_value(&jws).unwrap();
        assert_eq!(json["payload"], "aGVsbG8");
        assert_eq!(json["signatures"][0]["header"]["kid"], "key-1");
        assert_eq!(json["signatures"][0]["signature"], "3q0");

        let decoded: JWS = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, jws);
    }

    #[test]
    fn detached_jws_serializes_without_payload() {
        let jws = JWS::new();
        let json = serde_json::to_value(&jws).unwrap();
        assert!(json.get("payload").is_none());
        assert_eq!(json["signatures"], serde_json::json!([]));
    }
}
