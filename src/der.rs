//! Minimal DER encode/parse support for RSA public key material.
//!
//! Only the handful of shapes the RSA providers need are implemented:
//! the `RSAPublicKey` sequence from section 2.3.1 of
//! [RFC 3279](https://datatracker.ietf.org/doc/rfc3279/) and the
//! `SubjectPublicKeyInfo` wrapper from section 4.1 of
//! [RFC 5280](https://datatracker.ietf.org/doc/rfc5280/). This is
//! ***NOT*** a general ASN.1 codec and must not be used as one.

use crate::error::CryptoError;

/// Identifier tag for a DER encoded integer.
/// Defined in [ITU X.680](https://www.itu.int/ITU-T/studygroups/com17/languages/X.680-0207.pdf).
const TAG_INTEGER: u8 = 0x02;
/// Identifier tag for a DER encoded bit string.
const TAG_BIT_STRING: u8 = 0x03;
/// Identifier tag for a DER encoded sequence.
const TAG_SEQUENCE: u8 = 0x30;
/// Maximum length encodable in the short form, per section 8.1.3 of
/// [ITU X.690](https://www.itu.int/ITU-T/studygroups/com17/languages/X.690-0207.pdf).
const LENGTH_SHORT_FORM_MAX: usize = 127;
/// Octet indicating that no unused bits are present in a bit string.
const BIT_STRING_NO_UNUSED_BITS: u8 = 0x00;
/// High bit of the leading content octet; set means "negative" for
/// integers and "long form" for length octets.
const HIGH_BIT_MASK: u8 = 0x80;

/// DER encoded rsaEncryption `AlgorithmIdentifier`.
///
/// OID `1.2.840.113549.1.1.1` from appendix C of
/// [RFC 8017](https://datatracker.ietf.org/doc/rfc8017/), with the NULL
/// parameter required by section 2.2.1 of
/// [RFC 3279](https://www.rfc-editor.org/rfc/rfc3279.html).
const RSA_ALGORITHM_IDENTIFIER: [u8; 15] = [
    TAG_SEQUENCE,
    0x0d, // length of what follows
    0x06, // OBJECT IDENTIFIER
    0x09, // length of the oid
    0x2a,
    0x86,
    0x48,
    0x86,
    0xf7,
    0x0d,
    0x01,
    0x01,
    0x01,
    0x05, // NULL
    0x00,
];

/// Encode a length per section 8.1.3 of ITU X.690: short form up to 127,
/// otherwise `0x80 | count` followed by the big-endian byte count.
fn encode_length(len: usize) -> Vec<u8> {
    if len <= LENGTH_SHORT_FORM_MAX {
        return vec![len as u8];
    }
    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    let mut out = Vec::with_capacity(1 + be.len() - skip);
    out.push(HIGH_BIT_MASK | (be.len() - skip) as u8);
    out.extend_from_slice(&be[skip..]);
    out
}

/// Encode an unsigned big-endian integer as a DER INTEGER.
///
/// Leading zero octets are stripped first, then a single zero octet is
/// prepended when the value would otherwise read as negative.
pub(crate) fn encode_integer(value: &[u8]) -> Vec<u8> {
    let skip = value
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(value.len().saturating_sub(1));
    let value = &value[skip..];

    let needs_leading_zero = value.is_empty() || value[0] & HIGH_BIT_MASK != 0;
    let content_len = value.len() + usize::from(needs_leading_zero);
    let len_bytes = encode_length(content_len);

    let mut out = Vec::with_capacity(1 + len_bytes.len() + content_len);
    out.push(TAG_INTEGER);
    out.extend_from_slice(&len_bytes);
    if needs_leading_zero {
        out.push(0);
    }
    out.extend_from_slice(value);
    out
}

fn encode_sequence(content: &[u8]) -> Vec<u8> {
    let len_bytes = encode_length(content.len());
    let mut out = Vec::with_capacity(1 + len_bytes.len() + content.len());
    out.push(TAG_SEQUENCE);
    out.extend_from_slice(&len_bytes);
    out.extend_from_slice(content);
    out
}

/// Build the `RSAPublicKey ::= SEQUENCE { modulus, publicExponent }`
/// structure from raw big-endian modulus and exponent bytes.
pub(crate) fn rsa_public_key(n: &[u8], e: &[u8]) -> Vec<u8> {
    let mut content = encode_integer(n);
    content.extend_from_slice(&encode_integer(e));
    encode_sequence(&content)
}

/// Build a `SubjectPublicKeyInfo` carrying an RSA public key, the format
/// `aws-lc-rs` expects when constructing a public encrypting key.
pub(crate) fn subject_public_key_info(n: &[u8], e: &[u8]) -> Vec<u8> {
    let key = rsa_public_key(n, e);

    let mut bit_string_content = Vec::with_capacity(1 + key.len());
    bit_string_content.push(BIT_STRING_NO_UNUSED_BITS);
    bit_string_content.extend_from_slice(&key);

    let bit_len_bytes = encode_length(bit_string_content.len());
    let mut content = Vec::with_capacity(
        RSA_ALGORITHM_IDENTIFIER.len() + 1 + bit_len_bytes.len() + bit_string_content.len(),
    );
    content.extend_from_slice(&RSA_ALGORITHM_IDENTIFIER);
    content.push(TAG_BIT_STRING);
    content.extend_from_slice(&bit_len_bytes);
    content.extend_from_slice(&bit_string_content);

    encode_sequence(&content)
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, CryptoError> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or(CryptoError::IncompatibleKey("truncated DER input"))?;
        self.pos += 1;
        Ok(b)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], CryptoError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(CryptoError::IncompatibleKey("truncated DER input"))?;
        let out = &self.input[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn length(&mut self) -> Result<usize, CryptoError> {
        let first = self.byte()?;
        if first & HIGH_BIT_MASK == 0 {
            return Ok(first as usize);
        }
        let count = (first & !HIGH_BIT_MASK) as usize;
        if count == 0 || count > size_of::<usize>() {
            return Err(CryptoError::IncompatibleKey("unsupported DER length"));
        }
        let mut len = 0usize;
        for b in self.bytes(count)? {
            len = (len << 8) | *b as usize;
        }
        Ok(len)
    }

    fn expect_tag(&mut self, tag: u8) -> Result<usize, CryptoError> {
        if self.byte()? != tag {
            return Err(CryptoError::IncompatibleKey("unexpected DER tag"));
        }
        self.length()
    }

    fn integer(&mut self) -> Result<&'a [u8], CryptoError> {
        let len = self.expect_tag(TAG_INTEGER)?;
        let mut content = self.bytes(len)?;
        while content.len() > 1 && content[0] == 0 {
            content = &content[1..];
        }
        Ok(content)
    }
}

/// Parse an `RSAPublicKey` sequence back into `(modulus, exponent)` raw
/// big-endian bytes, with the sign-padding zero octet stripped.
///
/// Inverse of [`rsa_public_key`]; used to recover the public components
/// of a key pair the backend only exposes in DER form.
pub(crate) fn parse_rsa_public_key(input: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let mut reader = Reader::new(input);
    let _seq_len = reader.expect_tag(TAG_SEQUENCE)?;
    let n = reader.integer()?.to_vec();
    let e = reader.integer()?.to_vec();
    Ok((n, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_short_and_long_form() {
        assert_eq!(encode_length(0), vec![0x00]);
        assert_eq!(encode_length(127), vec![0x7f]);
        assert_eq!(encode_length(128), vec![0x81, 0x80]);
        assert_eq!(encode_length(256), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn integer_sign_padding() {
        // high bit set: needs a leading zero so it stays positive
        assert_eq!(encode_integer(&[0x80]), vec![0x02, 0x02, 0x00, 0x80]);
        // high bit clear: encoded as is
        assert_eq!(encode_integer(&[0x7f]), vec![0x02, 0x01, 0x7f]);
        // redundant leading zeros are stripped before encoding
        assert_eq!(encode_integer(&[0x00, 0x00, 0x01]), vec![0x02, 0x01, 0x01]);
    }

    #[test]
    fn public_key_round_trip() {
        let n = vec![0xc2, 0x3f, 0x91, 0x00, 0x5a];
        let e = vec![0x01, 0x00, 0x01];
        let der = rsa_public_key(&n, &e);
        let (parsed_n, parsed_e) = parse_rsa_public_key(&der).unwrap();
        assert_eq!(parsed_n, n);
        assert_eq!(parsed_e, e);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_rsa_public_key(&[]).is_err());
        assert!(parse_rsa_public_key(&[0x02, 0x01, 0x01]).is_err());
        assert!(parse_rsa_public_key(&[0x30, 0x05, 0x02, 0x01]).is_err());
    }

    #[test]
    fn spki_wraps_public_key() {
        let n = vec![0xab; 256];
        let e = vec![0x01, 0x00, 0x01];
        let spki = subject_public_key_info(&n, &e);
        let inner = rsa_public_key(&n, &e);
        // the RSAPublicKey sequence must appear verbatim inside the wrapper
        assert!(
            spki.windows(inner.len()).any(|window| window == inner),
            "SPKI does not embed the RSAPublicKey sequence"
        );
        assert_eq!(spki[0], 0x30);
    }
}
