//! # JOSE signing engine
//!
//! JOSE (JSON Object Signing and Encryption) is an IETF standard for
//! securely transferring data between parties using JSON. This crate
//! implements the signature-production half of that framework: given a
//! key, a set of JOSE headers and a payload, it resolves the declared
//! algorithm, checks that the key is allowed to perform it, computes the
//! signature over the canonical signing input and attaches the result to
//! a [`JWS`].
//!
//! The relevant pieces of the framework:
//!
//! * JWS (JSON Web Signature): how to sign any data; a JWS consists of
//!   headers, a payload and one or more signatures, with the covered
//!   parts encoded in Base64Url and joined by dots.
//!   See [`rfc7515`] for more details.
//!
//! * JWK (JSON Web Key): a JSON format for representing cryptographic
//!   keys, including the declared restrictions (`alg`, `use`) this crate
//!   enforces. See [`rfc7517`] for more details.
//!
//! * JWA (JSON Web Algorithm): the registry of named algorithms. The
//!   `alg` header parameter selects one; this crate models each
//!   algorithm as a small configuration over one generic routine and
//!   dispatches by name through an [`AlgorithmRegistry`].
//!   See [`rfc7518`] for more details.
//!
//! Cryptographic primitives are delegated to [`aws-lc-rs`]; this crate
//! only configures them (padding mode, digest) per algorithm variant.
//!
//! [`rfc7515`]: https://datatracker.ietf.org/doc/html/rfc7515
//! [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518
//! [`aws-lc-rs`]: https://docs.rs/aws-lc-rs

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod der;

mod error;
pub use error::{CryptoError, SignError};

mod jwa;
pub use jwa::{
    AlgorithmKind, EncryptionMode, KeyEncryptionAlgorithm, OaepDigest, RsaKeyWrap, RsaSignature,
    SignatureAlgorithm,
};

mod jwk;
pub use jwk::{JWK, JWKUse, KeyMaterial};

mod jws;
pub use jws::{Headers, JWS, Signature};

mod registry;
pub use registry::{AlgorithmProvider, AlgorithmRegistry};

mod signer;
pub use signer::Signer;

pub mod dep {
    //! Dependencies of this crate.
    //!
    //! Exported for your convenience

    pub mod aws_lc_rs {
        //! Re-export of the [`aws-lc-rs`] crate.
        //!
        //! [`aws-lc-rs`]: https://docs.rs/aws-lc-rs

        #[doc(inline)]
        pub use aws_lc_rs::*;
    }
}
