use std::collections::HashMap;
use std::sync::Arc;

use crate::jwa::{
    AlgorithmKind, KeyEncryptionAlgorithm, RsaKeyWrap, RsaSignature, SignatureAlgorithm,
};

/// A registered algorithm, tagged with its capability.
///
/// The [`Signer`] resolves a name to one of these and refuses anything
/// that is not [`AlgorithmProvider::Signature`].
///
/// [`Signer`]: crate::Signer
#[derive(Clone)]
pub enum AlgorithmProvider {
    Signature(Arc<dyn SignatureAlgorithm>),
    KeyEncryption(Arc<dyn KeyEncryptionAlgorithm>),
}

impl AlgorithmProvider {
    /// The stable, case-sensitive algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signature(algorithm) => algorithm.name(),
            Self::KeyEncryption(algorithm) => algorithm.name(),
        }
    }

    /// The capability of this provider.
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Signature(_) => AlgorithmKind::Signature,
            Self::KeyEncryption(_) => AlgorithmKind::KeyEncryption,
        }
    }
}

impl std::fmt::Debug for AlgorithmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmProvider")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Maps algorithm names to providers.
///
/// Built once at startup and shared immutably afterwards; names are
/// unique within a registry and registering an existing name replaces
/// the previous provider.
#[derive(Default, Debug)]
pub struct AlgorithmRegistry {
    providers: HashMap<String, AlgorithmProvider>,
}

impl AlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in RSA algorithm variants.
    pub fn with_default_algorithms() -> Self {
        let mut registry = Self::new();
        for algorithm in RsaSignature::ALL {
            registry.register_signature(Arc::new(algorithm));
        }
        for algorithm in RsaKeyWrap::ALL {
            registry.register_key_encryption(Arc::new(algorithm));
        }
        registry
    }

    /// Register a provider under its own name.
    pub fn register(&mut self, provider: AlgorithmProvider) {
        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Register a signature algorithm.
    pub fn register_signature(&mut self, algorithm: Arc<dyn SignatureAlgorithm>) {
        self.register(AlgorithmProvider::Signature(algorithm));
    }

    /// Register a key-encryption algorithm.
    pub fn register_key_encryption(&mut self, algorithm: Arc<dyn KeyEncryptionAlgorithm>) {
        self.register(AlgorithmProvider::KeyEncryption(algorithm));
    }

    /// Resolve an algorithm by its case-sensitive name.
    pub fn resolve(&self, name: &str) -> Option<&AlgorithmProvider> {
        self.providers.get(name)
    }

    /// Names of all registered algorithms, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_algorithms_resolve_by_exact_name() {
        let registry = AlgorithmRegistry::with_default_algorithms();
        assert_eq!(registry.len(), 10);

        let provider = registry.resolve("RS256").unwrap();
        assert_eq!(provider.kind(), AlgorithmKind::Signature);
        assert_eq!(provider.name(), "RS256");

        let provider = registry.resolve("RSA-OAEP").unwrap();
        assert_eq!(provider.kind(), AlgorithmKind::KeyEncryption);

        // names are case-sensitive
        assert!(registry.resolve("rs256").is_none());
        assert!(registry.resolve("RS999").is_none());
    }

    #[test]
    fn registering_same_name_replaces() {
        let mut registry = AlgorithmRegistry::new();
        registry.register_signature(Arc::new(RsaSignature::Rs256));
        registry.register_signature(Arc::new(RsaSignature::Rs256));
        assert_eq!(registry.len(), 1);
    }
}
