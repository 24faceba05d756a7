use sha2::{Digest, Sha256};

type TokenHash = [u8; 32];

fn hash_token(token: &str) -> TokenHash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(token.as_bytes()));
    hash
}

/// The set of bearer tokens accepted on protected routes.
///
/// Only SHA-256 digests are kept in memory. Lookups compare every stored
/// digest in full, so timing does not depend on where a mismatch occurs.
#[derive(Clone, Default)]
pub struct ApiTokens {
    hashes: Vec<TokenHash>,
}

impl ApiTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: tokens
                .into_iter()
                .map(|t| hash_token(t.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn verify(&self, token: &str) -> bool {
        let presented = hash_token(token);
        self.hashes
            .iter()
            .fold(false, |found, stored| found | digests_equal(stored, &presented))
    }
}

impl std::fmt::Debug for ApiTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokens")
            .field("count", &self.hashes.len())
            .finish()
    }
}

fn digests_equal(a: &TokenHash, b: &TokenHash) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
