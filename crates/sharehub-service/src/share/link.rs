//! Share token generation.

use rand::Rng;

/// Characters random tokens are drawn from. All are URL-path safe.
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-";

/// Length of generated tokens.
pub const RANDOM_TOKEN_LENGTH: usize = 12;

/// Generates share tokens.
#[derive(Debug, Clone, Default)]
pub struct LinkService;

impl LinkService {
    /// Creates a new link service.
    pub fn new() -> Self {
        Self
    }

    /// A random token of [`RANDOM_TOKEN_LENGTH`] characters.
    pub fn generate_token(&self) -> String {
        let mut rng = rand::rng();
        (0..RANDOM_TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_tokens_are_valid() {
        let links = LinkService::new();
        let tokens: HashSet<_> = (0..64).map(|_| links.generate_token()).collect();

        assert!(tokens.len() > 60);
        for token in &tokens {
            assert_eq!(token.len(), RANDOM_TOKEN_LENGTH);
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            assert!(sharehub_entity::share::validate_token(token).is_ok());
        }
    }
}
