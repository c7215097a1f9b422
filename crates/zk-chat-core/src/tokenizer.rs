//! Tokenizer abstraction used for length-aware splitting.
//!
//! The splitter only needs to count and slice tokens, then turn each slice
//! back into text. Any tokenizer whose `decode(encode(s))` reproduces `s`
//! works; the app crate ships a BPE tokenizer, and [`CharTokenizer`] is a
//! dependency-free fallback that treats each Unicode scalar as one token.

use anyhow::{anyhow, Result};

/// Encodes text to token ids and decodes token ids back to text.
pub trait Tokenizer: Send + Sync {
    /// Short identifier for logs (e.g. `"cl100k_base"`).
    fn name(&self) -> &str;

    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode a token slice. Slices taken from the middle of an encoding
    /// must still produce valid UTF-8 text.
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// One token per `char`. Lossless for any slice boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn name(&self) -> &str {
        "char"
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        tokens
            .iter()
            .map(|&t| char::from_u32(t).ok_or_else(|| anyhow!("invalid char token: {}", t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_roundtrip_multibyte() {
        let t = CharTokenizer;
        let text = "naïve café 🍌";
        let tokens = t.encode(text);
        assert_eq!(tokens.len(), text.chars().count());
        assert_eq!(t.decode(&tokens).unwrap(), text);
        assert_eq!(t.decode(&tokens[6..]).unwrap(), "café 🍌");
    }

    #[test]
    fn test_char_decode_rejects_surrogates() {
        assert!(CharTokenizer.decode(&[0xD800]).is_err());
    }
}
