//! BPE tokenizer backed by `tiktoken-rs` (`cl100k_base`).

use anyhow::Result;
use tiktoken_rs::CoreBPE;

use zk_chat_core::tokenizer::Tokenizer;

/// Prefix of the error `CoreBPE::decode` returns when every token id is
/// known but the joined bytes are not valid UTF-8.
const INVALID_UTF8_ERROR: &str = "Unable to decode into a valid UTF-8";

pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn cl100k() -> Result<Self> {
        Ok(Self {
            bpe: tiktoken_rs::cl100k_base()?,
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        "cl100k_base"
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    /// Decode a window of tokens.
    ///
    /// Byte-level BPE can split a multi-byte character across tokens, so a
    /// window cut from the middle of an encoding may not be valid UTF-8 on
    /// its own. Such windows keep all their bytes and the broken sequences
    /// at the edges become U+FFFD.
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        match self.bpe.decode(tokens.to_vec()) {
            Ok(text) => Ok(text),
            // Unknown ids fail before the UTF-8 check, so every id here is
            // in the vocabulary and the byte-level split cannot miss.
            Err(err) if err.to_string().starts_with(INVALID_UTF8_ERROR) => {
                let bytes: Vec<u8> = self
                    .bpe
                    ._decode_native_and_split(tokens.to_vec())
                    .flatten()
                    .collect();
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zk_chat_core::splitter::split_to_chunks;

    #[test]
    fn test_roundtrip_ascii() {
        let t = TiktokenTokenizer::cl100k().unwrap();
        let text = "Apples are red. Bananas are yellow.";
        let tokens = t.encode(text);
        assert!(tokens.len() < text.len());
        assert_eq!(t.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn test_windows_always_decode() {
        let t = TiktokenTokenizer::cl100k().unwrap();
        let text = "Zettelkästen 🍌🍎 naïve café — ünïcödé everywhere.";
        let tokens = t.encode(text);
        for start in 0..tokens.len() {
            for end in start + 1..=tokens.len() {
                assert!(t.decode(&tokens[start..end]).is_ok());
            }
        }
    }

    #[test]
    fn test_split_emoji_windows_are_never_empty() {
        let t = TiktokenTokenizer::cl100k().unwrap();
        let tokens = t.encode("🍌🍎🍇🍉🍓🥝🍍🥭");
        assert_eq!(tokens.len(), 24);

        let windows = split_to_chunks(&tokens, 4, 0).unwrap();
        let decoded: Vec<String> = windows.iter().map(|w| t.decode(w).unwrap()).collect();
        assert_eq!(decoded.len(), 6);
        for text in &decoded {
            assert!(!text.trim().is_empty(), "empty window in {:?}", decoded);
        }
        assert!(decoded[0].starts_with('🍌'));
        assert!(decoded[2].contains('🍉'));
        assert!(decoded[3].contains('🍓'));
        assert!(decoded[5].ends_with('🥭'));
        // Characters cut by a window edge survive as replacement characters.
        assert!(decoded[1].contains('\u{FFFD}'));
    }

    #[test]
    fn test_unknown_token_is_error() {
        let t = TiktokenTokenizer::cl100k().unwrap();
        assert!(t.decode(&[u32::MAX]).is_err());
    }
}
