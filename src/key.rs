use crate::{codec, TrieError};

/// Text that can be encoded into a trie key.
///
/// Implemented for Rust strings, which always encode, and for UTF-16 code
/// units, which fail on malformed surrogate pairs.
pub trait EncodeKey {
    /// Encodes the text into its stored byte sequence, without the terminal code.
    fn encode_key(&self) -> Result<Vec<u8>, TrieError>;
}

impl EncodeKey for str {
    #[inline]
    fn encode_key(&self) -> Result<Vec<u8>, TrieError> {
        Ok(codec::encode(self))
    }
}

impl EncodeKey for String {
    #[inline]
    fn encode_key(&self) -> Result<Vec<u8>, TrieError> {
        Ok(codec::encode(self))
    }
}

impl EncodeKey for [u16] {
    #[inline]
    fn encode_key(&self) -> Result<Vec<u8>, TrieError> {
        codec::encode_utf16(self)
    }
}

impl EncodeKey for Vec<u16> {
    #[inline]
    fn encode_key(&self) -> Result<Vec<u8>, TrieError> {
        codec::encode_utf16(self)
    }
}

impl<K: EncodeKey + ?Sized> EncodeKey for &K {
    #[inline]
    fn encode_key(&self) -> Result<Vec<u8>, TrieError> {
        (**self).encode_key()
    }
}
