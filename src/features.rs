//! Text to feature-vector encoding for the spam classifier.
//!
//! Words are hashed into a fixed vocabulary with MD5 and then multi-hot
//! encoded. The indices must match what the training script produced, so
//! the tokenizer and hash are fixed.

use md5::{Digest, Md5};

/// Smallest usable vocabulary: index 0 is reserved, so at least one slot must remain.
pub const MIN_VOCABULARY_LENGTH: usize = 2;

/// Characters treated as word separators, in addition to the split char.
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Lower-case, replace filter characters with spaces, split, drop empties.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect::<String>()
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Vocabulary index of one word, in `1..vocabulary_length`.
///
/// Index 0 is reserved, so the digest is reduced modulo `n - 1`.
///
/// # Panics
///
/// Panics if `vocabulary_length` is below [`MIN_VOCABULARY_LENGTH`].
pub fn word_index(word: &str, vocabulary_length: usize) -> usize {
    let digest = Md5::digest(word.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    let value = u128::from_be_bytes(bytes);
    (value % (vocabulary_length as u128 - 1)) as usize + 1
}

/// Hashed word indices of `text`, in word order.
pub fn one_hot(text: &str, vocabulary_length: usize) -> Vec<usize> {
    tokenize(text)
        .iter()
        .map(|w| word_index(w, vocabulary_length))
        .collect()
}

/// Dense multi-hot vector with 1.0 at each index.
pub fn vectorize(indices: &[usize], vocabulary_length: usize) -> Vec<f64> {
    let mut vector = vec![0.0; vocabulary_length];
    for &i in indices {
        if let Some(slot) = vector.get_mut(i) {
            *slot = 1.0;
        }
    }
    vector
}

/// Encode one message into the classifier's input vector.
pub fn encode(text: &str, vocabulary_length: usize) -> Vec<f64> {
    vectorize(&one_hot(text, vocabulary_length), vocabulary_length)
}
