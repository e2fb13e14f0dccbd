//! Random short identifiers for boxes and QR labels.

use rand::Rng;

use stashbox_core::config::ShortIdConfig;
use stashbox_core::traits::ShortIdGenerator;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws `length` characters from `A-Z0-9` after a constant prefix.
#[derive(Debug, Clone)]
pub struct RandomShortIdGenerator {
    prefix: String,
    length: usize,
}

impl RandomShortIdGenerator {
    /// Creates a generator with the given prefix and random part length.
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
        }
    }

    /// Generator for QR label codes, e.g. `QR-7K2M9XQ4`.
    pub fn for_qr_codes(config: &ShortIdConfig) -> Self {
        Self::new(config.qr_prefix.clone(), config.qr_length)
    }

    /// Generator for box codes.
    pub fn for_boxes(config: &ShortIdConfig) -> Self {
        Self::new(config.box_prefix.clone(), config.box_length)
    }
}

impl ShortIdGenerator for RandomShortIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut id = String::with_capacity(self.prefix.len() + self.length);
        id.push_str(&self.prefix);
        id.extend((0..self.length).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char));
        id
    }
}
