//! Fuzzy hashing as an injected capability.
//!
//! The section extractor records a similarity digest only when a
//! [`FuzzyHasher`] is supplied; the capability being absent is non-fatal.
//! The bundled implementation is a minimal Context-Triggered Piecewise
//! Hash (CTPH): a rolling hash chunks the input at trigger points and a
//! short BLAKE3-XOF substring is emitted per piece. The final signature is
//! "<window>:<block>:<pieces>..." which avoids GPL encumbrances from
//! ssdeep while remaining comparable piece-wise.

use std::collections::VecDeque;

/// A context-triggered similarity digest over raw bytes.
pub trait FuzzyHasher {
    /// Deterministic textual signature for `data`.
    fn digest(&self, data: &[u8]) -> String;
}

/// Rolling hash over a fixed-size byte window.
struct RollingHash {
    window_size: usize,
    window: VecDeque<u8>,
    hash: u32,
}

impl RollingHash {
    fn new(window_size: usize) -> Self {
        Self {
            window_size,
            window: VecDeque::with_capacity(window_size),
            hash: 0,
        }
    }

    fn update(&mut self, byte: u8) {
        if self.window.len() == self.window_size {
            if let Some(old) = self.window.pop_front() {
                self.hash = self.hash.wrapping_sub(old as u32);
            }
        }
        self.window.push_back(byte);
        self.hash = self.hash.wrapping_add(byte as u32).rotate_left(1);
    }

    fn hash(&self) -> u32 {
        self.hash
    }
}

/// CTPH fuzzy hasher with a configurable trigger window and block size.
#[derive(Clone, Copy, Debug)]
pub struct Ctph {
    pub window_size: usize,
    pub block_size: usize,
}

impl Default for Ctph {
    fn default() -> Self {
        Self {
            window_size: 8,
            block_size: 4,
        }
    }
}

fn hash_piece(bytes: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(bytes);
    let mut out = [0u8; 2];
    hasher.finalize_xof().fill(&mut out);
    hex::encode(out)
}

impl FuzzyHasher for Ctph {
    fn digest(&self, data: &[u8]) -> String {
        let mut rolling = RollingHash::new(self.window_size);
        let mut pieces: Vec<String> = Vec::new();
        let mut cur: Vec<u8> = Vec::new();
        let trigger = self.block_size as u32;
        for &b in data {
            rolling.update(b);
            cur.push(b);
            // trigger on the rolling hash, with a hard cap per piece
            if rolling.hash() % trigger == trigger - 1 || cur.len() >= 64 * self.window_size {
                pieces.push(hash_piece(&cur));
                cur.clear();
            }
        }
        if !cur.is_empty() {
            pieces.push(hash_piece(&cur));
        }
        format!("{}:{}:{}", self.window_size, self.block_size, pieces.join(":"))
    }
}
