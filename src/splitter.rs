//! Turns a raw input buffer into the initial ordered sequence of atomic
//! units, and serialises a [`Configuration`] back into test-ready bytes.
//!
//! The interface is intentionally trivial: a preprocessor that produces
//! the initial unit sequence at one of two granularities, line or
//! character.

use clap::ValueEnum;

use crate::core::{Configuration, UnitId};

/// The initial granularity at which the input is split into atomic units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Atom {
    /// One unit per line (including its trailing newline, if any).
    Line,
    /// One unit per character (Unicode scalar value).
    Char,
}

/// An input split into atomic units, retaining the original bytes so
/// candidates can be serialised back to a tester-ready byte stream.
#[derive(Debug, Clone)]
pub struct SplitInput {
    atom: Atom,
    pieces: Vec<Vec<u8>>,
}

impl SplitInput {
    /// Splits `content` into atomic units according to `atom`.
    #[must_use]
    pub fn split(content: &[u8], atom: Atom) -> Self {
        let pieces = match atom {
            Atom::Line => split_lines(content),
            Atom::Char => split_chars(content),
        };
        Self { atom, pieces }
    }

    /// Number of atomic units produced.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.pieces.len()
    }

    /// Builds the full-universe [`Configuration`] over these units.
    #[must_use]
    pub fn universe(&self) -> Configuration {
        Configuration::universe(self.unit_count())
    }

    /// Which atom kind produced this split.
    #[must_use]
    pub const fn atom(&self) -> Atom {
        self.atom
    }

    /// Serialises `configuration`'s units back into a byte stream, in
    /// configuration order, by concatenating the corresponding pieces.
    ///
    /// This is the "test-builder" referenced by the cache's content
    /// keying mode (§4.2) and by the oracle adapter's candidate file.
    #[must_use]
    pub fn serialize(&self, configuration: &Configuration) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in configuration.units() {
            out.extend_from_slice(&self.pieces[unit.0]);
        }
        out
    }
}

fn split_lines(content: &[u8]) -> Vec<Vec<u8>> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, &byte) in content.iter().enumerate() {
        if byte == b'\n' {
            pieces.push(content[start..=i].to_vec());
            start = i + 1;
        }
    }
    if start < content.len() {
        pieces.push(content[start..].to_vec());
    }
    pieces
}

fn split_chars(content: &[u8]) -> Vec<Vec<u8>> {
    // Lossy on invalid UTF-8 is deliberately avoided: fall back to the raw
    // bytes unit-per-byte so the splitter never panics or silently drops
    // data from a non-UTF-8 input.
    match std::str::from_utf8(content) {
        Ok(text) => text.chars().map(|c| c.to_string().into_bytes()).collect(),
        Err(_) => content.iter().map(|&b| vec![b]).collect(),
    }
}
