//! Assignment of printable color codes to palette entries.

use super::XpmEncodeError;

/// Characters used to build color codes, in assignment order. Excludes `"`,
/// `\` and `/` so codes can never end a string or start a comment. Every
/// character appears once; `o` and `O` come early, so the letter runs hold
/// `!` and `~` in their place.
pub(super) const ALPHABET: &[u8; 80] =
    b" .oO+@#$%&*=-;:>,<1234567890abcdefghijklmn!pqrstuvwxyzABCDEFGHIJKLMN~PQRSTUVWXYZ";

/// Number of distinct single-character codes
pub(super) const MAX_CHARACTERS: usize = ALPHABET.len();

/// Number of distinct codes of `cpp` characters
pub(super) fn budget(cpp: u32) -> usize {
    MAX_CHARACTERS.checked_pow(cpp).unwrap_or(usize::MAX)
}

/// Color codes for a palette; entry `i` is the code of palette color `i`.
pub(super) struct SymbolTable {
    cpp: usize,
    /// All codes, back to back
    codes: Vec<u8>,
}

impl SymbolTable {
    /// Give each of `count` palette entries a code of `cpp` characters.
    ///
    /// Code `i` is `i` written in base 80 over [ALPHABET], most significant
    /// character first, so the same palette always gets the same codes.
    pub(super) fn assign(count: usize, cpp: u32) -> Result<SymbolTable, XpmEncodeError> {
        let budget = budget(cpp);
        if count > budget {
            return Err(XpmEncodeError::PaletteOverflow {
                colors: count,
                budget,
            });
        }

        let cpp = cpp as usize;
        let mut codes = vec![0_u8; count * cpp];
        for (i, code) in codes.chunks_exact_mut(cpp).enumerate() {
            let mut n = i;
            for c in code.iter_mut().rev() {
                *c = ALPHABET[n % MAX_CHARACTERS];
                n /= MAX_CHARACTERS;
            }
        }

        Ok(SymbolTable { cpp, codes })
    }

    pub(super) fn chars_per_pixel(&self) -> usize {
        self.cpp
    }

    pub(super) fn code(&self, index: usize) -> &[u8] {
        &self.codes[index * self.cpp..(index + 1) * self.cpp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_safe() {
        assert_eq!(MAX_CHARACTERS, 80);
        assert!(ALPHABET.iter().all(|c| c.is_ascii_graphic() || *c == b' '));
        assert!(!ALPHABET.contains(&b'"'));
        assert!(!ALPHABET.contains(&b'\\'));
        assert!(!ALPHABET.contains(&b'/'));

        let mut sorted = ALPHABET.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), MAX_CHARACTERS);
    }

    #[test]
    fn single_character_codes() {
        let symbols = SymbolTable::assign(80, 1).unwrap();
        assert_eq!(symbols.chars_per_pixel(), 1);
        assert_eq!(symbols.code(0), b" ");
        assert_eq!(symbols.code(1), b".");
        assert_eq!(symbols.code(18), b"1");
        assert_eq!(symbols.code(79), b"Z");
    }

    #[test]
    fn multi_character_codes() {
        let symbols = SymbolTable::assign(200, 2).unwrap();
        assert_eq!(symbols.code(0), b"  ");
        assert_eq!(symbols.code(1), b" .");
        assert_eq!(symbols.code(80), b". ");
        assert_eq!(symbols.code(199), b"ol");
    }

    #[test]
    fn codes_are_distinct() {
        for (count, cpp) in [(43, 1), (80, 1), (6400, 2)] {
            let symbols = SymbolTable::assign(count, cpp).unwrap();
            let mut codes: Vec<&[u8]> = (0..count).map(|i| symbols.code(i)).collect();
            codes.sort_unstable();
            codes.dedup();
            assert_eq!(codes.len(), count);
        }

        let symbols = SymbolTable::assign(80, 1).unwrap();
        assert_eq!(symbols.code(2), b"o");
        assert_eq!(symbols.code(42), b"!");
        assert_eq!(symbols.code(68), b"~");
    }

    #[test]
    fn overflow() {
        assert!(matches!(
            SymbolTable::assign(81, 1),
            Err(XpmEncodeError::PaletteOverflow {
                colors: 81,
                budget: 80
            })
        ));
        assert!(SymbolTable::assign(6400, 2).is_ok());
        assert!(SymbolTable::assign(0, 1).is_ok());
    }

    #[test]
    fn deterministic() {
        let a = SymbolTable::assign(50, 1).unwrap();
        let b = SymbolTable::assign(50, 1).unwrap();
        assert_eq!(a.codes, b.codes);
    }
}
