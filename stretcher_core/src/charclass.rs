/// Placeholder byte marking the variable string position in a rule template.
pub const STRING_SENTINEL: u8 = 0x00;
/// Placeholder byte marking a variable digit position in a rule template.
pub const DIGIT_SENTINEL: u8 = 0x01;

/// Returns `true` if `word` contains either reserved sentinel byte.
///
/// Such words cannot be analysed: a sentinel inside a literal chunk would be
/// indistinguishable from a placeholder once the word becomes a rule template.
pub fn contains_sentinel(word: &[u8]) -> bool {
    word.iter()
        .any(|&b| b == STRING_SENTINEL || b == DIGIT_SENTINEL)
}

/// The three-way partition of byte values used for segmentation.
///
/// Each variant is a distinct power-of-two flag so that "same class" and
/// "one of these classes" checks are plain bitwise ANDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CharClass {
    Alpha = 1,
    Digit = 2,
    Other = 4,
}

impl CharClass {
    /// Mask covering every non-alpha class.
    pub const NON_ALPHA: u8 = CharClass::Digit as u8 | CharClass::Other as u8;

    /// Classifies a single byte. Only ASCII letters and digits are recognised;
    /// every other byte value, including non-ASCII, is `Other`.
    pub fn of(byte: u8) -> Self {
        if byte.is_ascii_alphabetic() {
            CharClass::Alpha
        } else if byte.is_ascii_digit() {
            CharClass::Digit
        } else {
            CharClass::Other
        }
    }

    pub fn flag(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this class shares a bit with `mask`.
    pub fn intersects(self, mask: u8) -> bool {
        self.flag() & mask != 0
    }

    /// Inverse of [`CharClass::flag`]; `None` for zero or multi-bit masks.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            1 => Some(CharClass::Alpha),
            2 => Some(CharClass::Digit),
            4 => Some(CharClass::Other),
            _ => None,
        }
    }
}
