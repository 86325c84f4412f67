//! # Barcode Symbologies
//!
//! The barcode encodings a scan station recognizes, plus the check digit
//! math used to tell them apart when a device only hands us text.
//!
//! ## Why Inference?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Where Symbology Information Comes From                 │
//! │                                                                         │
//! │  Camera decoder ──► reports the reader that matched ("ean_13")         │
//! │                                                                         │
//! │  Keyboard-wedge scanner ──► types "0123456789012⏎"                      │
//! │       │                     (no symbology on the wire)                  │
//! │       ▼                                                                 │
//! │  infer("0123456789012")                                                │
//! │       ├── 13 digits + valid mod-10 check digit  → EAN-13               │
//! │       ├── 12 digits + valid check digit         → UPC-A                │
//! │       ├──  8 digits + valid check digit         → EAN-8                │
//! │       ├──  8 digits, valid once expanded        → UPC-E                │
//! │       ├── other digit runs (even / odd length)  → ITF / 2 of 5         │
//! │       ├── A-D ... A-D framing                   → Codabar              │
//! │       ├── upper-case Code 39 alphabet           → Code 39              │
//! │       └── anything else                         → Code 128             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// A barcode encoding standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Symbology {
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "codabar")]
    Codabar,
    #[serde(rename = "i2of5")]
    Interleaved2of5,
    #[serde(rename = "2of5")]
    Standard2of5,
}

impl Symbology {
    /// Every symbology a station enables by default.
    pub const ALL: [Symbology; 9] = [
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code39,
        Symbology::Codabar,
        Symbology::Interleaved2of5,
        Symbology::Standard2of5,
    ];

    /// Machine name, identical to the serde representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Symbology::Code128 => "code_128",
            Symbology::Ean13 => "ean_13",
            Symbology::Ean8 => "ean_8",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
            Symbology::Code39 => "code_39",
            Symbology::Codabar => "codabar",
            Symbology::Interleaved2of5 => "i2of5",
            Symbology::Standard2of5 => "2of5",
        }
    }

    /// Human-readable name for display.
    pub const fn label(&self) -> &'static str {
        match self {
            Symbology::Code128 => "Code 128",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code39 => "Code 39",
            Symbology::Codabar => "Codabar",
            Symbology::Interleaved2of5 => "Interleaved 2 of 5",
            Symbology::Standard2of5 => "Standard 2 of 5",
        }
    }

    /// Whether the symbology carries a mod-10 check digit of the EAN/UPC family.
    pub const fn has_check_digit(&self) -> bool {
        matches!(
            self,
            Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA | Symbology::UpcE
        )
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Symbology {
    type Err = ValidationError;

    /// Accepts machine names, display labels and decoder reader names
    /// (`"ean_13"`, `"EAN-13"`, `"ean_reader"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        let normalized = normalized.strip_suffix("_reader").unwrap_or(&normalized);

        match normalized {
            "code_128" | "code128" => Ok(Symbology::Code128),
            "ean_13" | "ean13" | "ean" => Ok(Symbology::Ean13),
            "ean_8" | "ean8" => Ok(Symbology::Ean8),
            "upc_a" | "upca" | "upc" => Ok(Symbology::UpcA),
            "upc_e" | "upce" => Ok(Symbology::UpcE),
            "code_39" | "code39" => Ok(Symbology::Code39),
            "codabar" => Ok(Symbology::Codabar),
            "i2of5" | "itf" | "interleaved_2_of_5" => Ok(Symbology::Interleaved2of5),
            "2of5" | "standard_2_of_5" => Ok(Symbology::Standard2of5),
            _ => Err(ValidationError::NotAllowed {
                field: "symbology".to_string(),
                allowed: Symbology::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Check Digits
// =============================================================================

fn digits(code: &str) -> Option<Vec<u8>> {
    code.bytes()
        .map(|b| b.is_ascii_digit().then(|| b - b'0'))
        .collect()
}

/// Computes the EAN/UPC mod-10 check digit for `data` (check digit excluded).
///
/// Weights alternate 3, 1, 3, ... starting from the rightmost data digit.
pub fn mod10_check_digit(data: &[u8]) -> u8 {
    let sum: u32 = data
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Returns true if the last digit of `code` is a valid mod-10 check digit.
pub fn has_valid_check_digit(code: &str) -> bool {
    match digits(code) {
        Some(d) if d.len() >= 2 => {
            let (data, check) = d.split_at(d.len() - 1);
            mod10_check_digit(data) == check[0]
        }
        _ => false,
    }
}

/// Expands an 8-digit UPC-E code into its 12-digit UPC-A form.
///
/// Returns `None` if the input is not 8 digits with number system 0 or 1.
/// The check digit is carried over untouched; validate it on the result.
pub fn expand_upc_e(code: &str) -> Option<String> {
    let d = digits(code)?;
    if d.len() != 8 || d[0] > 1 {
        return None;
    }

    let (ns, p, check) = (d[0], &d[1..7], d[7]);
    let body: [u8; 10] = match p[5] {
        0..=2 => [p[0], p[1], p[5], 0, 0, 0, 0, p[2], p[3], p[4]],
        3 => [p[0], p[1], p[2], 0, 0, 0, 0, 0, p[3], p[4]],
        4 => [p[0], p[1], p[2], p[3], 0, 0, 0, 0, 0, p[4]],
        _ => [p[0], p[1], p[2], p[3], p[4], 0, 0, 0, 0, p[5]],
    };

    let mut out = String::with_capacity(12);
    out.push(char::from(b'0' + ns));
    out.extend(body.iter().map(|&b| char::from(b'0' + b)));
    out.push(char::from(b'0' + check));
    Some(out)
}

fn is_codabar(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() < 3 {
        return false;
    }
    let framing = |b: u8| matches!(b.to_ascii_uppercase(), b'A'..=b'D');
    framing(bytes[0])
        && framing(bytes[bytes.len() - 1])
        && bytes[1..bytes.len() - 1]
            .iter()
            .all(|b| b.is_ascii_digit() || b"-$:/.+".contains(b))
}

fn is_code39(code: &str) -> bool {
    let inner = code
        .strip_prefix('*')
        .and_then(|c| c.strip_suffix('*'))
        .unwrap_or(code);
    !inner.is_empty()
        && inner
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b" -.$/+%".contains(&b))
}

/// Infers the most likely symbology of a decoded barcode text.
///
/// Used for input devices that deliver only the decoded text.
pub fn infer(code: &str) -> Symbology {
    let code = code.trim();
    if code.is_empty() {
        return Symbology::Code128;
    }

    if let Some(d) = digits(code) {
        match d.len() {
            13 if has_valid_check_digit(code) => return Symbology::Ean13,
            12 if has_valid_check_digit(code) => return Symbology::UpcA,
            8 if has_valid_check_digit(code) => return Symbology::Ean8,
            8 if expand_upc_e(code).is_some_and(|upc| has_valid_check_digit(&upc)) => {
                return Symbology::UpcE
            }
            _ => {}
        }
        return if d.len() % 2 == 0 {
            Symbology::Interleaved2of5
        } else {
            Symbology::Standard2of5
        };
    }

    if is_codabar(code) {
        Symbology::Codabar
    } else if is_code39(code) {
        Symbology::Code39
    } else {
        Symbology::Code128
    }
}
