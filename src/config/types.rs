//! Serial-line value types, narrowed to what RTU transmission allows.
//!
//! An RTU character is always 11 bits: start, 8 data bits, parity, stop
//! (or a second stop bit when parity is disabled). Data bits are
//! therefore not configurable, and stop bits follow from parity.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigValidationError;

/// Parity of the RTU character. Even is the serial-line default; None
/// trades the parity bit for a second stop bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    Even,
    Odd,
    None,
}

impl Parity {
    /// The single letter used on serial tooling command lines.
    pub fn letter(self) -> char {
        match self {
            Self::Even => 'E',
            Self::Odd => 'O',
            Self::None => 'N',
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
            Parity::None => serialport::Parity::None,
        }
    }
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Even => "even",
            Self::Odd => "odd",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Parity {
    type Err = ConfigValidationError;

    /// Accepts the single letters as well as the full names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E" | "e" | "even" => Ok(Self::Even),
            "O" | "o" | "odd" => Ok(Self::Odd),
            "N" | "n" | "none" => Ok(Self::None),
            other => Err(ConfigValidationError::InvalidParity(other.to_string())),
        }
    }
}

/// The 8 data bits of an RTU character. The type only exists so config
/// files state the width explicitly; any other value fails to
/// deserialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DataBits;

impl DataBits {
    pub const BITS: u8 = 8;

    pub fn get(self) -> u8 {
        Self::BITS
    }
}

impl TryFrom<u8> for DataBits {
    type Error = ConfigValidationError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits == Self::BITS {
            Ok(Self)
        } else {
            Err(ConfigValidationError::InvalidDataBits(bits))
        }
    }
}

impl From<DataBits> for u8 {
    fn from(data_bits: DataBits) -> Self {
        data_bits.get()
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(_: DataBits) -> Self {
        serialport::DataBits::Eight
    }
}

impl std::fmt::Display for DataBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Stop bits are not free to choose in RTU mode: they pad the character
/// to 11 bits, so the count follows from parity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// A second stop bit replaces the missing parity bit.
    pub fn for_parity(parity: Parity) -> Self {
        match parity {
            Parity::None => Self::Two,
            Parity::Even | Parity::Odd => Self::One,
        }
    }

    pub fn get(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(stop_bits: StopBits) -> Self {
        match stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl std::fmt::Display for StopBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}
