//! QR symbol capacity model
//!
//! Holds the published data capacities of QR Code Model 2 symbols (versions
//! 1 through 40, four error correction levels, four encoding modes) and the
//! lookups built on top of them: minimum version selection, payload mode
//! detection and fitting a payload into a symbol.

use std::fmt;

use encoding_rs::SHIFT_JIS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest symbol version
pub const MIN_VERSION: u8 = 1;

/// Largest symbol version
pub const MAX_VERSION: u8 = 40;

// Error
//------------------------------------------------------------------------------

/// Failures when choosing a symbol for a payload
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SymbolError {
    #[error("invalid symbol version {0}, expected 1-40")]
    InvalidVersion(u8),

    #[error("content cannot be encoded in {mode} mode")]
    UnsupportedContent { mode: Mode },

    #[error("{length} characters exceed the {max} character capacity for {mode} mode at level {level}")]
    CapacityExceeded {
        mode: Mode,
        level: ECLevel,
        length: usize,
        max: usize,
    },
}

// Error correction level
//------------------------------------------------------------------------------

/// Error correction level, ordered from least (L) to most (H) strict
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ECLevel {
    #[serde(alias = "l")]
    L = 0,
    #[default]
    #[serde(alias = "m")]
    M = 1,
    #[serde(alias = "q")]
    Q = 2,
    #[serde(alias = "h")]
    H = 3,
}

impl ECLevel {
    pub const ALL: [ECLevel; 4] = [Self::L, Self::M, Self::Q, Self::H];
}

impl fmt::Display for ECLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(s)
    }
}

// Mode
//------------------------------------------------------------------------------

/// Data encoding mode
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Numeric = 0,
    Alphanumeric = 1,
    Byte = 2,
    Kanji = 3,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Self::Numeric, Self::Alphanumeric, Self::Byte, Self::Kanji];

    /// Picks the most compact mode able to represent `text`.
    ///
    /// Kanji is never chosen here; it has to be requested explicitly.
    pub fn detect(text: &str) -> Mode {
        if text.chars().all(|c| Self::Numeric.contains(c)) {
            Self::Numeric
        } else if text.chars().all(|c| Self::Alphanumeric.contains(c)) {
            Self::Alphanumeric
        } else {
            Self::Byte
        }
    }

    /// Whether a single character belongs to the mode's character set.
    /// Kanji membership depends on the Shift JIS encoding of the whole
    /// string, see [`Mode::char_count`].
    pub fn contains(&self, c: char) -> bool {
        match self {
            Self::Numeric => c.is_ascii_digit(),
            Self::Alphanumeric => matches!(
                c,
                '0'..='9' | 'A'..='Z' | ' ' | '$' | '%' | '*' | '+' | '-' | '.' | '/' | ':'
            ),
            Self::Byte => true,
            Self::Kanji => !c.is_ascii(),
        }
    }

    /// Length of `text` in the unit the capacity table is expressed in.
    ///
    /// Byte mode counts UTF-8 bytes, Kanji mode counts Shift JIS double-byte
    /// characters and the other modes count characters.
    pub fn char_count(&self, text: &str) -> Result<usize, SymbolError> {
        let unsupported = SymbolError::UnsupportedContent { mode: *self };
        match self {
            Self::Numeric | Self::Alphanumeric => {
                if text.chars().all(|c| self.contains(c)) {
                    Ok(text.chars().count())
                } else {
                    Err(unsupported)
                }
            }
            Self::Byte => Ok(text.len()),
            Self::Kanji => {
                let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
                if had_errors || bytes.len() % 2 != 0 {
                    return Err(unsupported);
                }
                let all_kanji = bytes.chunks(2).all(|pair| {
                    let code = u16::from_be_bytes([pair[0], pair[1]]);
                    matches!(code, 0x8140..=0x9ffc | 0xe040..=0xebbf)
                });
                if all_kanji {
                    Ok(bytes.len() / 2)
                } else {
                    Err(unsupported)
                }
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Numeric => "numeric",
            Self::Alphanumeric => "alphanumeric",
            Self::Byte => "byte",
            Self::Kanji => "kanji",
        };
        f.write_str(s)
    }
}

// Capacity lookups
//------------------------------------------------------------------------------

/// Maximum number of characters a symbol holds
pub fn capacity(version: u8, level: ECLevel, mode: Mode) -> Result<usize, SymbolError> {
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(SymbolError::InvalidVersion(version));
    }
    Ok(DATA_CAPACITY[version as usize - 1][level as usize][mode as usize] as usize)
}

/// Smallest version whose capacity covers `length` characters
pub fn minimum_version(mode: Mode, level: ECLevel, length: usize) -> Result<u8, SymbolError> {
    (MIN_VERSION..=MAX_VERSION)
        .find(|&v| DATA_CAPACITY[v as usize - 1][level as usize][mode as usize] as usize >= length)
        .ok_or(SymbolError::CapacityExceeded {
            mode,
            level,
            length,
            max: DATA_CAPACITY[MAX_VERSION as usize - 1][level as usize][mode as usize] as usize,
        })
}

/// Symbol parameters chosen for a payload
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub struct SymbolSpec {
    pub version: u8,
    pub level: ECLevel,
    pub mode: Mode,
}

impl SymbolSpec {
    /// Side length of the symbol in modules
    pub const fn modules(&self) -> u32 {
        self.version as u32 * 4 + 17
    }
}

/// Chooses the symbol for `text`.
///
/// `mode` defaults to [`Mode::detect`]. A `version` of `None` or `Some(0)`
/// selects the smallest version that fits; an explicit version must hold the
/// whole payload.
pub fn fit(
    text: &str,
    level: ECLevel,
    mode: Option<Mode>,
    version: Option<u8>,
) -> Result<SymbolSpec, SymbolError> {
    let mode = mode.unwrap_or_else(|| Mode::detect(text));
    let length = mode.char_count(text)?;

    let version = match version.filter(|&v| v != 0) {
        None => minimum_version(mode, level, length)?,
        Some(v) => {
            let max = capacity(v, level, mode)?;
            if length > max {
                return Err(SymbolError::CapacityExceeded { mode, level, length, max });
            }
            v
        }
    };

    Ok(SymbolSpec { version, level, mode })
}

// Capacity rows
//------------------------------------------------------------------------------

/// Capacities of one version at one level, per mode
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct ModeCapacity {
    pub numeric: u16,
    pub alphanumeric: u16,
    pub byte: u16,
    pub kanji: u16,
}

/// All capacities of one version
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct CapacityRow {
    pub version: u8,
    #[serde(rename = "L")]
    pub l: ModeCapacity,
    #[serde(rename = "M")]
    pub m: ModeCapacity,
    #[serde(rename = "Q")]
    pub q: ModeCapacity,
    #[serde(rename = "H")]
    pub h: ModeCapacity,
}

/// The whole table, one row per version
pub fn rows() -> Vec<CapacityRow> {
    let per_mode = |caps: &[u16; 4]| ModeCapacity {
        numeric: caps[0],
        alphanumeric: caps[1],
        byte: caps[2],
        kanji: caps[3],
    };

    DATA_CAPACITY
        .iter()
        .zip(MIN_VERSION..)
        .map(|(levels, version)| CapacityRow {
            version,
            l: per_mode(&levels[0]),
            m: per_mode(&levels[1]),
            q: per_mode(&levels[2]),
            h: per_mode(&levels[3]),
        })
        .collect()
}

// Global constants
//------------------------------------------------------------------------------

/// Indexed as `[version - 1][level][mode]`, levels L M Q H, modes numeric
/// alphanumeric byte kanji.
#[rustfmt::skip]
pub static DATA_CAPACITY: [[[u16; 4]; 4]; 40] = [
    /* 1 */ [[41, 25, 17, 10], [34, 20, 14, 8], [27, 16, 11, 7], [17, 10, 7, 4]],
    /* 2 */ [[77, 47, 32, 20], [63, 38, 26, 16], [48, 29, 20, 12], [34, 20, 14, 8]],
    /* 3 */ [[127, 77, 53, 32], [101, 61, 42, 26], [77, 47, 32, 20], [58, 35, 24, 15]],
    /* 4 */ [[187, 114, 78, 48], [149, 90, 62, 38], [111, 67, 46, 28], [82, 50, 34, 21]],
    /* 5 */ [[255, 154, 106, 65], [202, 122, 84, 52], [144, 87, 60, 37], [106, 64, 44, 27]],
    /* 6 */ [[322, 195, 134, 82], [255, 154, 106, 65], [178, 108, 74, 45], [139, 84, 58, 36]],
    /* 7 */ [[370, 224, 154, 95], [293, 178, 122, 75], [207, 125, 86, 53], [154, 93, 64, 39]],
    /* 8 */ [[461, 279, 192, 118], [365, 221, 152, 93], [259, 157, 108, 66], [202, 122, 84, 52]],
    /* 9 */ [[552, 335, 230, 141], [432, 262, 180, 111], [312, 189, 130, 80], [235, 143, 98, 60]],
    /* 10 */ [[652, 395, 271, 167], [513, 311, 213, 131], [364, 221, 151, 93], [288, 174, 119, 74]],
    /* 11 */ [[772, 468, 321, 198], [604, 366, 251, 155], [427, 259, 177, 109], [331, 200, 137, 85]],
    /* 12 */ [[883, 535, 367, 226], [691, 419, 287, 177], [489, 296, 203, 125], [374, 227, 155, 96]],
    /* 13 */ [[1022, 619, 425, 262], [796, 483, 331, 204], [580, 352, 241, 149], [427, 259, 177, 109]],
    /* 14 */ [[1101, 667, 458, 282], [871, 528, 362, 223], [621, 376, 258, 159], [468, 283, 194, 120]],
    /* 15 */ [[1250, 758, 520, 320], [991, 600, 412, 254], [703, 426, 292, 180], [530, 321, 220, 136]],
    /* 16 */ [[1408, 854, 586, 361], [1082, 656, 450, 277], [775, 470, 322, 198], [602, 365, 250, 154]],
    /* 17 */ [[1548, 938, 644, 397], [1212, 734, 504, 310], [876, 531, 364, 224], [674, 408, 280, 173]],
    /* 18 */ [[1725, 1046, 718, 442], [1346, 816, 560, 345], [948, 574, 394, 243], [746, 452, 310, 191]],
    /* 19 */ [[1903, 1153, 792, 488], [1500, 909, 624, 384], [1063, 644, 442, 272], [813, 493, 338, 208]],
    /* 20 */ [[2061, 1249, 858, 528], [1600, 970, 666, 410], [1159, 702, 482, 297], [919, 557, 382, 235]],
    /* 21 */ [[2232, 1352, 929, 572], [1708, 1035, 711, 438], [1224, 742, 509, 314], [969, 587, 403, 248]],
    /* 22 */ [[2409, 1460, 1003, 618], [1872, 1134, 779, 480], [1358, 823, 565, 348], [1056, 640, 439, 270]],
    /* 23 */ [[2620, 1588, 1091, 672], [2059, 1248, 857, 528], [1468, 890, 611, 376], [1108, 672, 461, 284]],
    /* 24 */ [[2812, 1704, 1171, 721], [2188, 1326, 911, 561], [1588, 963, 661, 407], [1228, 744, 511, 315]],
    /* 25 */ [[3057, 1853, 1273, 784], [2395, 1451, 997, 614], [1718, 1041, 715, 440], [1286, 779, 535, 330]],
    /* 26 */ [[3283, 1990, 1367, 842], [2544, 1542, 1059, 652], [1804, 1094, 751, 462], [1425, 864, 593, 365]],
    /* 27 */ [[3517, 2132, 1465, 902], [2701, 1637, 1125, 692], [1933, 1172, 805, 496], [1501, 910, 625, 385]],
    /* 28 */ [[3669, 2223, 1528, 940], [2857, 1732, 1190, 732], [2085, 1263, 868, 534], [1581, 958, 658, 405]],
    /* 29 */ [[3909, 2369, 1628, 1002], [3035, 1839, 1264, 778], [2181, 1322, 908, 559], [1677, 1016, 698, 430]],
    /* 30 */ [[4158, 2520, 1732, 1066], [3289, 1994, 1370, 843], [2358, 1429, 982, 604], [1782, 1080, 742, 457]],
    /* 31 */ [[4417, 2677, 1840, 1132], [3486, 2113, 1452, 894], [2473, 1499, 1030, 634], [1897, 1150, 790, 486]],
    /* 32 */ [[4686, 2840, 1952, 1201], [3693, 2238, 1538, 947], [2670, 1618, 1112, 684], [2022, 1226, 842, 518]],
    /* 33 */ [[4965, 3009, 2068, 1273], [3909, 2369, 1628, 1002], [2805, 1700, 1168, 719], [2157, 1307, 898, 553]],
    /* 34 */ [[5253, 3183, 2188, 1347], [4134, 2506, 1722, 1060], [2949, 1787, 1228, 756], [2301, 1394, 958, 590]],
    /* 35 */ [[5529, 3351, 2303, 1417], [4343, 2632, 1809, 1113], [3081, 1867, 1283, 790], [2361, 1431, 983, 605]],
    /* 36 */ [[5836, 3537, 2431, 1496], [4588, 2780, 1911, 1176], [3244, 1966, 1351, 832], [2524, 1530, 1051, 647]],
    /* 37 */ [[6153, 3729, 2563, 1577], [4775, 2894, 1989, 1224], [3417, 2071, 1423, 876], [2625, 1591, 1093, 673]],
    /* 38 */ [[6479, 3927, 2699, 1661], [5039, 3054, 2099, 1292], [3599, 2181, 1499, 923], [2735, 1658, 1139, 701]],
    /* 39 */ [[6743, 4087, 2809, 1729], [5313, 3220, 2213, 1362], [3791, 2298, 1579, 972], [2927, 1774, 1219, 750]],
    /* 40 */ [[7089, 4296, 2953, 1817], [5596, 3391, 2331, 1435], [3993, 2420, 1663, 1024], [3057, 1852, 1273, 784]],
];
