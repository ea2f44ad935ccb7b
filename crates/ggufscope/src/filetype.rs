//! The `general.file_type` enumeration.
//!
//! Describes the encoding of the majority of tensors in a file. Names
//! match the ones llama.cpp prints.

use std::fmt;

/// Metadata key promoted from `uint32` to [`FileType`] during decode.
pub const FILE_TYPE_KEY: &str = "general.file_type";

/// File-level quantization type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum FileType {
    AllF32,
    MostlyF16,
    MostlyQ4_0,
    MostlyQ4_1,
    MostlyQ4_1SomeF16,
    /// Support removed from llama.cpp.
    MostlyQ4_2,
    /// Support removed from llama.cpp.
    MostlyQ4_3,
    MostlyQ8_0,
    MostlyQ5_0,
    MostlyQ5_1,
    MostlyQ2_K,
    MostlyQ3_KS,
    MostlyQ3_KM,
    MostlyQ3_KL,
    MostlyQ4_KS,
    MostlyQ4_KM,
    MostlyQ5_KS,
    MostlyQ5_KM,
    MostlyQ6_K,
    /// A code this decoder does not name. Kept so promotion is lossless.
    Unknown(u32),
}

impl FileType {
    /// Map a wire code to its file type.
    #[must_use]
    pub const fn from_u32(code: u32) -> Self {
        match code {
            0 => Self::AllF32,
            1 => Self::MostlyF16,
            2 => Self::MostlyQ4_0,
            3 => Self::MostlyQ4_1,
            4 => Self::MostlyQ4_1SomeF16,
            5 => Self::MostlyQ4_2,
            6 => Self::MostlyQ4_3,
            7 => Self::MostlyQ8_0,
            8 => Self::MostlyQ5_0,
            9 => Self::MostlyQ5_1,
            10 => Self::MostlyQ2_K,
            11 => Self::MostlyQ3_KS,
            12 => Self::MostlyQ3_KM,
            13 => Self::MostlyQ3_KL,
            14 => Self::MostlyQ4_KS,
            15 => Self::MostlyQ4_KM,
            16 => Self::MostlyQ5_KS,
            17 => Self::MostlyQ5_KM,
            18 => Self::MostlyQ6_K,
            other => Self::Unknown(other),
        }
    }

    /// The wire code.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        match self {
            Self::AllF32 => 0,
            Self::MostlyF16 => 1,
            Self::MostlyQ4_0 => 2,
            Self::MostlyQ4_1 => 3,
            Self::MostlyQ4_1SomeF16 => 4,
            Self::MostlyQ4_2 => 5,
            Self::MostlyQ4_3 => 6,
            Self::MostlyQ8_0 => 7,
            Self::MostlyQ5_0 => 8,
            Self::MostlyQ5_1 => 9,
            Self::MostlyQ2_K => 10,
            Self::MostlyQ3_KS => 11,
            Self::MostlyQ3_KM => 12,
            Self::MostlyQ3_KL => 13,
            Self::MostlyQ4_KS => 14,
            Self::MostlyQ4_KM => 15,
            Self::MostlyQ5_KS => 16,
            Self::MostlyQ5_KM => 17,
            Self::MostlyQ6_K => 18,
            Self::Unknown(code) => *code,
        }
    }

    /// llama.cpp name, `UNKNOWN` for unnamed codes.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AllF32 => "ALL_F32",
            Self::MostlyF16 => "MOSTLY_F16",
            Self::MostlyQ4_0 => "MOSTLY_Q4_0",
            Self::MostlyQ4_1 => "MOSTLY_Q4_1",
            Self::MostlyQ4_1SomeF16 => "MOSTLY_Q4_1_SOME_F16",
            Self::MostlyQ4_2 => "MOSTLY_Q4_2",
            Self::MostlyQ4_3 => "MOSTLY_Q4_3",
            Self::MostlyQ8_0 => "MOSTLY_Q8_0",
            Self::MostlyQ5_0 => "MOSTLY_Q5_0",
            Self::MostlyQ5_1 => "MOSTLY_Q5_1",
            Self::MostlyQ2_K => "MOSTLY_Q2_K",
            Self::MostlyQ3_KS => "MOSTLY_Q3_KS",
            Self::MostlyQ3_KM => "MOSTLY_Q3_KM",
            Self::MostlyQ3_KL => "MOSTLY_Q3_KL",
            Self::MostlyQ4_KS => "MOSTLY_Q4_KS",
            Self::MostlyQ4_KM => "MOSTLY_Q4_KM",
            Self::MostlyQ5_KS => "MOSTLY_Q5_KS",
            Self::MostlyQ5_KM => "MOSTLY_Q5_KM",
            Self::MostlyQ6_K => "MOSTLY_Q6_K",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
