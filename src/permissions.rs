//! Owner permission helpers
//!
//! Only the owner digit of a mode is inspected or changed by the
//! read/write/execute helpers. Group and other bits pass through untouched.

use crate::error::{FileError, Result};

/// One owner permission bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `r`
    Read,
    /// `w`
    Write,
    /// `x`
    Execute,
}

impl Access {
    /// Bit value within the owner digit
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Read => 4,
            Self::Write => 2,
            Self::Execute => 1,
        }
    }

    /// Fail on platforms that cannot express this bit
    ///
    /// # Errors
    ///
    /// Returns `PlatformUnsupported` for `Execute` outside unix.
    pub fn check_supported(self) -> Result<()> {
        if matches!(self, Self::Execute) && !cfg!(unix) {
            return Err(FileError::PlatformUnsupported("the execute permission"));
        }
        Ok(())
    }
}

/// The owner digit of `mode`
#[must_use]
pub const fn owner_bits(mode: u32) -> u32 {
    (mode >> 6) & 0o7
}

/// Whether the owner digit of `mode` grants `access`
#[must_use]
pub const fn has_owner_access(mode: u32, access: Access) -> bool {
    owner_bits(mode) & access.bit() != 0
}

/// `mode` with `access` set or cleared in the owner digit
///
/// Returns `None` when the bit is already in the requested state.
#[must_use]
pub const fn with_owner_access(mode: u32, access: Access, enabled: bool) -> Option<u32> {
    if has_owner_access(mode, access) == enabled {
        return None;
    }
    let bit = access.bit() << 6;
    Some(if enabled { mode | bit } else { mode & !bit })
}

/// Parse an octal permission string such as `"755"`
///
/// # Errors
///
/// Returns `InvalidPermissions` unless the string is 1 to 4 octal digits.
pub fn parse_octal(permissions: &str) -> Result<u32> {
    let valid = (1..=4).contains(&permissions.len())
        && permissions.bytes().all(|b| (b'0'..=b'7').contains(&b));
    if !valid {
        return Err(FileError::InvalidPermissions(permissions.to_string()));
    }
    u32::from_str_radix(permissions, 8)
        .map_err(|_| FileError::InvalidPermissions(permissions.to_string()))
}

/// Three-digit octal form of the permission bits of `mode`
#[must_use]
pub fn format_octal(mode: u32) -> String {
    format!("{:03o}", mode & 0o777)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0o755, Access::Read, true)]
    #[case(0o755, Access::Write, true)]
    #[case(0o755, Access::Execute, true)]
    #[case(0o444, Access::Write, false)]
    #[case(0o077, Access::Read, false)]
    #[case(0o100, Access::Execute, true)]
    fn test_has_owner_access(#[case] mode: u32, #[case] access: Access, #[case] expected: bool) {
        assert_eq!(has_owner_access(mode, access), expected);
    }

    #[test]
    fn test_with_owner_access_only_touches_owner_digit() {
        assert_eq!(with_owner_access(0o444, Access::Write, true), Some(0o644));
        assert_eq!(with_owner_access(0o777, Access::Read, false), Some(0o377));
        assert_eq!(with_owner_access(0o644, Access::Execute, true), Some(0o744));
    }

    #[test]
    fn test_with_owner_access_unchanged_is_none() {
        assert_eq!(with_owner_access(0o644, Access::Read, true), None);
        assert_eq!(with_owner_access(0o644, Access::Execute, false), None);
    }

    #[rstest]
    #[case("755", 0o755)]
    #[case("0644", 0o644)]
    #[case("7", 0o7)]
    fn test_parse_octal_accepts(#[case] input: &str, #[case] expected: u32) {
        assert!(matches!(parse_octal(input), Ok(mode) if mode == expected));
    }

    #[rstest]
    #[case("")]
    #[case("789")]
    #[case("rwx")]
    #[case("77777")]
    fn test_parse_octal_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_octal(input),
            Err(FileError::InvalidPermissions(_))
        ));
    }

    #[test]
    fn test_format_octal_pads_to_three_digits() {
        assert_eq!(format_octal(0o644), "644");
        assert_eq!(format_octal(0o7), "007");
        assert_eq!(format_octal(0o100_755), "755");
    }
}
