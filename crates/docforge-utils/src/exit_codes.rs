//! Exit code constants for the docforge binary.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration, stage or plan |
//! | 3 | `DEPENDENCY_MISSING` | A stage's dependencies have no artifact |
//! | 70 | `LLM_FAILURE` | Completion service failed |
//! | 74 | `PERSISTENCE` | Document store I/O failed |
//! | 75 | `RATE_LIMITED` | Rate limit persisted through every retry |
//! | 77 | `AUTH_FAILED` | Completion service rejected the credentials |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
///
/// ```rust
/// use docforge_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(75), ExitCode::RATE_LIMITED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid CLI arguments, configuration, stage id or stage plan
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Requested stage cannot run before its dependencies
    pub const DEPENDENCY_MISSING: ExitCode = ExitCode(3);

    /// Completion service failure not covered by a more specific code
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Document store could not read or write
    pub const PERSISTENCE: ExitCode = ExitCode(74);

    /// Rate limit persisted through every retry
    pub const RATE_LIMITED: ExitCode = ExitCode(75);

    /// Credentials were rejected
    pub const AUTH_FAILED: ExitCode = ExitCode(77);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::DEPENDENCY_MISSING.as_i32(), 3);
        assert_eq!(ExitCode::LLM_FAILURE.as_i32(), 70);
        assert_eq!(ExitCode::PERSISTENCE.as_i32(), 74);
        assert_eq!(ExitCode::RATE_LIMITED.as_i32(), 75);
        assert_eq!(ExitCode::AUTH_FAILED.as_i32(), 77);
    }

    #[test]
    fn test_round_trip_through_i32() {
        let raw: i32 = ExitCode::PERSISTENCE.into();
        assert_eq!(ExitCode::from(raw), ExitCode::PERSISTENCE);
    }
}
