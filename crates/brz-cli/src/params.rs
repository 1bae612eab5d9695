//! Parameter extraction helpers.
//!
//! Optional command-line values arrive as `Option<String>`; these helpers
//! turn them into the typed values commands need, keeping "absent" and
//! "invalid" apart.

use std::path::Path;

use crate::error::CliError;

/// Parse a decimal id.
///
/// Only a non-empty run of ASCII digits that fits in `u32` is accepted;
/// signs, whitespace and anything else fail with [`CliError::Conversion`].
pub fn to_integer(s: &str) -> Result<u32, CliError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CliError::Conversion(s.to_string()));
    }
    s.parse::<u32>()
        .map_err(|_| CliError::Conversion(s.to_string()))
}

/// Read a whole input file as text.
pub fn read_input_file(path: impl AsRef<Path>) -> Result<String, CliError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| CliError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// Unvalidated command parameters, as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Command name.
    pub cmd: Option<String>,
    /// Indexing sub-type.
    pub kind: Option<String>,
    /// Schema file for `init_cluster`.
    pub schema: Option<String>,
    /// Data file for `indexing`.
    pub file: Option<String>,
    /// Directive file for the unnamed control command.
    pub cdirective: Option<String>,
    /// Source replica for `do_recovery`.
    pub from_replica: Option<String>,
    /// Target replica for recovery commands.
    pub replica_id: Option<String>,
    /// Analyzer name for `analyzer_test`.
    pub analyzer_name: Option<String>,
    /// Sample text for `analyzer_test`.
    pub analyzer_text: Option<String>,
    /// Analyzer options for `analyzer_test`.
    pub analyzer_option: Option<String>,
}

/// Require an optional parameter.
pub fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, CliError> {
    value.ok_or(CliError::MissingParameter(name))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use proptest::prelude::*;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    use super::*;

    #[test_case("0" => 0; "zero")]
    #[test_case("42" => 42; "plain")]
    #[test_case("007" => 7; "leading zeros")]
    #[test_case("4294967295" => u32::MAX; "max")]
    fn to_integer_accepts(s: &str) -> u32 {
        to_integer(s).expect("valid integer")
    }

    #[test_case(""; "empty")]
    #[test_case("-1"; "negative")]
    #[test_case("+1"; "explicit sign")]
    #[test_case(" 1"; "leading space")]
    #[test_case("12a"; "trailing garbage")]
    #[test_case("4294967296"; "overflow")]
    fn to_integer_rejects(s: &str) {
        assert!(matches!(to_integer(s), Err(CliError::Conversion(_))));
    }

    proptest! {
        #[test]
        fn to_integer_round_trips_u32(n: u32) {
            prop_assert_eq!(to_integer(&n.to_string()).ok(), Some(n));
        }

        #[test]
        fn to_integer_rejects_non_digits(s in ".*[^0-9].*") {
            prop_assert!(matches!(to_integer(&s), Err(CliError::Conversion(_))));
        }

        #[test]
        fn to_integer_matches_u64_range(s in "[0-9]{1,12}") {
            let wide: u64 = s.parse().expect("digits");
            prop_assert_eq!(to_integer(&s).is_ok(), u32::try_from(wide).is_ok());
        }
    }

    #[test]
    fn read_input_file_returns_content_verbatim() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{{\"doc\": 1}}\n\n  trailing  ").expect("write");

        let content = read_input_file(file.path()).expect("read");
        assert_eq!(content, "{\"doc\": 1}\n\n  trailing  ");
    }

    #[test]
    fn read_input_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_input_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::FileAccess { .. }));
    }

    #[test]
    fn required_distinguishes_absent() {
        assert_eq!(required(Some("x"), "file").expect("present"), "x");
        assert!(matches!(
            required(None, "file"),
            Err(CliError::MissingParameter("file"))
        ));
    }
}
