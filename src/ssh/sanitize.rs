//! Command sanitization and escaping utilities
//!
//! Provides functions for validating and escaping commands before SSH execution.

use crate::error::{Result, RpitxError};

/// Sanitize a command before execution
///
/// Validates that the command is not empty and trims whitespace.
///
/// # Examples
/// ```
/// use rpitx_remote::ssh::sanitize::sanitize_command;
///
/// let cmd = sanitize_command("  ls -la  ").unwrap();
/// assert_eq!(cmd, "ls -la");
/// ```
pub fn sanitize_command(command: &str) -> Result<String> {
    let trimmed = command.trim();

    if trimmed.is_empty() {
        return Err(RpitxError::invalid_params("Command cannot be empty"));
    }

    Ok(trimmed.to_string())
}

/// Escape a command for use in shell contexts (like pkill -f)
///
/// This escapes single quotes in the command so it can be safely
/// used inside single-quoted shell strings.
///
/// # Example
/// ```
/// use rpitx_remote::ssh::sanitize::escape_command_for_shell;
///
/// let escaped = escape_command_for_shell("echo 'hello'");
/// assert_eq!(escaped, "echo '\"'\"'hello'\"'\"'");
/// ```
pub fn escape_command_for_shell(command: &str) -> String {
    // Replace single quotes with escaped single quotes
    // 'word' becomes '"'"'word'"'"'
    command.replace('\'', "'\"'\"'")
}

/// Escapes a string for safe use in single-quoted shell contexts
///
/// Used for operator-supplied text arguments (POCSAG messages, RTTY text,
/// Opera callsigns) that are passed to the remote scripts inside single
/// quotes.
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_command_valid() {
        let result = sanitize_command("ls -la");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "ls -la");
    }

    #[test]
    fn test_sanitize_command_trims_whitespace() {
        let result = sanitize_command("  ls -la  ");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "ls -la");
    }

    #[test]
    fn test_sanitize_command_empty() {
        let result = sanitize_command("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_sanitize_command_whitespace_only() {
        let result = sanitize_command("   ");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_escape_command_for_shell_no_quotes() {
        let escaped = escape_command_for_shell("ls -la");
        assert_eq!(escaped, "ls -la");
    }

    #[test]
    fn test_escape_command_for_shell_with_quotes() {
        let escaped = escape_command_for_shell("echo 'hello'");
        assert_eq!(escaped, "echo '\"'\"'hello'\"'\"'");
    }

    #[test]
    fn test_escape_for_shell_no_quotes() {
        assert_eq!(escape_for_shell("hello world"), "hello world");
    }

    #[test]
    fn test_escape_for_shell_single_quote() {
        assert_eq!(escape_for_shell("it's"), "it'\"'\"'s");
    }

    #[test]
    fn test_escape_for_shell_multiple_quotes() {
        assert_eq!(
            escape_for_shell("'a' and 'b'"),
            "'\"'\"'a'\"'\"' and '\"'\"'b'\"'\"'"
        );
    }

    #[test]
    fn test_escape_for_shell_empty() {
        assert_eq!(escape_for_shell(""), "");
    }
}
