use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating usernames at signup
    /// Must start with a letter or underscore and contain only alphanumeric
    /// characters, underscores, dots and spaces (Google display names may
    /// contain both).
    /// - Valid: "john_doe", "user123", "_admin", "Anna Kovacs"
    /// - Invalid: "123user", "-user", "user-name", ""
    pub static ref USERNAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_. ]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_regex_valid() {
        assert!(USERNAME_REGEX.is_match("john_doe"));
        assert!(USERNAME_REGEX.is_match("user123"));
        assert!(USERNAME_REGEX.is_match("_admin"));
        assert!(USERNAME_REGEX.is_match("Anna Kovacs"));
        assert!(USERNAME_REGEX.is_match("j.doe"));
    }

    #[test]
    fn test_username_regex_invalid() {
        assert!(!USERNAME_REGEX.is_match("123user")); // starts with digit
        assert!(!USERNAME_REGEX.is_match("-user")); // starts with hyphen
        assert!(!USERNAME_REGEX.is_match("user-name")); // hyphen
        assert!(!USERNAME_REGEX.is_match("")); // empty
        assert!(!USERNAME_REGEX.is_match(" user")); // leading space
    }
}
