//! Result type alias for Aegis
//!
//! This module provides a convenient Result type alias that uses AegisError
//! as the error type.

use super::errors::AegisError;

/// Result type alias for Aegis operations
///
/// # Examples
///
/// ```
/// use aegis::domain::result::Result;
/// use aegis::domain::errors::AegisError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AegisError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AegisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{AdapterError, AegisError};

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(AegisError::Io("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> std::result::Result<i32, AdapterError> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
