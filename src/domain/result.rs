//! Result type alias

use super::errors::AppError;

/// Result type alias for application operations
///
/// # Examples
///
/// ```
/// use webscaffold::domain::result::Result;
/// use webscaffold::domain::errors::AppError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AppError::Io(std::io::ErrorKind::NotFound.into()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AppError>;
