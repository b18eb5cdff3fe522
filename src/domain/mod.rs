//! Crate-wide error handling
//!
//! Module errors ([`crate::config::ValidationError`], [`crate::stores::StoreError`],
//! [`crate::registry::RegistryError`] and friends) convert into [`AppError`]
//! with `?`:
//!
//! ```rust,no_run
//! use webscaffold::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = webscaffold::config::load_config()?;
//!     println!("{}", config.app.env);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod result;

pub use errors::AppError;
pub use result::Result;
