//! Utility modules supporting the tool operations.
//!
//! - [`sanitize_sgf_path`]: Validate a requested SGF path before it touches the file system
//! - [`parse_move`]: Parse a GTP move such as `Q16` or `pass`
//! - [`expand_tilde`]: Expand a leading `~` in configured paths
//!
//! # Validation
//!
//! ```rust
//! use katago_mcp::utils::{parse_move, sanitize_sgf_path};
//!
//! assert!(sanitize_sgf_path("../outside.sgf").is_err());
//! assert_eq!(parse_move("pass", 19).unwrap(), None);
//! assert!(parse_move("Z99", 19).is_err());
//! ```

mod paths;
mod validate;

pub use paths::expand_tilde;
pub use validate::{parse_move, sanitize_sgf_path, ValidationError};
