//! Exit codes for the CLI.
//!
//! These follow common Unix conventions so scripts can tell a bad
//! invocation apart from a run that could not write its output.

/// Successful execution, including runs where some listings or downloads
/// failed
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line or configuration error (bad arguments, malformed config file)
pub const USAGE_ERROR: u8 = 2;

/// Could not reach the server, or it rejected the connection check
pub const CONNECTION_FAILED: u8 = 3;

/// Permission denied while creating the local tree
pub const PERMISSION_DENIED: u8 = 5;
