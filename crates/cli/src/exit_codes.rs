//! CLI Exit Code Registry
//!
//! Single source of truth for `expensor` exit codes. Scripts rely on them.
//!
//! | Range | Domain    | Description                                   |
//! |-------|-----------|-----------------------------------------------|
//! | 0     | Universal | Success                                       |
//! | 1     | Universal | General error                                 |
//! | 2     | Universal | Usage error (bad args, unsupported file)      |
//! | 3-9   | io        | Reading inputs, writing outputs, settings     |
//! | 10-19 | key       | API key and keychain                          |
//! | 20-29 | batch     | Batch validation and recognition outcomes     |

// =============================================================================
// Universal (0-2)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// Avoid; prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments, missing or unsupported input files.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// IO (3-9)
// =============================================================================

/// Cannot read an input or write an output file.
pub const EXIT_IO: u8 = 3;

/// Records file or settings.json is not valid JSON of the expected shape.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Key (10-19)
// =============================================================================

/// No API key in the keychain or EXPENSOR_API_KEY.
pub const EXIT_MISSING_KEY: u8 = 10;

/// Keychain read/write failed or keychain support not compiled in.
pub const EXIT_KEYCHAIN: u8 = 11;

// =============================================================================
// Batch (20-29)
// =============================================================================

/// Batch rejected before recognition (options, configuration, empty document).
pub const EXIT_BATCH_INVALID: u8 = 20;

/// Every file failed recognition; nothing was reconciled.
pub const EXIT_BATCH_ALL_FAILED: u8 = 21;

/// Batch completed but at least one page ended as a placeholder record.
pub const EXIT_BATCH_PARTIAL: u8 = 22;
