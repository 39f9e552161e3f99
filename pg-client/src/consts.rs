//! Constants used by the PostGuard client.

/// Version 0 of the sealed format.
///
/// This version uses the CGW anonymous IBE scheme to encapsulate a shared secret for a single
/// attribute identity. The header is defined by bincode.
pub const VERSION_V1: u16 = 0;

/// The size of the tag with which all sealed bytestreams begin.
pub const PRELUDE_SIZE: usize = 4;

/// The tag bytes with which all sealed bytestreams begin.
pub const PRELUDE: [u8; PRELUDE_SIZE] = [0x14, 0x8A, 0x8E, 0xA7];

/// The size of the version identifier.
pub const VERSION_SIZE: usize = std::mem::size_of::<u16>();

/// The size of the header size.
pub const HEADER_SIZE_SIZE: usize = std::mem::size_of::<u32>();

/// The maximum size of the header (4 MiB).
pub const MAX_HEADER_SIZE: usize = 1024 * 1024 * 4;

/// The preamble contains the following bytes:
/// * Prelude: 4 bytes,
/// * Version identifier: 2 bytes,
/// * Size of header: 4 bytes,
/// * Totalling: 4 + 2 + 4 = 10 bytes.
pub const PREAMBLE_SIZE: usize = PRELUDE_SIZE + VERSION_SIZE + HEADER_SIZE_SIZE;

// Symmetric crypto constants.
// This library uses AES128 because BLS12-381 is only secure up to around 120 bits.

/// Size of the symmetric key.
pub const KEY_SIZE: usize = 16;

/// Size of the initialization vector.
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag.
pub const TAG_SIZE: usize = 16;

// Payload padding.

/// Payloads are padded to a multiple of `2^PAYLOAD_BLOCK_BITS` bytes.
pub const PAYLOAD_BLOCK_BITS: u32 = 9;

/// The padding granularity (512 bytes).
pub const PAYLOAD_BLOCK_SIZE: usize = 1 << PAYLOAD_BLOCK_BITS;

/// The size of the big-endian length prefix of a padded payload.
pub const PAYLOAD_LEN_SIZE: usize = std::mem::size_of::<u16>();

/// Serialized payloads must be strictly shorter than this.
pub const MAX_PAYLOAD_LEN: usize = 65534;

// Client defaults.

/// The PKG that is used when none is given.
pub const DEFAULT_PKG_URL: &str = "https://main.irmaseal-pkg.ihub.ru.nl";

/// The IRMA server behind the PKGs hosted at `ihub.ru.nl`, against which their relative session
/// pointers resolve.
pub const IHUB_IRMA_URL: &str = "https://ihub.ru.nl/irma/1/";

/// Interval between two IRMA session status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Number of IRMA session status polls before a verification is given up on.
pub const DEFAULT_MAX_POLLS: u32 = 120;
