// =============================================================================
// ElevatED Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default HTTP port when PORT is not set
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default database pool size when DB_MAX_CONNECTIONS is not set
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// MENTORSHIP PROTOCOL
// =============================================================================

/// Maximum length (in characters) of a chat request message
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// How many times channel provisioning is attempted before an accept gives up
/// and leaves the request pending
pub const CHANNEL_PROVISION_ATTEMPTS: usize = 3;

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// Buffer size for each event-bus subscriber queue. Live views coalesce to
/// the latest set, so this only bounds how many change signals a busy
/// watcher can fall behind by.
pub const EVENT_BUS_BUFFER_SIZE: usize = 256;
