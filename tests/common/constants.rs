//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When seeded test data changes, update only this file.

// ============================================================================
// Seeded Test Accounts
// ============================================================================

/// Seeded influencer account email
pub const INFLUENCER_USER: &str = "influencer@test.com";

/// Seeded influencer account password
pub const INFLUENCER_PASS: &str = "influencerpass123";

/// Seeded collaborator account email
pub const COLLABORATOR_USER: &str = "collaborator@test.com";

/// Seeded collaborator account password
pub const COLLABORATOR_PASS: &str = "collaboratorpass123";

/// Seeded admin account email
pub const ADMIN_USER: &str = "admin@test.com";

/// Seeded admin account password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Payloads
// ============================================================================

/// Smallest recognizable PNG prefix, enough for MIME sniffing
pub const TEST_IMAGE_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
