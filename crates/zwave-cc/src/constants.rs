//! Command ids for the command classes implemented in this crate.

// ============================================================================
// Basic (0x20)
// ============================================================================

/// Set the basic level.
pub const BASIC_SET: u8 = 0x01;
/// Request the basic level.
pub const BASIC_GET: u8 = 0x02;
/// Report the basic level.
pub const BASIC_REPORT: u8 = 0x03;

// ============================================================================
// Scene Actuator Configuration (0x2C)
// ============================================================================

/// Configure a scene.
pub const SCENE_ACTUATOR_CONF_SET: u8 = 0x01;
/// Request a scene configuration.
pub const SCENE_ACTUATOR_CONF_GET: u8 = 0x02;
/// Report a scene configuration.
pub const SCENE_ACTUATOR_CONF_REPORT: u8 = 0x03;

// ============================================================================
// Color Switch (0x33)
// ============================================================================

/// Request supported color components.
pub const COLOR_SWITCH_SUPPORTED_GET: u8 = 0x01;
/// Report supported color components.
pub const COLOR_SWITCH_SUPPORTED_REPORT: u8 = 0x02;
/// Request one color component.
pub const COLOR_SWITCH_GET: u8 = 0x03;
/// Report one color component.
pub const COLOR_SWITCH_REPORT: u8 = 0x04;
/// Set one or more color components.
pub const COLOR_SWITCH_SET: u8 = 0x05;

// ============================================================================
// Multi Channel (0x60)
// ============================================================================

/// Endpoint-addressed encapsulation.
pub const MULTI_CHANNEL_CMD_ENCAP: u8 = 0x0D;

// ============================================================================
// Supervision (0x6C)
// ============================================================================

/// Supervised delivery of an encapsulated command.
pub const SUPERVISION_GET: u8 = 0x01;
/// Supervision status.
pub const SUPERVISION_REPORT: u8 = 0x02;

// ============================================================================
// Configuration (0x70)
// ============================================================================

/// Reset all parameters to their defaults (v4).
pub const CONFIGURATION_DEFAULT_RESET: u8 = 0x01;
/// Set one parameter.
pub const CONFIGURATION_SET: u8 = 0x04;
/// Request one parameter.
pub const CONFIGURATION_GET: u8 = 0x05;
/// Report one parameter.
pub const CONFIGURATION_REPORT: u8 = 0x06;
/// Request a run of consecutive parameters (v2).
pub const CONFIGURATION_BULK_GET: u8 = 0x08;
/// Report a run of consecutive parameters (v2).
pub const CONFIGURATION_BULK_REPORT: u8 = 0x09;
/// Request a parameter name (v3).
pub const CONFIGURATION_NAME_GET: u8 = 0x0A;
/// Report a parameter name (v3).
pub const CONFIGURATION_NAME_REPORT: u8 = 0x0B;
/// Request a parameter description (v3).
pub const CONFIGURATION_INFO_GET: u8 = 0x0C;
/// Report a parameter description (v3).
pub const CONFIGURATION_INFO_REPORT: u8 = 0x0D;
/// Request parameter properties (v3).
pub const CONFIGURATION_PROPERTIES_GET: u8 = 0x0E;
/// Report parameter properties (v3).
pub const CONFIGURATION_PROPERTIES_REPORT: u8 = 0x0F;

// ============================================================================
// Multi Command (0x8F)
// ============================================================================

/// Batch of encapsulated commands.
pub const MULTI_COMMAND_ENCAP: u8 = 0x01;

// ============================================================================
// Security 2 (0x9F)
// ============================================================================

/// Request a fresh receiver entropy input.
pub const SECURITY_2_NONCE_GET: u8 = 0x01;
/// Provide a receiver entropy input.
pub const SECURITY_2_NONCE_REPORT: u8 = 0x02;
/// Encrypted message encapsulation.
pub const SECURITY_2_MESSAGE_ENCAP: u8 = 0x03;

// ============================================================================
// Limits
// ============================================================================

/// First byte value that introduces a two-byte CC id.
pub const EXTENDED_CC_MARKER: u8 = 0xF1;

/// Largest payload that fits a one-byte length field.
pub const MAX_EMBEDDED_LEN: usize = u8::MAX as usize;
