//! Process exit codes.
//!
//! Scripts rely on these staying stable. A verify that finds a revoked
//! certificate is not an error, but it does not exit 0 either.

use certreg_client::{ClientError, SessionError};
use certreg_registry::RegistryError;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
pub const REVOKED: u8 = 2;
pub const NOT_FOUND: u8 = 3;
pub const MALFORMED_ID: u8 = 4;
pub const INVALID_INPUT: u8 = 5;
pub const UNAUTHORIZED: u8 = 6;
pub const ALREADY_REVOKED: u8 = 7;
pub const INVALID_SIGNATURE: u8 = 8;
pub const NO_IDENTITY: u8 = 9;
pub const UNREACHABLE: u8 = 10;
pub const INTEGRITY: u8 = 11;

/// Exit code for a client error.
pub fn code_for(err: &ClientError) -> u8 {
    match err {
        ClientError::Registry(e) => match e {
            RegistryError::Unauthorized { .. } => UNAUTHORIZED,
            RegistryError::InvalidInput { .. } => INVALID_INPUT,
            RegistryError::NotFound(_) => NOT_FOUND,
            RegistryError::MalformedId { .. } => MALFORMED_ID,
            RegistryError::AlreadyRevoked(_) => ALREADY_REVOKED,
            RegistryError::InvalidSignature(_) => INVALID_SIGNATURE,
            RegistryError::ChainIntegrity { .. } => INTEGRITY,
            RegistryError::Canonicalization(_) => FAILURE,
        },
        ClientError::Session(
            SessionError::NoSigningAgent | SessionError::NotConnected | SessionError::KeyFile { .. },
        ) => NO_IDENTITY,
        ClientError::Session(SessionError::UserRejected) => FAILURE,
        ClientError::Transport(_) => UNREACHABLE,
        ClientError::IdExtractionFailed { .. } | ClientError::Config(_) | ClientError::Pending(_) => {
            FAILURE
        }
    }
}
