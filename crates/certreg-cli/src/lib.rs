//! # certreg-cli -- Operator CLI for the Certificate Registry
//!
//! Provides the `certreg` command-line interface.
//!
//! ## Subcommands
//!
//! - `certreg keygen` -- generate an Ed25519 key file.
//! - `certreg whoami` -- identity of the configured key.
//! - `certreg admin` -- the registry's admin identity.
//! - `certreg issue` -- issue a certificate (admin only).
//! - `certreg verify` -- look up a certificate by id.
//! - `certreg revoke` -- revoke a certificate (admin only).
//! - `certreg recover` -- find the committed record of an interrupted call.
//! - `certreg pending` -- list or drop requests whose outcome is unknown.
//!
//! Signed requests that have not reached a definitive outcome are kept in a
//! pending file next to the key (`admin.key` -> `admin.pending.json`), so
//! re-running an interrupted `issue` resubmits the same transaction.
//!
//! ```bash
//! certreg keygen --output ~/.certreg --prefix admin
//! certreg --key ~/.certreg/admin.key issue "Alice" "CS101" "State U"
//! certreg verify 0x3f…
//! ```
//!
//! Every failure kind exits with its own code; see [`exit`].

use std::path::{Path, PathBuf};

pub mod commands;
pub mod exit;
pub mod keys;

/// Where the pending-request file for `key` lives unless `--pending` says
/// otherwise.
pub fn default_pending_file(key: &Path) -> PathBuf {
    key.with_extension("pending.json")
}

/// What a command prints and the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Exit code.
    pub exit: u8,
    /// Lines for stdout.
    pub lines: Vec<String>,
}

impl Report {
    /// A successful report.
    pub fn ok(lines: Vec<String>) -> Self {
        Self {
            exit: exit::SUCCESS,
            lines,
        }
    }

    /// Print to stdout and return the exit code.
    pub fn emit(self) -> u8 {
        for line in &self.lines {
            println!("{line}");
        }
        self.exit
    }
}
