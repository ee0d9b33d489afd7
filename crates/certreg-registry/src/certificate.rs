//! # Certificates
//!
//! A [`Certificate`] is created by an issue operation and never deleted. Its
//! text fields and issue date are immutable; `is_valid` moves from `true` to
//! `false` at most once.
//!
//! The id is SHA-256 over the canonical encoding of the content and the
//! issuance context (issuer, issue date, and the registry's issuance
//! sequence number). Including the sequence number means identical content
//! issued twice gets two distinct ids.

use certreg_core::{sha256_digest, CanonicalBytes, CertificateId, Identity, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Upper bound on each text field, in characters.
pub const MAX_FIELD_CHARS: usize = 256;

/// The caller-supplied content of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateFields {
    /// Name of the student the certificate is awarded to.
    pub student_name: String,
    /// Course or programme completed.
    pub course: String,
    /// Awarding institution.
    pub institution: String,
}

impl CertificateFields {
    /// Convenience constructor.
    pub fn new(
        student_name: impl Into<String>,
        course: impl Into<String>,
        institution: impl Into<String>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            course: course.into(),
            institution: institution.into(),
        }
    }

    /// Reject empty, whitespace-only, or oversized fields. Fields are checked
    /// in declaration order and the first failure is reported.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (field, value) in [
            ("student_name", &self.student_name),
            ("course", &self.course),
            ("institution", &self.institution),
        ] {
            if value.trim().is_empty() {
                return Err(RegistryError::InvalidInput {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            let chars = value.chars().count();
            if chars > MAX_FIELD_CHARS {
                return Err(RegistryError::InvalidInput {
                    field: field.to_string(),
                    reason: format!("{chars} characters exceeds the limit of {MAX_FIELD_CHARS}"),
                });
            }
        }
        Ok(())
    }
}

/// Hashed to produce a certificate id.
#[derive(Serialize)]
struct IdPreimage<'a> {
    student_name: &'a str,
    course: &'a str,
    institution: &'a str,
    issuer: Identity,
    issue_date: Timestamp,
    sequence: u64,
}

/// Derive the id for a certificate about to be issued.
pub(crate) fn derive_id(
    fields: &CertificateFields,
    issuer: Identity,
    issue_date: Timestamp,
    sequence: u64,
) -> Result<CertificateId, RegistryError> {
    let preimage = IdPreimage {
        student_name: &fields.student_name,
        course: &fields.course,
        institution: &fields.institution,
        issuer,
        issue_date,
        sequence,
    };
    let canonical = CanonicalBytes::new(&preimage)?;
    Ok(CertificateId::from_digest(&sha256_digest(&canonical)))
}

/// A stored certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Content-derived identifier.
    pub id: CertificateId,
    /// Certificate content.
    pub fields: CertificateFields,
    /// Registry time at issuance.
    pub issue_date: Timestamp,
    /// Identity that issued the certificate.
    pub issuer: Identity,
    /// `false` once revoked.
    pub is_valid: bool,
    /// Registry time of revocation.
    pub revoked_at: Option<Timestamp>,
}

impl Certificate {
    /// Read-only projection handed to verifiers.
    pub fn view(&self) -> CertificateView {
        CertificateView {
            id: self.id,
            student_name: self.fields.student_name.clone(),
            course: self.fields.course.clone(),
            institution: self.fields.institution.clone(),
            issue_date: self.issue_date,
            issue_date_unix: self.issue_date.epoch_secs(),
            is_valid: self.is_valid,
            issuer: self.issuer,
            revoked_at: self.revoked_at,
        }
    }
}

/// What `verify` returns: the original five-tuple plus audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateView {
    /// Certificate id.
    pub id: CertificateId,
    /// Student name.
    pub student_name: String,
    /// Course.
    pub course: String,
    /// Institution.
    pub institution: String,
    /// Issue date.
    pub issue_date: Timestamp,
    /// Issue date as unix seconds.
    pub issue_date_unix: i64,
    /// Whether the certificate is still valid.
    pub is_valid: bool,
    /// Issuing identity.
    pub issuer: Identity,
    /// When it was revoked, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
}
