//! Certificate validity windows.
//!
//! A validity window is always strictly ordered: notBefore < notAfter.
//! Degenerate windows are rejected at construction, before any key
//! material is generated for the certificate that would carry them.

use crate::error::{CertmeshError, Result};
use time::{Duration, OffsetDateTime};

/// A [notBefore, notAfter] certificate validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
}

impl ValidityWindow {
    /// Create a window, rejecting notAfter <= notBefore.
    pub fn new(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Result<Self> {
        if not_after <= not_before {
            return Err(CertmeshError::InvalidValidity(format!(
                "notAfter ({}) must be after notBefore ({})",
                not_after, not_before
            )));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// A window starting now and lasting the given number of days.
    ///
    /// # Example
    ///
    /// ```
    /// use certmesh::cert::validity::ValidityWindow;
    ///
    /// let window = ValidityWindow::days_from_now(1000).unwrap();
    /// assert!(ValidityWindow::days_from_now(0).is_err());
    /// ```
    pub fn days_from_now(days: u32) -> Result<Self> {
        let not_before = OffsetDateTime::now_utc();
        Self::new(not_before, not_before + Duration::days(i64::from(days)))
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    /// Whether `inner` lies entirely within this window (inclusive bounds).
    pub fn contains(&self, inner: &ValidityWindow) -> bool {
        self.not_before <= inner.not_before && inner.not_after <= self.not_after
    }
}

impl std::fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.not_before, self.not_after)
    }
}
