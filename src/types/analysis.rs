use std::fmt;

use serde::Serialize;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::record::RecordKind;

/// A decrypted password. Wiped from memory on drop and redacted in debug output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Plaintext(String);

impl Plaintext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Plaintext(***)")
    }
}

/// Display reference to the entry owning a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRef {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
}

/// A password scored during one analysis run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedPassword {
    pub score: usize,
    pub plaintext: Plaintext,
    pub entry: EntryRef,
    pub detail: Uuid,
}

/// Two or more passwords sharing the same plaintext, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub password: Plaintext,
    pub members: Vec<AnalyzedPassword>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Why a record was left out of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// The authentication tag did not verify.
    Authentication,
    /// The key store failed.
    KeyProvider(String),
    /// The key store did not answer within the configured timeout.
    Timeout,
    /// The decrypted record could not be decoded.
    Decode(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Authentication => write!(f, "authentication failed"),
            FailureReason::KeyProvider(msg) => write!(f, "key provider failed: {}", msg),
            FailureReason::Timeout => write!(f, "key provider timed out"),
            FailureReason::Decode(msg) => write!(f, "decode failed: {}", msg),
        }
    }
}

/// The record an analysis failure refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailedRecord {
    /// The account itself failed; all of its details were skipped.
    Account(Uuid),
    Detail { account: Uuid, detail: Uuid },
    /// A stored row whose identifier is not a valid UUID.
    Unidentified { kind: RecordKind, id: String },
}

impl fmt::Display for FailedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedRecord::Account(id) => write!(f, "account {}", id),
            FailedRecord::Detail { account, detail } => {
                write!(f, "detail {} of account {}", detail, account)
            }
            FailedRecord::Unidentified { kind, id } => write!(f, "{} row {:?}", kind.as_str(), id),
        }
    }
}

/// A record that could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub record: FailedRecord,
    pub reason: FailureReason,
}

/// Results of one analysis run, published as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub passwords: Vec<AnalyzedPassword>,
    pub total_gates: usize,
    pub required_gates: usize,
    pub average_score: f64,
    pub weak: Vec<AnalyzedPassword>,
    pub duplicates: Vec<DuplicateGroup>,
    pub failures: Vec<AnalysisFailure>,
    pub started_at: i64,
    pub finished_at: i64,
}

impl AnalysisReport {
    pub fn is_weak(&self, password: &AnalyzedPassword) -> bool {
        password.score <= self.required_gates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisState {
    Idle,
    Running,
    Finished,
}

/// What analysis consumers observe: the current state and the latest finished report.
#[derive(Debug, Clone)]
pub struct AnalysisStatus {
    pub state: AnalysisState,
    pub report: Option<std::sync::Arc<AnalysisReport>>,
}

impl Default for AnalysisStatus {
    fn default() -> Self {
        Self {
            state: AnalysisState::Idle,
            report: None,
        }
    }
}
