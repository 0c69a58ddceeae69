//! Password analysis engine.
//!
//! A run lists every stored account, decrypts it and its details, scores each password detail
//! against a snapshot of the quality gates and publishes one [`AnalysisReport`]. Only one run may
//! be active at a time. Consumers follow progress through a [`watch`] channel and always see
//! either the previous report or the complete new one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::services::quality_gates::{GateSet, QualityGateEngine};
use crate::services::record_serializer::{Decoded, Record, RecordHeader, RecordSerializer};
use crate::types::analysis::{
    AnalysisFailure, AnalysisReport, AnalysisState, AnalysisStatus, AnalyzedPassword,
    DuplicateGroup, EntryRef, FailedRecord, FailureReason, Plaintext,
};
use crate::types::blob::EncryptedBlob;
use crate::types::errors::{AnalysisError, CryptoError, RecordError, StoreError};
use crate::types::record::{now_ts, Account, Detail, RecordKind};
use crate::types::settings::AnalysisSettings;
use crate::types::store::{StoredVault, UnreadableRow};

/// Supplies the encrypted entries an analysis run works on.
///
/// Rows the source cannot parse are handed over as unreadable so the run reports them.
pub trait CredentialSource: Send + Sync {
    fn load_entries(&self) -> Result<StoredVault, StoreError>;
}

/// Result of an analysis task.
pub type AnalysisHandle = JoinHandle<Result<Arc<AnalysisReport>, AnalysisError>>;

struct Shared {
    source: Arc<dyn CredentialSource>,
    serializer: Arc<RecordSerializer>,
    gates: Arc<QualityGateEngine>,
    settings: AnalysisSettings,
    running: AtomicBool,
    cancelled: AtomicBool,
    status: watch::Sender<AnalysisStatus>,
}

/// Clears the running flag when a run ends, however it ends.
struct RunGuard(Arc<Shared>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.status.send_if_modified(|status| {
            if status.state == AnalysisState::Running {
                status.state = if status.report.is_some() {
                    AnalysisState::Finished
                } else {
                    AnalysisState::Idle
                };
                true
            } else {
                false
            }
        });
        self.0.running.store(false, Ordering::SeqCst);
    }
}

pub struct PasswordAnalysis {
    shared: Arc<Shared>,
}

impl PasswordAnalysis {
    pub fn new(
        source: Arc<dyn CredentialSource>,
        serializer: Arc<RecordSerializer>,
        gates: Arc<QualityGateEngine>,
        settings: AnalysisSettings,
    ) -> Self {
        let (status, _) = watch::channel(AnalysisStatus::default());
        Self {
            shared: Arc::new(Shared {
                source,
                serializer,
                gates,
                settings,
                running: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                status,
            }),
        }
    }

    /// Starts a run in the background.
    ///
    /// Returns `None` without doing anything when a run is already active. Must be called
    /// from within a tokio runtime.
    pub fn analyze(&self) -> Option<AnalysisHandle> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("password analysis already running, request ignored");
            return None;
        }
        self.shared.cancelled.store(false, Ordering::SeqCst);
        let guard = RunGuard(Arc::clone(&self.shared));
        Some(tokio::spawn(async move {
            let result = guard.0.run().await;
            drop(guard);
            result
        }))
    }

    /// Starts a run and waits for its report.
    pub async fn run(&self) -> Result<Arc<AnalysisReport>, AnalysisError> {
        let handle = self.analyze().ok_or(AnalysisError::AlreadyRunning)?;
        handle
            .await
            .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?
    }

    /// Asks the active run to stop. The previous report stays published.
    pub fn cancel(&self) {
        if self.shared.running.load(Ordering::SeqCst) {
            info!("password analysis cancellation requested");
            self.shared.cancelled.store(true, Ordering::SeqCst);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.shared.status.subscribe()
    }

    pub fn state(&self) -> AnalysisState {
        self.shared.status.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The report of the last completed run, if any.
    pub fn latest_report(&self) -> Option<Arc<AnalysisReport>> {
        self.shared.status.borrow().report.clone()
    }
}

impl Shared {
    async fn run(&self) -> Result<Arc<AnalysisReport>, AnalysisError> {
        self.status.send_modify(|status| status.state = AnalysisState::Running);
        let started_at = now_ts();
        info!("password analysis started");

        let source = Arc::clone(&self.source);
        let vault = tokio::task::spawn_blocking(move || source.load_entries())
            .await
            .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let gates = self.gates.snapshot();
        let mut passwords = Vec::new();
        let mut failures: Vec<AnalysisFailure> = vault
            .unreadable
            .iter()
            .map(|row| unreadable_failure(row, None))
            .collect();

        for entry in vault.accounts {
            self.check_cancelled()?;
            let account = match self
                .open::<Account>(entry.blob, RecordHeader::account(entry.id))
                .await
            {
                Ok(decoded) => decoded.record,
                Err(reason) => {
                    warn!(account = %entry.id, %reason, "account skipped");
                    failures.push(AnalysisFailure {
                        record: FailedRecord::Account(entry.id),
                        reason,
                    });
                    continue;
                }
            };
            let owner = EntryRef {
                id: account.id,
                name: account.name,
                logo: entry.logo,
            };
            failures.extend(
                entry
                    .unreadable
                    .iter()
                    .map(|row| unreadable_failure(row, Some(entry.id))),
            );

            for stored in entry.details {
                self.check_cancelled()?;
                let header = RecordHeader::detail(stored.id, entry.id);
                let mut detail = match self.open::<Detail>(stored.blob, header).await {
                    Ok(decoded) => decoded.record,
                    Err(reason) => {
                        warn!(account = %entry.id, detail = %stored.id, %reason, "detail skipped");
                        failures.push(AnalysisFailure {
                            record: FailedRecord::Detail {
                                account: entry.id,
                                detail: stored.id,
                            },
                            reason,
                        });
                        continue;
                    }
                };
                if detail.is_password() {
                    let plaintext = Plaintext::new(std::mem::take(&mut detail.content));
                    passwords.push(AnalyzedPassword {
                        score: gates.passed(plaintext.expose()),
                        plaintext,
                        entry: owner.clone(),
                        detail: detail.id,
                    });
                } else {
                    detail.content.zeroize();
                }
            }
        }

        let report = Arc::new(build_report(
            passwords,
            &gates,
            self.settings.weak_threshold_ratio,
            failures,
            started_at,
        ));
        info!(
            passwords = report.passwords.len(),
            weak = report.weak.len(),
            duplicates = report.duplicates.len(),
            failures = report.failures.len(),
            average = report.average_score,
            "password analysis finished"
        );
        self.status.send_replace(AnalysisStatus {
            state: AnalysisState::Finished,
            report: Some(Arc::clone(&report)),
        });
        Ok(report)
    }

    fn check_cancelled(&self) -> Result<(), AnalysisError> {
        if self.cancelled.load(Ordering::SeqCst) {
            info!("password analysis cancelled");
            return Err(AnalysisError::Cancelled);
        }
        Ok(())
    }

    /// Decrypts one record off the async workers, bounded by the key timeout.
    ///
    /// A timed out decryption keeps running on the blocking pool until the key provider
    /// returns; its result is discarded.
    async fn open<R>(
        &self,
        blob: EncryptedBlob,
        header: RecordHeader,
    ) -> Result<Decoded<R>, FailureReason>
    where
        R: Record + Send + 'static,
    {
        let serializer = Arc::clone(&self.serializer);
        let task = tokio::task::spawn_blocking(move || serializer.open::<R>(&blob, header));
        match tokio::time::timeout(self.settings.key_timeout(), task).await {
            Err(_) => Err(FailureReason::Timeout),
            Ok(Err(join)) => Err(FailureReason::KeyProvider(join.to_string())),
            Ok(Ok(result)) => result.map_err(FailureReason::from),
        }
    }
}

impl From<RecordError> for FailureReason {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Crypto(CryptoError::Authentication) => FailureReason::Authentication,
            RecordError::Crypto(CryptoError::KeyProvider(msg)) => FailureReason::KeyProvider(msg),
            RecordError::Crypto(other) => FailureReason::Decode(other.to_string()),
            RecordError::Decode(err) => FailureReason::Decode(err.to_string()),
        }
    }
}

/// Failure for a row the source could not parse. `account` is the owner of a detail row.
fn unreadable_failure(row: &UnreadableRow, account: Option<Uuid>) -> AnalysisFailure {
    let id = Uuid::parse_str(&row.id).ok();
    let record = match (row.kind, account, id) {
        (RecordKind::Account, _, Some(id)) => FailedRecord::Account(id),
        (RecordKind::Detail, Some(account), Some(detail)) => {
            FailedRecord::Detail { account, detail }
        }
        _ => FailedRecord::Unidentified {
            kind: row.kind,
            id: row.id.clone(),
        },
    };
    warn!(%record, reason = %row.reason, "unreadable row skipped");
    AnalysisFailure {
        record,
        reason: FailureReason::Decode(row.reason.clone()),
    }
}

/// Minimum score a password must exceed to not be weak: `round(total * ratio)`.
pub fn required_gates(total: usize, ratio: f64) -> usize {
    (total as f64 * ratio).round() as usize
}

/// Mean score, `0.0` when there are no passwords.
pub fn average_score(passwords: &[AnalyzedPassword]) -> f64 {
    if passwords.is_empty() {
        return 0.0;
    }
    let sum: usize = passwords.iter().map(|p| p.score).sum();
    sum as f64 / passwords.len() as f64
}

/// Groups passwords with identical plaintexts.
///
/// Groups and their members appear in first-occurrence order. Members are distinct positions
/// in `passwords`, so two details sharing an owner and a plaintext are still both reported.
pub fn find_duplicates(passwords: &[AnalyzedPassword]) -> Vec<DuplicateGroup> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..passwords.len() {
        for j in (i + 1)..passwords.len() {
            if passwords[i].plaintext != passwords[j].plaintext {
                continue;
            }
            match groups
                .iter_mut()
                .find(|group| passwords[group[0]].plaintext == passwords[i].plaintext)
            {
                Some(group) => {
                    if !group.contains(&j) {
                        group.push(j);
                    }
                }
                None => groups.push(vec![i, j]),
            }
        }
    }

    groups
        .into_iter()
        .map(|group| DuplicateGroup {
            password: passwords[group[0]].plaintext.clone(),
            members: group.iter().map(|&k| passwords[k].clone()).collect(),
        })
        .collect()
}

/// Derives the report figures from the scored passwords.
pub fn build_report(
    passwords: Vec<AnalyzedPassword>,
    gates: &GateSet,
    ratio: f64,
    failures: Vec<AnalysisFailure>,
    started_at: i64,
) -> AnalysisReport {
    let total_gates = gates.total();
    let required = required_gates(total_gates, ratio);
    let weak = passwords
        .iter()
        .filter(|p| p.score <= required)
        .cloned()
        .collect();
    AnalysisReport {
        average_score: average_score(&passwords),
        duplicates: find_duplicates(&passwords),
        weak,
        total_gates,
        required_gates: required,
        failures,
        started_at,
        finished_at: now_ts(),
        passwords,
    }
}
