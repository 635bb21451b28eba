//! Replay Integrity Engine
//!
//! Takes replay-derived data (events, tick snapshots, file bytes) and
//! produces a persisted, reviewable [`ReplayIntegrityReport`]: hash
//! verification, built-in analyzers, pluggable anti-cheat hooks, suspicion
//! scoring and the manual-review workflow.

use crate::integrity::analyzers::{analyze_events, analyze_tick_data};
use crate::integrity::data::ReplayAnalysisData;
use crate::integrity::hooks::{AntiCheatHook, HookRegistry};
use crate::integrity::player::analyze_player;
use crate::integrity::report::{
    IntegrityStatus, IntegrityThresholds, IntegrityViolation, ReplayIntegrityReport,
    ViolationSeverity, ViolationType,
};
use crate::models::CancelFlag;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Stamped on every report so stored analyses can be re-run after
/// detector changes.
pub const ANALYZER_VERSION: &str = "2.0.0";

/// Report persistence port.
#[async_trait::async_trait]
pub trait IntegrityReportRepository: Send + Sync {
    async fn create(&self, report: &ReplayIntegrityReport) -> Result<()>;
    async fn get_by_replay_id(&self, replay_id: Uuid) -> Result<ReplayIntegrityReport>;
    async fn update(&self, report: &ReplayIntegrityReport) -> Result<()>;
    async fn get_pending_reviews(&self, limit: usize) -> Result<Vec<ReplayIntegrityReport>>;
}

/// Replay integrity verification service.
pub struct ReplayIntegrityService {
    report_repo: Option<Arc<dyn IntegrityReportRepository>>,
    hooks: HookRegistry,
    thresholds: IntegrityThresholds,
    analyzer_version: String,
}

impl ReplayIntegrityService {
    pub fn new(
        report_repo: Option<Arc<dyn IntegrityReportRepository>>,
        thresholds: IntegrityThresholds,
    ) -> Self {
        Self {
            report_repo,
            hooks: HookRegistry::new(),
            thresholds,
            analyzer_version: ANALYZER_VERSION.to_string(),
        }
    }

    /// Register an anti-cheat integration. Append-only; no removal API.
    pub fn register_anti_cheat_hook(&self, hook: Arc<dyn AntiCheatHook>) {
        self.hooks.register(hook);
    }

    /// Run the full integrity analysis over one replay.
    pub async fn analyze_replay(&self, data: ReplayAnalysisData) -> Result<ReplayIntegrityReport> {
        self.analyze_with_cancel(data, &CancelFlag::new()).await
    }

    pub async fn analyze_with_cancel(
        &self,
        mut data: ReplayAnalysisData,
        cancel: &CancelFlag,
    ) -> Result<ReplayIntegrityReport> {
        let started = Instant::now();

        // Compute the file hash up front when the caller did not supply one.
        if data.file_hash.is_none() {
            if let Some(reader) = data.file_reader.take() {
                let hash = calculate_file_hash(reader).context("failed to calculate file hash")?;
                data.file_hash = Some(hash);
            }
        }

        let mut report = ReplayIntegrityReport {
            id: Uuid::new_v4(),
            replay_id: data.replay_id,
            game_id: data.game_id.clone(),
            status: IntegrityStatus::Pending,
            file_hash: data.file_hash.clone().unwrap_or_default(),
            expected_hash: None,
            file_size: data.file_size,
            violations: Vec::new(),
            violation_count: 0,
            overall_score: 0.0,
            player_reports: Vec::new(),
            analyzed_at: Utc::now(),
            analysis_duration_ms: 0,
            analyzer_version: self.analyzer_version.clone(),
            game_version: String::new(),
            map_name: String::new(),
            match_duration_seconds: 0.0,
            review_required: false,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: String::new(),
            final_verdict: None,
        };

        if cancel.is_cancelled() {
            bail!("integrity analysis cancelled");
        }

        // Built-in analyzers.
        if !data.events.is_empty() {
            report
                .violations
                .extend(analyze_events(&data.events, &self.thresholds));
        }
        if !data.tick_data.is_empty() {
            report.violations.extend(analyze_tick_data(&data.tick_data));
        }

        // Registered anti-cheat hooks run sequentially; one failing hook
        // never takes the others down with it.
        for hook in self.hooks.snapshot() {
            if cancel.is_cancelled() {
                bail!("integrity analysis cancelled");
            }
            match hook.analyze(&data).await {
                Ok(violations) => report.violations.extend(violations),
                Err(err) => {
                    warn!(
                        hook = hook.name(),
                        error = %format!("{err:#}"),
                        "anti-cheat hook failed, skipping"
                    );
                }
            }
        }

        for player in &data.players {
            report
                .player_reports
                .push(analyze_player(&data, player, &self.thresholds));
        }

        report.violation_count = report.violations.len();
        report.overall_score = calculate_overall_score(&report);
        report.status = determine_status(report.overall_score);
        report.review_required = matches!(
            report.status,
            IntegrityStatus::Suspicious | IntegrityStatus::Flagged
        );
        report.analysis_duration_ms = started.elapsed().as_millis() as u64;

        // Best-effort persistence: the analysis itself succeeded, so a
        // storage failure is logged and the in-memory report still returned.
        if let Some(repo) = &self.report_repo {
            if let Err(err) = repo.create(&report).await {
                error!(
                    replay_id = %data.replay_id,
                    error = %format!("{err:#}"),
                    "failed to save integrity report"
                );
            }
        }

        info!(
            replay_id = %data.replay_id,
            status = ?report.status,
            violations = report.violation_count,
            score = report.overall_score,
            duration_ms = report.analysis_duration_ms,
            "replay integrity analysis complete"
        );

        Ok(report)
    }

    /// Recompute the SHA-256 of `reader` and compare against `expected_hash`.
    /// A mismatch yields a single critical violation; a match yields `None`.
    pub fn verify_file_hash(
        &self,
        _replay_id: Uuid,
        expected_hash: &str,
        reader: impl Read,
    ) -> Result<Option<IntegrityViolation>> {
        let actual_hash = calculate_file_hash(reader).context("failed to calculate hash")?;

        if actual_hash != expected_hash {
            return Ok(Some(
                IntegrityViolation::new(
                    ViolationType::HashMismatch,
                    ViolationSeverity::Critical,
                    1.0,
                    "Replay file hash does not match expected value",
                )
                .with_evidence(serde_json::json!({
                    "expected_hash": expected_hash,
                    "actual_hash": actual_hash,
                })),
            ));
        }

        Ok(None)
    }

    /// Record a human reviewer's verdict against an existing report.
    ///
    /// A `Valid` verdict clears the review flag; any other verdict keeps the
    /// computed status alongside the recorded final verdict.
    pub async fn review_report(
        &self,
        report_id: Uuid,
        reviewer_id: Uuid,
        verdict: IntegrityStatus,
        notes: impl Into<String>,
    ) -> Result<()> {
        let repo = self
            .report_repo
            .as_ref()
            .context("no report repository configured")?;

        // Reports are 1:1 with replays, so the replay id is the lookup key.
        let mut report = repo
            .get_by_replay_id(report_id)
            .await
            .context("report not found")?;

        report.reviewed_by = Some(reviewer_id);
        report.reviewed_at = Some(Utc::now());
        report.review_notes = notes.into();
        report.final_verdict = Some(verdict);

        if verdict == IntegrityStatus::Valid {
            report.review_required = false;
        }

        repo.update(&report).await
    }

    /// Reports still waiting for a human decision.
    pub async fn get_pending_reviews(&self, limit: usize) -> Result<Vec<ReplayIntegrityReport>> {
        let repo = self
            .report_repo
            .as_ref()
            .context("no report repository configured")?;
        repo.get_pending_reviews(limit).await
    }

    pub fn thresholds(&self) -> &IntegrityThresholds {
        &self.thresholds
    }
}

/// SHA-256 over the whole stream, hex-encoded.
fn calculate_file_hash(mut reader: impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Severity-weighted, confidence-scaled report score plus half of every
/// player's own score, clamped to [0, 100].
fn calculate_overall_score(report: &ReplayIntegrityReport) -> f64 {
    let mut score: f64 = report
        .violations
        .iter()
        .map(|v| v.severity.report_weight() * v.confidence)
        .sum();

    for player_report in &report.player_reports {
        score += player_report.score * 0.5;
    }

    score.min(100.0)
}

/// Three effective bands: >= 80 Flagged, [50, 80) Suspicious, below Valid.
fn determine_status(overall_score: f64) -> IntegrityStatus {
    if overall_score >= 80.0 {
        IntegrityStatus::Flagged
    } else if overall_score >= 50.0 {
        IntegrityStatus::Suspicious
    } else {
        IntegrityStatus::Valid
    }
}
