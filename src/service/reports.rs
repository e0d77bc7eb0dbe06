// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Report Service
//!
//! The only place report plaintext exists in memory:
//!
//! - **Create** encrypts every sensitive field before anything is written and
//!   treats evidence uploads and classification as best-effort enrichments
//! - **Reads** decrypt for verified NGOs, behind the consent and soft-delete
//!   gates in [`crate::storage::visibility`]
//! - **Deleted list** and **statistics** never decrypt anything
//!
//! Listing drops records that fail to decrypt, so `count` may be lower than
//! `totalCount`. A single fetch degrades to blank fields instead.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use super::{ServiceError, ServiceResult};
use crate::audit_log;
use crate::blob::BlobStore;
use crate::cipher::FieldCipher;
use crate::classifier::{classify_or_default, Classifier};
use crate::models::{
    CreateReportForm, DecryptedReport, DeletedReportSummary, ListReportsQuery, MonthlyCount,
    NgoSummary, ReportStatistics, StatisticsQuery, UpdateReportRequest, UpdatedReport, YearMonth,
};
use crate::storage::{
    AuditEventType, DocumentStore, NgoRepository, ReportFilter, ReportRepository, ReportStatus,
    StorageError, StoredReport, UrgencyLevel, VisibilityCheck, VisibilityEnforcer,
};

/// Default page size of the report listing.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Number of monthly buckets in the statistics.
const MONTHLY_BUCKETS: usize = 12;

/// Fresh ids tried before a create gives up on collisions.
const MAX_ID_ATTEMPTS: usize = 3;

const RESOURCE_REPORT: &str = "report";

const REPORT_NOT_FOUND: &str = "Report not found";
const DELETED_REPORT_NOT_FOUND: &str = "Deleted report not found";

/// A validated report submission.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub incident_title: String,
    pub description: String,
    pub date_time: String,
    pub location: String,
    pub phone_number: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub consent_to_share_with_ngo: bool,
}

impl NewReport {
    /// Validate the submitted form fields.
    pub fn from_form(form: CreateReportForm) -> ServiceResult<Self> {
        let required = [
            &form.incident_title,
            &form.description,
            &form.date_time,
            &form.location,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ServiceError::Validation(
                "Missing required fields: Title, Description, Date/Time, and Location are required."
                    .to_string(),
            ));
        }

        let urgency_level = match form.urgency_level.as_deref().map(str::trim) {
            None | Some("") => UrgencyLevel::Normal,
            Some(value) => parse_urgency(value).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "Invalid urgencyLevel '{value}'. Expected Normal or Emergency."
                ))
            })?,
        };

        Ok(Self {
            incident_title: form.incident_title,
            description: form.description,
            date_time: form.date_time,
            location: form.location,
            phone_number: form.phone_number.filter(|p| !p.trim().is_empty()),
            urgency_level,
            consent_to_share_with_ngo: parse_consent(form.consent_to_share_with_ngo.as_deref()),
        })
    }
}

/// One uploaded evidence file.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Confirmation of a persisted submission.
#[derive(Debug, Clone)]
pub struct CreatedReport {
    pub report_id: String,
    pub urgency_level: UrgencyLevel,
    pub evidence_count: usize,
}

/// Result of a listing call.
#[derive(Debug, Clone)]
pub struct ReportListing {
    pub reports: Vec<DecryptedReport>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Result of a case-management update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub report: UpdatedReport,
    pub ignored_fields: Vec<String>,
}

/// Validated listing parameters.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub filter: ReportFilter,
    pub page: usize,
    pub limit: usize,
}

impl ListParams {
    pub fn from_query(query: &ListReportsQuery) -> ServiceResult<Self> {
        let mut filter = ReportFilter::active();

        if let Some(status) = non_blank(query.status.as_deref()) {
            filter.status = Some(status.parse().map_err(|_| {
                ServiceError::Validation(format!("Invalid status filter '{status}'"))
            })?);
        }
        if let Some(urgency) = non_blank(query.urgency_level.as_deref()) {
            filter.urgency_level = Some(parse_urgency(urgency).ok_or_else(|| {
                ServiceError::Validation(format!("Invalid urgencyLevel filter '{urgency}'"))
            })?);
        }
        filter.incident_type = non_blank(query.incident_type.as_deref()).map(str::to_string);
        (filter.created_from, filter.created_to) =
            parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;

        let page = parse_positive(query.page.as_deref()).unwrap_or(1);
        let limit = parse_positive(query.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        Ok(Self {
            filter,
            page,
            limit,
        })
    }
}

/// Report orchestration.
#[derive(Clone)]
pub struct ReportService {
    storage: Arc<DocumentStore>,
    cipher: Arc<FieldCipher>,
    blobs: Arc<dyn BlobStore>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("blob_backend", &self.blobs.backend())
            .field("classifier", &self.classifier.is_some())
            .finish_non_exhaustive()
    }
}

impl ReportService {
    pub fn new(
        storage: Arc<DocumentStore>,
        cipher: Arc<FieldCipher>,
        blobs: Arc<dyn BlobStore>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            storage,
            cipher,
            blobs,
            classifier,
        }
    }

    fn reports(&self) -> ReportRepository<'_> {
        ReportRepository::new(&self.storage)
    }

    // ========== Create ==========

    /// Encrypt and persist an anonymous submission.
    pub async fn create(
        &self,
        input: NewReport,
        files: Vec<EvidenceFile>,
    ) -> ServiceResult<CreatedReport> {
        if !self.cipher.self_test() {
            tracing::error!("Cipher self-test failed, refusing to store report");
            return Err(ServiceError::Configuration(
                "encryption self-test failed".to_string(),
            ));
        }

        let encrypted_incident_title = self.encrypt_required(&input.incident_title)?;
        let encrypted_description = self.encrypt_required(&input.description)?;
        let encrypted_location = self.encrypt_required(&input.location)?;
        let encrypted_date_time = self.encrypt_required(&input.date_time)?;

        let encrypted_phone_number = match input.phone_number.as_deref() {
            Some(phone) if !phone.trim().is_empty() => self.cipher.encrypt(phone)?,
            _ => String::new(),
        };

        let encrypted_evidence_urls = self.store_evidence(files).await;

        let text = format!(
            "{} {} {}",
            input.incident_title, input.description, input.location
        );
        let incident_type = classify_or_default(self.classifier.as_deref(), &text).await;

        let now = Utc::now();
        let report = StoredReport {
            report_id: String::new(),
            encrypted_incident_title,
            encrypted_description,
            encrypted_location,
            encrypted_date_time,
            encrypted_phone_number,
            encrypted_evidence_urls,
            incident_type,
            urgency_level: input.urgency_level,
            consent_to_share_with_ngo: input.consent_to_share_with_ngo,
            status: ReportStatus::Pending,
            assigned_to: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        };

        let service = self.clone();
        let report = tokio::task::spawn_blocking(move || {
            let report =
                service.persist_with_fresh_id(report, || uuid::Uuid::new_v4().to_string())?;
            audit_log!(&service.storage, AuditEventType::ReportCreated, resource: RESOURCE_REPORT, &report.report_id);
            Ok::<_, ServiceError>(report)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("report persistence task failed: {e}")))??;

        tracing::info!(
            report_id = %report.report_id,
            incident_type = %report.incident_type,
            urgency_level = %report.urgency_level,
            evidence_count = report.encrypted_evidence_urls.len(),
            "Encrypted report created"
        );

        Ok(CreatedReport {
            report_id: report.report_id,
            urgency_level: report.urgency_level,
            evidence_count: report.encrypted_evidence_urls.len(),
        })
    }

    fn encrypt_required(&self, value: &str) -> ServiceResult<String> {
        let package = self.cipher.encrypt(value)?;
        if package.is_empty() {
            return Err(ServiceError::Validation(
                "Encryption failed for a required field".to_string(),
            ));
        }
        Ok(package)
    }

    /// Upload and encrypt evidence one file at a time, skipping failures.
    async fn store_evidence(&self, files: Vec<EvidenceFile>) -> Vec<String> {
        let mut packages = Vec::with_capacity(files.len());

        for file in files {
            let url = match self
                .blobs
                .upload(&file.filename, &file.content_type, &file.data)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(
                        backend = self.blobs.backend(),
                        size = file.data.len(),
                        error = %e,
                        "Evidence upload failed, skipping file"
                    );
                    continue;
                }
            };

            match self.cipher.encrypt(&url) {
                Ok(package) if !package.is_empty() => packages.push(package),
                Ok(_) => tracing::warn!("Evidence URL was empty, skipping file"),
                Err(e) => tracing::warn!(error = %e, "Evidence URL encryption failed, skipping file"),
            }
        }

        packages
    }

    /// Persist under a fresh id, retrying with a new one on collision.
    ///
    /// The returned report carries the id that was actually written.
    fn persist_with_fresh_id(
        &self,
        mut report: StoredReport,
        mut next_id: impl FnMut() -> String,
    ) -> ServiceResult<StoredReport> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            report.report_id = next_id();
            match self.reports().create(&report) {
                Ok(()) => return Ok(report),
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::warn!(attempt, "Report id collision, retrying with a fresh id");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Internal(
            "could not allocate a unique report id".to_string(),
        ))
    }

    // ========== Read ==========

    /// Load a live report an NGO may see.
    fn load_visible(&self, report_id: &str) -> ServiceResult<StoredReport> {
        self.reports()
            .find_active(report_id)?
            .visible_to_ngo(report_id)
            .map_err(|e| not_found_as(REPORT_NOT_FOUND)(e.into()))
    }

    /// Page through shared, live reports, newest first.
    pub fn list(&self, params: &ListParams) -> ServiceResult<ReportListing> {
        let skip = (params.page - 1).saturating_mul(params.limit);
        let page = self.reports().query(&params.filter, skip, params.limit)?;

        let mut refs = NgoRefs::new(&self.storage);
        let reports: Vec<DecryptedReport> = page
            .reports
            .iter()
            .filter_map(|report| self.decrypt_strict(report, &mut refs))
            .collect();

        if reports.len() < page.reports.len() {
            tracing::warn!(
                dropped = page.reports.len() - reports.len(),
                "Reports dropped from listing after decryption failures"
            );
        }

        Ok(ReportListing {
            reports,
            total_count: page.total,
            total_pages: page.total.div_ceil(params.limit),
            current_page: params.page,
        })
    }

    /// Fetch one shared, live report, decrypted.
    pub fn get_by_id(&self, report_id: &str, actor_id: &str) -> ServiceResult<DecryptedReport> {
        let report = self.load_visible(report_id)?;

        let mut refs = NgoRefs::new(&self.storage);
        let decrypted = self.decrypt_lenient(&report, &mut refs);

        audit_log!(&self.storage, AuditEventType::ReportViewed, actor_id, RESOURCE_REPORT, report_id);
        Ok(decrypted)
    }

    /// Decrypt for a listing: any failure on a required field drops the record.
    fn decrypt_strict(&self, report: &StoredReport, refs: &mut NgoRefs<'_>) -> Option<DecryptedReport> {
        let required = |package: &str| match self.cipher.try_decrypt(package) {
            Ok(plaintext) if !plaintext.is_empty() => Some(plaintext),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(report_id = %report.report_id, error = %e, "Report field failed to decrypt");
                None
            }
        };

        let incident_title = required(&report.encrypted_incident_title)?;
        let description = required(&report.encrypted_description)?;
        let location = required(&report.encrypted_location)?;
        let date_time = required(&report.encrypted_date_time)?;

        Some(self.assemble(report, [incident_title, description, location, date_time], refs))
    }

    /// Decrypt a single record: failed fields come back blank.
    fn decrypt_lenient(&self, report: &StoredReport, refs: &mut NgoRefs<'_>) -> DecryptedReport {
        let field = |package: &str| match self.cipher.try_decrypt(package) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!(report_id = %report.report_id, error = %e, "Report field failed to decrypt");
                String::new()
            }
        };

        let fields = [
            field(&report.encrypted_incident_title),
            field(&report.encrypted_description),
            field(&report.encrypted_location),
            field(&report.encrypted_date_time),
        ];
        self.assemble(report, fields, refs)
    }

    fn assemble(
        &self,
        report: &StoredReport,
        [incident_title, description, location, date_time]: [String; 4],
        refs: &mut NgoRefs<'_>,
    ) -> DecryptedReport {
        let phone_number = self.cipher.decrypt(&report.encrypted_phone_number);
        let evidence_urls = report
            .encrypted_evidence_urls
            .iter()
            .map(|package| self.cipher.decrypt(package))
            .filter(|url| !url.is_empty())
            .collect();

        DecryptedReport {
            report_id: report.report_id.clone(),
            incident_title,
            description,
            location,
            date_time,
            phone_number,
            evidence_urls,
            consent_to_share_with_ngo: report.consent_to_share_with_ngo,
            incident_type: report.incident_type.clone(),
            urgency_level: report.urgency_level,
            status: report.status,
            assigned_to: refs.resolve(report.assigned_to.as_deref()),
            notes: report.notes.clone(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }

    // ========== Case management ==========

    /// Apply the recognized fields of an update.
    ///
    /// Fields are applied to the latest stored version under the report's
    /// lock, so a concurrent soft delete is never written back as live.
    pub fn update(
        &self,
        report_id: &str,
        request: UpdateReportRequest,
        actor_id: &str,
    ) -> ServiceResult<UpdateOutcome> {
        self.load_visible(report_id)?;

        let assignee = match non_blank(request.assigned_to.as_deref()) {
            Some(ngo_id) => Some(
                NgoRepository::new(&self.storage)
                    .get(ngo_id)
                    .map_err(|e| match e {
                        StorageError::NotFound(_) => ServiceError::Validation(format!(
                            "assignedTo: NGO '{ngo_id}' does not exist"
                        )),
                        other => other.into(),
                    })?
                    .id,
            ),
            None => None,
        };

        let (report, applied, ignored_fields) = self
            .reports()
            .modify(report_id, |report| {
                ensure_visible(report)?;

                let mut applied = Vec::new();
                let mut ignored_fields = Vec::new();

                if let Some(status) = non_blank(request.status.as_deref()) {
                    match status.parse::<ReportStatus>() {
                        Ok(target) if report.status.can_transition_to(target) => {
                            report.status = target;
                            applied.push("status");
                        }
                        _ => {
                            tracing::info!(report_id, requested = %status, "Ignoring status update");
                            ignored_fields.push("status".to_string());
                        }
                    }
                }

                if let Some(ngo_id) = assignee {
                    report.assigned_to = Some(ngo_id);
                    applied.push("assignedTo");
                }

                if let Some(notes) = request.notes {
                    report.notes = notes;
                    applied.push("notes");
                }

                if let Some(urgency) = non_blank(request.urgency_level.as_deref()) {
                    match parse_urgency(urgency) {
                        Some(level) => {
                            report.urgency_level = level;
                            applied.push("urgencyLevel");
                        }
                        None => ignored_fields.push("urgencyLevel".to_string()),
                    }
                }

                if let Some(incident_type) = non_blank(request.incident_type.as_deref()) {
                    report.incident_type = incident_type.to_string();
                    applied.push("incidentType");
                }

                report.updated_at = Utc::now();
                Ok::<_, ServiceError>((report.clone(), applied, ignored_fields))
            })
            .map_err(not_found_as(REPORT_NOT_FOUND))?;

        tracing::info!(report_id, fields = ?applied, ignored = ?ignored_fields, "Report updated");
        let event = crate::storage::AuditEvent::new(AuditEventType::ReportUpdated)
            .with_actor(actor_id)
            .with_resource(RESOURCE_REPORT, report_id)
            .with_details(serde_json::json!({
                "applied": applied,
                "ignored": ignored_fields,
            }));
        crate::storage::AuditRepository::new(&self.storage).record(event);

        let mut refs = NgoRefs::new(&self.storage);
        Ok(UpdateOutcome {
            report: UpdatedReport {
                assigned_to: refs.resolve(report.assigned_to.as_deref()),
                report_id: report.report_id,
                status: report.status,
                notes: report.notes,
                urgency_level: report.urgency_level,
                incident_type: report.incident_type,
                updated_at: report.updated_at,
            },
            ignored_fields,
        })
    }

    /// Soft-delete a shared, live report.
    pub fn soft_delete(&self, report_id: &str, actor_id: &str) -> ServiceResult<DateTime<Utc>> {
        let now = Utc::now();
        self.reports()
            .modify(report_id, |report| {
                ensure_visible(report)?;
                report.is_deleted = true;
                report.deleted_at = Some(now);
                report.deleted_by = Some(actor_id.to_string());
                report.status = ReportStatus::Archived;
                report.updated_at = now;
                Ok::<_, ServiceError>(())
            })
            .map_err(not_found_as(REPORT_NOT_FOUND))?;

        tracing::info!(report_id, deleted_by = %actor_id, "Report soft-deleted");
        audit_log!(&self.storage, AuditEventType::ReportDeleted, actor_id, RESOURCE_REPORT, report_id);
        Ok(now)
    }

    /// Undo a soft delete. The report goes back to `pending`.
    pub fn restore(&self, report_id: &str, actor_id: &str) -> ServiceResult<ReportStatus> {
        let status = self
            .reports()
            .modify(report_id, |report| {
                if !report.is_deleted {
                    return Err(ServiceError::NotFound(DELETED_REPORT_NOT_FOUND.to_string()));
                }
                report.is_deleted = false;
                report.deleted_at = None;
                report.deleted_by = None;
                report.status = ReportStatus::Pending;
                report.updated_at = Utc::now();
                Ok(report.status)
            })
            .map_err(not_found_as(DELETED_REPORT_NOT_FOUND))?;

        tracing::info!(report_id, "Report restored");
        audit_log!(&self.storage, AuditEventType::ReportRestored, actor_id, RESOURCE_REPORT, report_id);
        Ok(status)
    }

    /// Metadata of soft-deleted shared reports, most recently deleted first.
    pub fn list_deleted(&self) -> ServiceResult<Vec<DeletedReportSummary>> {
        let mut refs = NgoRefs::new(&self.storage);
        let summaries = self
            .reports()
            .list_deleted()?
            .into_iter()
            .map(|report| DeletedReportSummary {
                deleted_by: refs.resolve(report.deleted_by.as_deref()),
                assigned_to: refs.resolve(report.assigned_to.as_deref()),
                report_id: report.report_id,
                incident_type: report.incident_type,
                urgency_level: report.urgency_level,
                status: report.status,
                created_at: report.created_at,
                deleted_at: report.deleted_at,
                notes: report.notes,
            })
            .collect();
        Ok(summaries)
    }

    // ========== Statistics ==========

    /// Aggregate counts over shared, live reports.
    pub fn statistics(&self, query: &StatisticsQuery) -> ServiceResult<ReportStatistics> {
        let mut filter = ReportFilter::active();
        (filter.created_from, filter.created_to) =
            parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;

        let reports = self.reports().list_matching(&filter)?;
        Ok(aggregate(&reports))
    }
}

/// Check, on the version about to be rewritten, that an NGO may change it.
fn ensure_visible(report: &StoredReport) -> ServiceResult<()> {
    report
        .verify_visible()
        .map_err(|e| not_found_as(REPORT_NOT_FOUND)(e.into()))
}

/// Replace the message of a `NotFound` with the caller-facing one.
fn not_found_as(message: &'static str) -> impl Fn(ServiceError) -> ServiceError {
    move |e| match e {
        ServiceError::NotFound(_) => ServiceError::NotFound(message.to_string()),
        other => other,
    }
}

fn aggregate(reports: &[StoredReport]) -> ReportStatistics {
    let mut stats = ReportStatistics {
        total_reports: reports.len(),
        ..ReportStatistics::default()
    };
    let mut months: BTreeMap<YearMonth, usize> = BTreeMap::new();

    for report in reports {
        *stats
            .status_stats
            .entry(report.status.to_string())
            .or_default() += 1;
        *stats
            .type_stats
            .entry(report.incident_type.clone())
            .or_default() += 1;
        *stats
            .urgency_stats
            .entry(report.urgency_level.to_string())
            .or_default() += 1;

        let period = YearMonth {
            year: report.created_at.year(),
            month: report.created_at.month(),
        };
        *months.entry(period).or_default() += 1;
    }

    stats.monthly_stats = months
        .into_iter()
        .rev()
        .take(MONTHLY_BUCKETS)
        .map(|(period, count)| MonthlyCount { period, count })
        .collect();
    stats
}

/// Resolves NGO ids into summaries, caching lookups for one call.
struct NgoRefs<'a> {
    repo: NgoRepository<'a>,
    cache: HashMap<String, NgoSummary>,
}

impl<'a> NgoRefs<'a> {
    fn new(storage: &'a DocumentStore) -> Self {
        Self {
            repo: NgoRepository::new(storage),
            cache: HashMap::new(),
        }
    }

    fn resolve(&mut self, ngo_id: Option<&str>) -> Option<NgoSummary> {
        let ngo_id = ngo_id?;
        if let Some(summary) = self.cache.get(ngo_id) {
            return Some(summary.clone());
        }
        let summary = match self.repo.get(ngo_id) {
            Ok(ngo) => NgoSummary::from(&ngo),
            Err(e) => {
                tracing::debug!(ngo_id, error = %e, "Dangling NGO reference");
                NgoSummary::dangling(ngo_id)
            }
        };
        self.cache.insert(ngo_id.to_string(), summary.clone());
        Some(summary)
    }
}

// ========== Input parsing ==========

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<&str>) -> Option<usize> {
    non_blank(value)?.parse::<usize>().ok().filter(|n| *n >= 1)
}

/// Consent is granted only by `true` (any case), `1` or `on`.
pub fn parse_consent(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "on")
    )
}

/// `Normal` or `Emergency`, case-insensitive.
pub fn parse_urgency(value: &str) -> Option<UrgencyLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(UrgencyLevel::Normal),
        "emergency" => Some(UrgencyLevel::Emergency),
        _ => None,
    }
}

/// Parse a date bound: RFC 3339, or `YYYY-MM-DD` meaning start of day for a
/// lower bound and end of day for an upper bound.
pub fn parse_date_bound(value: &str, upper: bool) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if upper {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}

type DateRange = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

fn parse_date_range(start: Option<&str>, end: Option<&str>) -> ServiceResult<DateRange> {
    let parse = |value: Option<&str>, upper: bool, name: &str| -> ServiceResult<_> {
        match non_blank(value) {
            None => Ok(None),
            Some(v) => parse_date_bound(v, upper).map(Some).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "Invalid {name} '{v}'. Use YYYY-MM-DD or an RFC 3339 timestamp."
                ))
            }),
        }
    };
    Ok((parse(start, false, "startDate")?, parse(end, true, "endDate")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobError;
    use crate::cipher::{CipherError, NonceSource};
    use crate::classifier::ClassifierError;
    use crate::storage::{AuditRepository, StoragePaths, StoredNgo};
    use crate::auth::Role;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SECRET: &str = "unit-test-secret-for-report-svc";

    /// Blob store that fails on the file named `fail_on`.
    struct ScriptedBlobs {
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl BlobStore for ScriptedBlobs {
        async fn upload(
            &self,
            filename: &str,
            _content_type: &str,
            _data: &[u8],
        ) -> Result<String, BlobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(filename) == self.fail_on {
                return Err(BlobError::Rejected {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(format!("https://blobs.test/{filename}"))
        }

        fn backend(&self) -> &'static str {
            "scripted"
        }
    }

    /// Hands out `remaining` nonces, then reports an exhausted RNG.
    struct FailAfter(AtomicUsize);

    impl NonceSource for FailAfter {
        fn fill_nonce(&self, nonce: &mut [u8; 12]) -> Result<(), CipherError> {
            let n = self
                .0
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .map_err(|_| CipherError::Rng)?;
            nonce[..8].copy_from_slice(&(n as u64).to_le_bytes());
            Ok(())
        }
    }

    fn stored_report_files(storage: &DocumentStore) -> usize {
        std::fs::read_dir(storage.paths().reports_dir()).unwrap().count()
    }

    struct FixedClassifier(Result<&'static str, u16>);

    #[async_trait::async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
            self.0
                .map(str::to_string)
                .map_err(ClassifierError::Status)
        }
    }

    struct Harness {
        _temp: TempDir,
        storage: Arc<DocumentStore>,
        service: ReportService,
    }

    fn harness_with(fail_on: Option<&'static str>, classifier: Option<Arc<dyn Classifier>>) -> Harness {
        build_harness(FieldCipher::new(SECRET).unwrap(), fail_on, classifier)
    }

    fn build_harness(
        cipher: FieldCipher,
        fail_on: Option<&'static str>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Harness {
        let temp = TempDir::new().unwrap();
        let mut storage = DocumentStore::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        let storage = Arc::new(storage);
        let cipher = Arc::new(cipher);
        let blobs: Arc<dyn BlobStore> = Arc::new(ScriptedBlobs {
            fail_on,
            calls: AtomicUsize::new(0),
        });
        let service = ReportService::new(storage.clone(), cipher, blobs, classifier);
        Harness {
            _temp: temp,
            storage,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(None, None)
    }

    fn submission(consent: bool) -> NewReport {
        NewReport {
            incident_title: "Illegal Dumping".to_string(),
            description: "Bags of construction waste dumped overnight".to_string(),
            date_time: "2024-01-15T14:30".to_string(),
            location: "City Park".to_string(),
            phone_number: None,
            urgency_level: UrgencyLevel::Normal,
            consent_to_share_with_ngo: consent,
        }
    }

    fn evidence(name: &str) -> EvidenceFile {
        EvidenceFile {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    fn seed_ngo(storage: &DocumentStore, id: &str) -> StoredNgo {
        NgoRepository::new(storage)
            .create(&StoredNgo {
                id: id.to_string(),
                ngo_name: format!("NGO {id}"),
                email: format!("{id}@example.org"),
                password_hash: "hash".to_string(),
                verification_status: true,
                role: Role::Ngo,
                created_at: Utc::now(),
            })
            .unwrap()
    }

    fn all_params() -> ListParams {
        ListParams::from_query(&ListReportsQuery::default()).unwrap()
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips_plaintext() {
        let h = harness();
        let created = h.service.create(submission(true), vec![]).await.unwrap();
        assert_eq!(created.urgency_level, UrgencyLevel::Normal);

        let report = h.service.get_by_id(&created.report_id, "ngo-1").unwrap();
        assert_eq!(report.incident_title, "Illegal Dumping");
        assert_eq!(report.location, "City Park");
        assert_eq!(report.date_time, "2024-01-15T14:30");
        assert_eq!(report.phone_number, "");
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.incident_type, "General");
    }

    #[tokio::test]
    async fn stored_document_holds_no_plaintext() {
        let h = harness();
        let mut input = submission(true);
        input.phone_number = Some("+977-9800000000".to_string());
        let created = h.service.create(input, vec![evidence("a.png")]).await.unwrap();

        let raw = h
            .storage
            .read_raw(h.storage.paths().report(&created.report_id))
            .unwrap();
        let raw = String::from_utf8(raw).unwrap();
        for plaintext in ["Illegal Dumping", "City Park", "9800000000", "blobs.test"] {
            assert!(!raw.contains(plaintext), "{plaintext} leaked to disk");
        }
    }

    #[tokio::test]
    async fn blank_phone_is_stored_as_empty() {
        let h = harness();
        let mut input = submission(true);
        input.phone_number = Some("   ".to_string());
        let created = h.service.create(input, vec![]).await.unwrap();

        let stored = ReportRepository::new(&h.storage).get(&created.report_id).unwrap();
        assert_eq!(stored.encrypted_phone_number, "");
    }

    #[tokio::test]
    async fn one_failed_upload_is_skipped() {
        let h = harness_with(Some("b.png"), None);
        let files = vec![evidence("a.png"), evidence("b.png"), evidence("c.png")];
        let created = h.service.create(submission(true), files).await.unwrap();
        assert_eq!(created.evidence_count, 2);

        let report = h.service.get_by_id(&created.report_id, "ngo-1").unwrap();
        assert_eq!(
            report.evidence_urls,
            vec!["https://blobs.test/a.png", "https://blobs.test/c.png"]
        );
    }

    #[tokio::test]
    async fn classifier_label_and_fallback() {
        let labelled = harness_with(None, Some(Arc::new(FixedClassifier(Ok("harassment")))));
        let created = labelled.service.create(submission(true), vec![]).await.unwrap();
        let stored = ReportRepository::new(&labelled.storage).get(&created.report_id).unwrap();
        assert_eq!(stored.incident_type, "harassment");

        let failing = harness_with(None, Some(Arc::new(FixedClassifier(Err(503)))));
        let created = failing.service.create(submission(true), vec![]).await.unwrap();
        let stored = ReportRepository::new(&failing.storage).get(&created.report_id).unwrap();
        assert_eq!(stored.incident_type, "General");
    }

    #[tokio::test]
    async fn create_is_audited_without_actor() {
        let h = harness();
        let created = h.service.create(submission(false), vec![]).await.unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = AuditRepository::new(&h.storage).read_events(&today).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::ReportCreated);
        assert_eq!(events[0].actor_id, None);
        assert_eq!(events[0].resource_id.as_deref(), Some(created.report_id.as_str()));
    }

    #[tokio::test]
    async fn id_collision_retries_and_returns_persisted_id() {
        let h = harness();
        let first = h.service.create(submission(true), vec![]).await.unwrap();
        let stored = ReportRepository::new(&h.storage).get(&first.report_id).unwrap();

        let mut ids = vec![first.report_id.clone(), "fresh-id".to_string()].into_iter();
        let persisted = h
            .service
            .persist_with_fresh_id(stored, || ids.next().unwrap())
            .unwrap();
        assert_eq!(persisted.report_id, "fresh-id");
        assert!(ReportRepository::new(&h.storage).exists("fresh-id"));
    }

    #[tokio::test]
    async fn id_collision_gives_up_after_bounded_attempts() {
        let h = harness();
        let first = h.service.create(submission(true), vec![]).await.unwrap();
        let stored = ReportRepository::new(&h.storage).get(&first.report_id).unwrap();

        let taken = first.report_id.clone();
        let result = h.service.persist_with_fresh_id(stored, || taken.clone());
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }

    #[tokio::test]
    async fn withheld_consent_hides_report() {
        let h = harness();
        let shared = h.service.create(submission(true), vec![]).await.unwrap();
        let private = h.service.create(submission(false), vec![]).await.unwrap();

        let listing = h.service.list(&all_params()).unwrap();
        assert_eq!(listing.total_count, 1);
        assert_eq!(listing.reports[0].report_id, shared.report_id);

        assert!(matches!(
            h.service.get_by_id(&private.report_id, "ngo-1"),
            Err(ServiceError::ConsentWithheld(_))
        ));
        assert!(matches!(
            h.service.update(&private.report_id, UpdateReportRequest::default(), "ngo-1"),
            Err(ServiceError::ConsentWithheld(_))
        ));
        assert!(matches!(
            h.service.soft_delete(&private.report_id, "ngo-1"),
            Err(ServiceError::ConsentWithheld(_))
        ));
        assert!(h.service.list_deleted().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_report_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.service.get_by_id("does-not-exist", "ngo-1"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupted_record_is_dropped_from_listing_only() {
        let h = harness();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(h.service.create(submission(true), vec![]).await.unwrap().report_id);
        }

        let repo = ReportRepository::new(&h.storage);
        let mut broken = repo.get(&ids[1]).unwrap();
        broken.encrypted_description = "AAAA:garbage".to_string();
        repo.update(&broken).unwrap();

        let listing = h.service.list(&all_params()).unwrap();
        assert_eq!(listing.reports.len(), 2);
        assert_eq!(listing.total_count, 3);
        assert!(listing.reports.iter().all(|r| r.report_id != ids[1]));

        let single = h.service.get_by_id(&ids[1], "ngo-1").unwrap();
        assert_eq!(single.description, "");
        assert_eq!(single.incident_title, "Illegal Dumping");
    }

    #[tokio::test]
    async fn wrong_key_drops_every_record() {
        let h = harness();
        h.service.create(submission(true), vec![]).await.unwrap();

        let other_cipher = Arc::new(FieldCipher::new("a-completely-different-secret").unwrap());
        let blobs: Arc<dyn BlobStore> = Arc::new(ScriptedBlobs {
            fail_on: None,
            calls: AtomicUsize::new(0),
        });
        let rekeyed = ReportService::new(h.storage.clone(), other_cipher, blobs, None);

        let listing = rekeyed.list(&all_params()).unwrap();
        assert_eq!(listing.reports.len(), 0);
        assert_eq!(listing.total_count, 1);
    }

    #[tokio::test]
    async fn listing_pages_newest_first() {
        let h = harness();
        let repo = ReportRepository::new(&h.storage);
        let base = Utc::now();
        for i in 0..5i64 {
            let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;
            let mut report = repo.get(&id).unwrap();
            report.created_at = base - Duration::hours(i);
            report.notes = format!("n{i}");
            repo.update(&report).unwrap();
        }

        let params = ListParams::from_query(&ListReportsQuery {
            page: Some("2".to_string()),
            limit: Some("2".to_string()),
            ..ListReportsQuery::default()
        })
        .unwrap();
        let listing = h.service.list(&params).unwrap();
        assert_eq!(listing.total_count, 5);
        assert_eq!(listing.total_pages, 3);
        assert_eq!(listing.current_page, 2);
        let notes: Vec<_> = listing.reports.iter().map(|r| r.notes.as_str()).collect();
        assert_eq!(notes, vec!["n2", "n3"]);
    }

    #[tokio::test]
    async fn bogus_status_is_ignored() {
        let h = harness();
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;

        let outcome = h
            .service
            .update(
                &id,
                UpdateReportRequest {
                    status: Some("bogus_value".to_string()),
                    notes: Some("called the reporter".to_string()),
                    ..UpdateReportRequest::default()
                },
                "ngo-1",
            )
            .unwrap();

        assert_eq!(outcome.report.status, ReportStatus::Pending);
        assert_eq!(outcome.report.notes, "called the reporter");
        assert_eq!(outcome.ignored_fields, vec!["status"]);
    }

    #[tokio::test]
    async fn update_applies_recognized_fields() {
        let h = harness();
        let assignee = seed_ngo(&h.storage, "ngo-2");
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;

        let outcome = h
            .service
            .update(
                &id,
                UpdateReportRequest {
                    status: Some("under_review".to_string()),
                    assigned_to: Some(assignee.id.clone()),
                    urgency_level: Some("Emergency".to_string()),
                    incident_type: Some("harassment".to_string()),
                    notes: None,
                },
                "ngo-1",
            )
            .unwrap();

        assert!(outcome.ignored_fields.is_empty());
        assert_eq!(outcome.report.status, ReportStatus::UnderReview);
        assert_eq!(outcome.report.urgency_level, UrgencyLevel::Emergency);
        assert_eq!(outcome.report.incident_type, "harassment");
        let summary = outcome.report.assigned_to.unwrap();
        assert_eq!(summary.ngo_name.as_deref(), Some("NGO ngo-2"));
    }

    #[tokio::test]
    async fn update_cannot_archive_or_move_backwards() {
        let h = harness();
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;
        let forward = UpdateReportRequest {
            status: Some("resolved".to_string()),
            ..UpdateReportRequest::default()
        };
        h.service.update(&id, forward, "ngo-1").unwrap();

        for target in ["archived", "pending"] {
            let outcome = h
                .service
                .update(
                    &id,
                    UpdateReportRequest {
                        status: Some(target.to_string()),
                        ..UpdateReportRequest::default()
                    },
                    "ngo-1",
                )
                .unwrap();
            assert_eq!(outcome.report.status, ReportStatus::Resolved);
            assert_eq!(outcome.ignored_fields, vec!["status"]);
        }
    }

    #[tokio::test]
    async fn update_rejects_unknown_assignee() {
        let h = harness();
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;
        let result = h.service.update(
            &id,
            UpdateReportRequest {
                assigned_to: Some("ghost".to_string()),
                ..UpdateReportRequest::default()
            },
            "ngo-1",
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn soft_delete_twice_is_not_found_and_restore_resets() {
        let h = harness();
        let ngo = seed_ngo(&h.storage, "ngo-1");
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;

        h.service.soft_delete(&id, &ngo.id).unwrap();
        assert!(matches!(
            h.service.soft_delete(&id, &ngo.id),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            h.service.get_by_id(&id, &ngo.id),
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(h.service.list(&all_params()).unwrap().total_count, 0);

        let deleted = h.service.list_deleted().unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].status, ReportStatus::Archived);
        assert_eq!(deleted[0].deleted_by.as_ref().unwrap().id, ngo.id);
        assert!(deleted[0].deleted_at.is_some());

        assert_eq!(h.service.restore(&id, &ngo.id).unwrap(), ReportStatus::Pending);
        let stored = ReportRepository::new(&h.storage).get(&id).unwrap();
        assert!(!stored.is_deleted);
        assert!(stored.deleted_at.is_none());
        assert!(stored.deleted_by.is_none());
        assert_eq!(stored.status, ReportStatus::Pending);

        assert!(matches!(
            h.service.restore(&id, &ngo.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_self_test_aborts_create_without_writing() {
        let cipher = FieldCipher::with_nonce_source(SECRET, FailAfter(AtomicUsize::new(0))).unwrap();
        let h = build_harness(cipher, None, None);

        let result = h.service.create(submission(true), vec![evidence("a.png")]).await;
        assert!(matches!(result, Err(ServiceError::Configuration(_))));
        assert_eq!(stored_report_files(&h.storage), 0);
    }

    #[tokio::test]
    async fn failed_field_encryption_aborts_create_without_writing() {
        // One nonce for the self-test, one for the title, none for the description
        let cipher = FieldCipher::with_nonce_source(SECRET, FailAfter(AtomicUsize::new(2))).unwrap();
        let h = build_harness(cipher, None, None);

        let result = h.service.create(submission(true), vec![]).await;
        assert!(matches!(result, Err(ServiceError::Cipher(CipherError::Rng))));
        assert_eq!(stored_report_files(&h.storage), 0);
    }

    #[tokio::test]
    async fn concurrent_update_never_revives_soft_deleted_report() {
        let h = harness();
        let ngo = seed_ngo(&h.storage, "ngo-1");

        for trial in 0..40 {
            let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;
            let barrier = std::sync::Barrier::new(2);

            let deleted = std::thread::scope(|scope| {
                let deleter = scope.spawn(|| {
                    barrier.wait();
                    h.service.soft_delete(&id, &ngo.id)
                });
                scope.spawn(|| {
                    barrier.wait();
                    for round in 0..4 {
                        let notes = UpdateReportRequest {
                            notes: Some(format!("round {round}")),
                            ..UpdateReportRequest::default()
                        };
                        // Loses to the delete once it lands
                        let _ = h.service.update(&id, notes, &ngo.id);
                    }
                });
                deleter.join().unwrap()
            });

            assert!(deleted.is_ok(), "trial {trial}: delete failed");
            let stored = ReportRepository::new(&h.storage).get(&id).unwrap();
            assert!(stored.is_deleted, "trial {trial}: acknowledged delete was undone");
            assert_eq!(stored.status, ReportStatus::Archived);
            assert_eq!(stored.deleted_by.as_deref(), Some(ngo.id.as_str()));
        }
    }

    #[tokio::test]
    async fn deleted_listing_never_decrypts() {
        let h = harness();
        let id = h.service.create(submission(true), vec![]).await.unwrap().report_id;
        h.service.soft_delete(&id, "ngo-1").unwrap();

        let json = serde_json::to_string(&h.service.list_deleted().unwrap()).unwrap();
        assert!(!json.contains("Illegal Dumping"));
        assert!(!json.contains("incidentTitle"));
    }

    #[tokio::test]
    async fn statistics_count_live_shared_reports() {
        let h = harness();
        let repo = ReportRepository::new(&h.storage);

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(h.service.create(submission(true), vec![]).await.unwrap().report_id);
        }
        h.service.create(submission(false), vec![]).await.unwrap();
        h.service.soft_delete(&ids[2], "ngo-1").unwrap();

        let mut old = repo.get(&ids[1]).unwrap();
        old.created_at = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
        old.urgency_level = UrgencyLevel::Emergency;
        repo.update(&old).unwrap();

        let stats = h.service.statistics(&StatisticsQuery::default()).unwrap();
        assert_eq!(stats.total_reports, 2);
        assert_eq!(stats.status_stats.get("pending"), Some(&2));
        assert_eq!(stats.urgency_stats.get("Emergency"), Some(&1));
        assert_eq!(stats.type_stats.get("General"), Some(&2));
        assert_eq!(stats.monthly_stats.len(), 2);
        assert_eq!(stats.monthly_stats[1].period, YearMonth { year: 2023, month: 6 });

        let ranged = h
            .service
            .statistics(&StatisticsQuery {
                start_date: None,
                end_date: Some("2023-06-01".to_string()),
            })
            .unwrap();
        assert_eq!(ranged.total_reports, 1);
    }

    #[test]
    fn monthly_stats_keep_twelve_newest() {
        let mut reports = Vec::new();
        for month in 1..=12u32 {
            for year in [2023, 2024] {
                let at = Utc.with_ymd_and_hms(year, month, 10, 0, 0, 0).unwrap();
                reports.push(StoredReport {
                    report_id: format!("{year}-{month}"),
                    encrypted_incident_title: String::new(),
                    encrypted_description: String::new(),
                    encrypted_location: String::new(),
                    encrypted_date_time: String::new(),
                    encrypted_phone_number: String::new(),
                    encrypted_evidence_urls: vec![],
                    incident_type: "General".to_string(),
                    urgency_level: UrgencyLevel::Normal,
                    consent_to_share_with_ngo: true,
                    status: ReportStatus::Pending,
                    assigned_to: None,
                    notes: String::new(),
                    created_at: at,
                    updated_at: at,
                    is_deleted: false,
                    deleted_at: None,
                    deleted_by: None,
                });
            }
        }

        let stats = aggregate(&reports);
        assert_eq!(stats.total_reports, 24);
        assert_eq!(stats.monthly_stats.len(), 12);
        assert_eq!(stats.monthly_stats[0].period, YearMonth { year: 2024, month: 12 });
        assert_eq!(stats.monthly_stats[11].period, YearMonth { year: 2024, month: 1 });
    }

    #[test]
    fn form_validation() {
        let valid = CreateReportForm {
            incident_title: "Illegal Dumping".to_string(),
            description: "...".to_string(),
            date_time: "2024-01-15T14:30".to_string(),
            location: "City Park".to_string(),
            phone_number: Some(" ".to_string()),
            urgency_level: Some("emergency".to_string()),
            consent_to_share_with_ngo: Some("TRUE".to_string()),
        };
        let parsed = NewReport::from_form(valid.clone()).unwrap();
        assert_eq!(parsed.urgency_level, UrgencyLevel::Emergency);
        assert!(parsed.consent_to_share_with_ngo);
        assert!(parsed.phone_number.is_none());

        let missing = CreateReportForm {
            location: "  ".to_string(),
            ..valid.clone()
        };
        assert!(matches!(
            NewReport::from_form(missing),
            Err(ServiceError::Validation(_))
        ));

        let bad_urgency = CreateReportForm {
            urgency_level: Some("Critical".to_string()),
            ..valid
        };
        assert!(matches!(
            NewReport::from_form(bad_urgency),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn consent_parsing() {
        for yes in ["true", "True", "1", "on"] {
            assert!(parse_consent(Some(yes)), "{yes}");
        }
        for no in ["false", "0", "yes", ""] {
            assert!(!parse_consent(Some(no)), "{no}");
        }
        assert!(!parse_consent(None));
    }

    #[test]
    fn list_params_defaults_and_clamping() {
        let params = all_params();
        assert_eq!((params.page, params.limit), (1, DEFAULT_PAGE_SIZE));

        let params = ListParams::from_query(&ListReportsQuery {
            page: Some("0".to_string()),
            limit: Some("5000".to_string()),
            ..ListReportsQuery::default()
        })
        .unwrap();
        assert_eq!((params.page, params.limit), (1, MAX_PAGE_SIZE));

        assert!(ListParams::from_query(&ListReportsQuery {
            status: Some("bogus".to_string()),
            ..ListReportsQuery::default()
        })
        .is_err());
        assert!(ListParams::from_query(&ListReportsQuery {
            start_date: Some("yesterday".to_string()),
            ..ListReportsQuery::default()
        })
        .is_err());
    }

    #[test]
    fn date_bounds() {
        let start = parse_date_bound("2024-01-15", false).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());

        let end = parse_date_bound("2024-01-15", true).unwrap();
        assert!(end > Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap());

        let ts = parse_date_bound("2024-01-15T14:30:00+05:45", false).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 8, 45, 0).unwrap());

        assert!(parse_date_bound("15/01/2024", false).is_none());
    }
}
