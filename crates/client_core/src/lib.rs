//! Client-side core for the car-finance claim lifecycle.
//!
//! [`ClaimStore`] holds the authoritative session copy of the signed-in
//! user's lenders and claims, fetched from the claims backend and refreshed
//! after every mutation. All status changes flow through the pure
//! [`engine`] functions; all lender-level labels and stepper positions come
//! from [`aggregate`]; the audit trail lives in [`activity`]. Views consume
//! snapshots and subscribe to [`StoreEvent`]s, they never mutate agreements
//! directly.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use shared::{
    domain::{
        ActivityLogEntry, Agreement, AgreementStatus, ClaimId, Lender, LenderId, LenderStatus,
    },
    error::{ApiError, ApiException, ErrorCode},
    protocol::{
        ClaimsEnvelope, CreateClaimRequest, LenderClaims, MailTemplate, NewAgreementRecord,
        SubmitClaimsRequest, UpdateClaimRequest,
    },
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod activity;
pub mod aggregate;
pub mod engine;

use activity::ActivityLog;
use engine::{LenderResponse, TransitionError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("claims backend rejected the request: {0}")]
    Api(#[from] ApiException),
    #[error("claims backend unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unknown lender {0}")]
    UnknownLender(LenderId),
    #[error("unknown claim {0}")]
    UnknownClaim(ClaimId),
    #[error("no agreements selected for submission")]
    NothingSelected,
    #[error("agreement {0} selected more than once")]
    DuplicateSelection(ClaimId),
}

/// The only seam to the claims backend. Production uses [`HttpClaimsApi`];
/// tests substitute their own implementation.
#[async_trait]
pub trait ClaimsApi: Send + Sync {
    async fn fetch_claims(
        &self,
        lender_id: Option<&LenderId>,
    ) -> Result<Vec<LenderClaims>, StoreError>;
    async fn create_claim(&self, request: &CreateClaimRequest) -> Result<(), StoreError>;
    async fn update_claim(&self, request: &UpdateClaimRequest) -> Result<(), StoreError>;
    async fn submit_claims(&self, request: &SubmitClaimsRequest) -> Result<(), StoreError>;
}

/// REST implementation of [`ClaimsApi`]. The bearer token rides on every
/// call; timeouts and retries are whatever reqwest defaults to.
pub struct HttpClaimsApi {
    http: Client,
    base_url: String,
    auth_token: String,
}

impl HttpClaimsApi {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }

    fn claims_url(&self) -> String {
        format!("{}/api/claims", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let fallback = code_for_status(status);
        let api_error = response
            .json::<ApiError>()
            .await
            .unwrap_or_else(|_| ApiError::new(fallback, format!("http status {status}")));
        Err(StoreError::Api(api_error.into()))
    }
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => ErrorCode::Validation,
        StatusCode::CONFLICT => ErrorCode::Conflict,
        _ => ErrorCode::Internal,
    }
}

#[async_trait]
impl ClaimsApi for HttpClaimsApi {
    async fn fetch_claims(
        &self,
        lender_id: Option<&LenderId>,
    ) -> Result<Vec<LenderClaims>, StoreError> {
        let mut request = self
            .http
            .get(self.claims_url())
            .bearer_auth(&self.auth_token);
        if let Some(lender_id) = lender_id {
            request = request.query(&[("lenderId", lender_id.0.as_str())]);
        }
        let response = Self::check(request.send().await?).await?;
        let envelope: ClaimsEnvelope = response.json().await?;
        if !envelope.success {
            return Err(StoreError::Api(ApiException::new(
                ErrorCode::Internal,
                "claims backend reported failure",
            )));
        }
        Ok(envelope.data)
    }

    async fn create_claim(&self, request: &CreateClaimRequest) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.claims_url())
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_claim(&self, request: &UpdateClaimRequest) -> Result<(), StoreError> {
        let response = self
            .http
            .patch(self.claims_url())
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn submit_claims(&self, request: &SubmitClaimsRequest) -> Result<(), StoreError> {
        let response = self
            .http
            .post(format!("{}/submit", self.claims_url()))
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Notification that the store changed; views refetch their snapshots on
/// receipt.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Refreshed,
    AgreementAdded {
        lender_id: LenderId,
    },
    ClaimsSubmitted {
        lender_id: LenderId,
        count: usize,
    },
    ResponseRecorded {
        claim_id: ClaimId,
        status: AgreementStatus,
    },
}

/// Read-only per-lender snapshot with the derived status applied, ready for
/// any of the presentation surfaces.
#[derive(Debug, Clone)]
pub struct LenderOverview {
    pub lender: Lender,
    pub status: LenderStatus,
    pub step_index: usize,
    pub agreements: Vec<Agreement>,
}

impl LenderOverview {
    pub fn agreements_count(&self) -> usize {
        self.agreements.len()
    }
}

struct LenderEntry {
    lender: Lender,
    agreements: Vec<Agreement>,
}

struct StoreState {
    lenders: Vec<LenderEntry>,
    activity: ActivityLog,
    last_refreshed: Option<DateTime<Utc>>,
}

/// Canonical session copy of the user's lenders and claims.
///
/// Mutations follow one protocol: the engine computes the next state, the
/// store applies it optimistically and records the activity entry, then the
/// backend call commits it. Success and failure both end in a full
/// [`refresh`](Self::refresh), which supersedes (or reverts) the optimistic
/// state. Nothing is retried automatically.
pub struct ClaimStore {
    api: Arc<dyn ClaimsApi>,
    inner: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ClaimStore {
    pub fn new(api: Arc<dyn ClaimsApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            inner: Mutex::new(StoreState {
                lenders: Vec::new(),
                activity: ActivityLog::default(),
                last_refreshed: None,
            }),
            events,
        })
    }

    /// Store backed by the REST API at `base_url`.
    pub fn connect(base_url: impl Into<String>, auth_token: impl Into<String>) -> Arc<Self> {
        Self::new(Arc::new(HttpClaimsApi::new(base_url, auth_token)))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Full reload from the backend. The only consistency mechanism: the
    /// fetched collection replaces the local one wholesale. The activity
    /// log is client-side only and survives the replacement.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let data = self.api.fetch_claims(None).await?;
        let mut guard = self.inner.lock().await;
        guard.lenders = data.into_iter().map(lender_entry_from_wire).collect();
        guard.last_refreshed = Some(Utc::now());
        info!(lenders = guard.lenders.len(), "claims collection reloaded");
        drop(guard);
        let _ = self.events.send(StoreEvent::Refreshed);
        Ok(())
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.last_refreshed
    }

    /// Dashboard snapshot: every lender with its derived status and stepper
    /// position.
    pub async fn overview(&self) -> Vec<LenderOverview> {
        let guard = self.inner.lock().await;
        guard.lenders.iter().map(overview_for).collect()
    }

    /// Lender-detail snapshot for one lender.
    pub async fn lender_overview(&self, lender_id: &LenderId) -> Result<LenderOverview, StoreError> {
        let guard = self.inner.lock().await;
        guard
            .lenders
            .iter()
            .find(|entry| &entry.lender.id == lender_id)
            .map(overview_for)
            .ok_or_else(|| StoreError::UnknownLender(lender_id.clone()))
    }

    /// Full activity log, newest first.
    pub async fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.inner.lock().await.activity.entries().to_vec()
    }

    /// Condensed status-history panel (capped to the 4 most recent).
    pub async fn status_history(&self) -> Vec<ActivityLogEntry> {
        self.inner.lock().await.activity.status_history()
    }

    /// Records a new agreement for a lender. Validation failures surface
    /// before anything is applied or sent.
    pub async fn add_agreement(
        &self,
        lender_id: &LenderId,
        agreement_number: &str,
        car_registration: &str,
    ) -> Result<(), StoreError> {
        let request;
        {
            let mut guard = self.inner.lock().await;
            let state = &mut *guard;
            let entry = state
                .lenders
                .iter_mut()
                .find(|entry| &entry.lender.id == lender_id)
                .ok_or_else(|| StoreError::UnknownLender(lender_id.clone()))?;
            let outcome = engine::new_agreement(
                agreement_number,
                car_registration,
                &entry.lender.name,
                Utc::now(),
            )?;
            request = CreateClaimRequest {
                agreement: NewAgreementRecord {
                    agreement_number: outcome.agreement.agreement_number.clone(),
                    car_registration: outcome.agreement.car_registration.clone(),
                },
                lender_id: lender_id.clone(),
            };
            entry.agreements.push(outcome.agreement);
            state.activity.record(outcome.entry);
        }
        let _ = self.events.send(StoreEvent::AgreementAdded {
            lender_id: lender_id.clone(),
        });

        let committed = self.api.create_claim(&request).await;
        self.settle("add agreement", committed).await
    }

    /// Bulk submission of pending agreements for one lender. All-or-nothing:
    /// every target must be `Pending` before anything is applied, and one
    /// backend call covers the whole batch. Empty and duplicated selections
    /// are rejected before the engine runs.
    pub async fn submit_claims(
        &self,
        lender_id: &LenderId,
        claim_ids: &[ClaimId],
        template_type: MailTemplate,
        custom_text: Option<String>,
    ) -> Result<(), StoreError> {
        if claim_ids.is_empty() {
            return Err(StoreError::NothingSelected);
        }
        let mut seen = HashSet::with_capacity(claim_ids.len());
        for claim_id in claim_ids {
            if !seen.insert(claim_id) {
                return Err(StoreError::DuplicateSelection(claim_id.clone()));
            }
        }

        let request;
        {
            let mut guard = self.inner.lock().await;
            let state = &mut *guard;
            let entry = state
                .lenders
                .iter_mut()
                .find(|entry| &entry.lender.id == lender_id)
                .ok_or_else(|| StoreError::UnknownLender(lender_id.clone()))?;
            let lender_name = entry.lender.name.clone();
            let now = Utc::now();

            // Run every transition before applying any, so a precondition
            // failure on one target leaves the whole batch untouched.
            let mut outcomes = Vec::with_capacity(claim_ids.len());
            for claim_id in claim_ids {
                let agreement = entry
                    .agreements
                    .iter()
                    .find(|a| &a.claim_id == claim_id)
                    .ok_or_else(|| StoreError::UnknownClaim(claim_id.clone()))?;
                outcomes.push(engine::submit(agreement, &lender_name, now)?);
            }
            for outcome in outcomes {
                replace_agreement(&mut entry.agreements, outcome.agreement);
                state.activity.record(outcome.entry);
            }
            request = SubmitClaimsRequest {
                lender_id: lender_id.clone(),
                template_type,
                custom_text,
                agreement_ids: claim_ids.to_vec(),
                mail: None,
            };
        }
        let _ = self.events.send(StoreEvent::ClaimsSubmitted {
            lender_id: lender_id.clone(),
            count: claim_ids.len(),
        });

        let committed = self.api.submit_claims(&request).await;
        self.settle("submit claims", committed).await
    }

    /// Records a lender response against one submitted agreement. The
    /// engine enforces the `Submitted` precondition; nothing is applied or
    /// sent when it fails.
    pub async fn record_response(
        &self,
        claim_id: &ClaimId,
        response: &LenderResponse,
    ) -> Result<AgreementStatus, StoreError> {
        let request;
        let status;
        {
            let mut guard = self.inner.lock().await;
            let state = &mut *guard;
            let (lender_name, agreement) = state
                .lenders
                .iter_mut()
                .find_map(|entry| {
                    let name = entry.lender.name.clone();
                    entry
                        .agreements
                        .iter_mut()
                        .find(|a| &a.claim_id == claim_id)
                        .map(|a| (name, a))
                })
                .ok_or_else(|| StoreError::UnknownClaim(claim_id.clone()))?;
            let outcome =
                engine::record_response(agreement, response, &lender_name, Utc::now())?;
            status = outcome.agreement.status;
            request = UpdateClaimRequest {
                claim_id: claim_id.clone(),
                agreement: engine::response_patch(&outcome.agreement, response),
                mail: response.mail_draft(),
            };
            *agreement = outcome.agreement;
            state.activity.record(outcome.entry);
        }
        let _ = self.events.send(StoreEvent::ResponseRecorded {
            claim_id: claim_id.clone(),
            status,
        });

        let committed = self.api.update_claim(&request).await;
        self.settle("record response", committed).await?;
        Ok(status)
    }

    /// Commit phase shared by every mutation: refetch on success so the
    /// server state supersedes the optimistic one, refetch on failure so
    /// the optimistic state is reverted, then surface the original error.
    async fn settle(&self, action: &str, committed: Result<(), StoreError>) -> Result<(), StoreError> {
        match committed {
            Ok(()) => self.refresh().await,
            Err(err) => {
                warn!(action, error = %err, "mutation failed, reverting via refetch");
                if let Err(refresh_err) = self.refresh().await {
                    warn!(action, error = %refresh_err, "revert refetch also failed");
                }
                Err(err)
            }
        }
    }
}

fn lender_entry_from_wire(wire: LenderClaims) -> LenderEntry {
    let lender = Lender {
        id: wire.lender.id,
        name: wire.lender.name,
    };
    let agreements = wire
        .claims
        .into_iter()
        .map(|claim| Agreement {
            claim_id: claim.id,
            agreement_number: claim.agreement.agreement_number,
            car_registration: claim.agreement.car_registration,
            status: claim.agreement.status,
            offer_amount: claim.agreement.offer_amount,
            created: claim.created_at,
            updated: claim.updated_at,
        })
        .collect();
    LenderEntry { lender, agreements }
}

fn overview_for(entry: &LenderEntry) -> LenderOverview {
    LenderOverview {
        lender: entry.lender.clone(),
        status: aggregate::lender_status(&entry.agreements),
        step_index: aggregate::step_index(&entry.agreements),
        agreements: entry.agreements.clone(),
    }
}

fn replace_agreement(agreements: &mut [Agreement], next: Agreement) {
    if let Some(slot) = agreements
        .iter_mut()
        .find(|a| a.claim_id == next.claim_id)
    {
        *slot = next;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
