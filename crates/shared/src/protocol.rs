use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AgreementStatus, ClaimId, LenderId};

/// Wire shapes for the claims REST surface. Field names mirror the backend
/// JSON, hence the camelCase renames and the Mongo-style `_id`.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsEnvelope {
    pub success: bool,
    pub data: Vec<LenderClaims>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderClaims {
    pub lender: LenderSummary,
    pub claims: Vec<ClaimRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderSummary {
    pub id: LenderId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    #[serde(rename = "_id")]
    pub id: ClaimId,
    pub agreement: AgreementRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementRecord {
    pub agreement_number: String,
    pub car_registration: String,
    pub status: AgreementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgreementRecord {
    pub agreement_number: String,
    pub car_registration: String,
}

/// Body for `POST /api/claims`: creates one claim in `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub agreement: NewAgreementRecord,
    pub lender_id: LenderId,
}

/// Body for `PATCH /api/claims`: applies one transition server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimRequest {
    pub claim_id: ClaimId,
    pub agreement: AgreementPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementPatch {
    pub status: AgreementStatus,
    pub agreement_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub want_to_take_over: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_action: Option<ResponseAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    FosEscalation,
    LeaveAsIs,
}

/// Body for `POST /api/claims/submit`: bulk `pending` → `submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimsRequest {
    pub lender_id: LenderId,
    pub template_type: MailTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
    pub agreement_ids: Vec<ClaimId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailDraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTemplate {
    ClaimSubmission,
    AcceptOffer,
    DeclineOffer,
    FosEscalation,
    TakeOverRequest,
    Acknowledge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailDraft {
    pub template_type: MailTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}
