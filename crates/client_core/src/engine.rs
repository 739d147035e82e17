//! Pure transition rules for the agreement lifecycle.
//!
//! Every function here is side-effect free: it takes the current agreement
//! and a user action, and either returns the next agreement state together
//! with exactly one activity entry, or an error. All I/O (backend calls,
//! store updates) happens in the claim store, never here.

use chrono::{DateTime, Utc};
use shared::{
    domain::{
        ActivityIcon, ActivityKind, ActivityLogEntry, Agreement, AgreementStatus, ClaimId,
    },
    protocol::{AgreementPatch, MailDraft, MailTemplate, ResponseAction},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    /// A required field is missing or invalid. Surfaced as an inline form
    /// error before any transition is attempted.
    #[error("validation failed: {0}")]
    Validation(&'static str),
    /// The agreement is not in a status that permits this action. The UI
    /// should never let this happen; the engine checks anyway.
    #[error("agreement {claim_id} is {found:?}, expected {expected:?}")]
    Precondition {
        claim_id: ClaimId,
        expected: AgreementStatus,
        found: AgreementStatus,
    },
}

/// Result of a successful transition: the next agreement state and the one
/// activity entry the store must prepend.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub agreement: Agreement,
    pub entry: ActivityLogEntry,
}

/// Bank details collected when the user accepts an offer. Validated before
/// the transition; they travel in the outgoing mail, never in the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDetails {
    pub account_name: String,
    pub sort_code: String,
    pub account_number: String,
}

/// A lender's reply to a submitted claim, as captured in the response modal.
#[derive(Debug, Clone, PartialEq)]
pub enum LenderResponse {
    Offer {
        amount: f64,
        template: MailTemplate,
        bank_details: Option<BankDetails>,
    },
    Rejected {
        action: ResponseAction,
    },
    /// Informational only: no status change, activity entry only.
    FcaPause,
    AlreadySubmitted {
        want_to_take_over: bool,
    },
}

impl LenderResponse {
    /// Mail the store should attach to the backend call, if any. The
    /// take-over flag and the rejected action pick the template; they never
    /// influence the status beyond the mapping in [`record_response`].
    pub fn mail_draft(&self) -> Option<MailDraft> {
        let template_type = match self {
            Self::Offer { template, .. } => *template,
            Self::Rejected {
                action: ResponseAction::FosEscalation,
            } => MailTemplate::FosEscalation,
            Self::Rejected {
                action: ResponseAction::LeaveAsIs,
            } => return None,
            Self::FcaPause => MailTemplate::Acknowledge,
            Self::AlreadySubmitted {
                want_to_take_over: true,
            } => MailTemplate::TakeOverRequest,
            Self::AlreadySubmitted {
                want_to_take_over: false,
            } => return None,
        };
        Some(MailDraft {
            template_type,
            custom_text: None,
        })
    }
}

/// Creates a brand-new agreement in `Pending`. The claim id is a local
/// placeholder until the post-create refetch supplies the server id.
pub fn new_agreement(
    agreement_number: &str,
    car_registration: &str,
    lender_name: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    let agreement_number = agreement_number.trim();
    let car_registration = car_registration.trim();
    if agreement_number.is_empty() {
        return Err(TransitionError::Validation("agreement number is required"));
    }
    if car_registration.is_empty() {
        return Err(TransitionError::Validation("car registration is required"));
    }

    let agreement = Agreement {
        claim_id: ClaimId::new(format!("local-{}", Uuid::new_v4())),
        agreement_number: agreement_number.to_string(),
        car_registration: car_registration.to_string(),
        status: AgreementStatus::Pending,
        offer_amount: None,
        created: now,
        updated: now,
    };
    let entry = entry(
        ActivityKind::AgreementAdded,
        "Agreement added",
        format!("Agreement {agreement_number} recorded for {lender_name}"),
        ActivityIcon::Document,
        now,
    );
    Ok(TransitionOutcome { agreement, entry })
}

/// `Pending` → `Submitted`, recording the submission time.
pub fn submit(
    agreement: &Agreement,
    lender_name: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    require_status(agreement, AgreementStatus::Pending)?;

    let mut next = agreement.clone();
    next.status = AgreementStatus::Submitted;
    next.updated = now;
    let entry = entry(
        ActivityKind::ClaimSubmitted,
        "Claim submitted",
        format!(
            "Claim for agreement {} submitted to {lender_name}",
            agreement.agreement_number
        ),
        ActivityIcon::Send,
        now,
    );
    Ok(TransitionOutcome {
        agreement: next,
        entry,
    })
}

/// Maps a recorded lender response onto the agreement, per the response
/// table. Only legal from `Submitted`.
pub fn record_response(
    agreement: &Agreement,
    response: &LenderResponse,
    lender_name: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, TransitionError> {
    require_status(agreement, AgreementStatus::Submitted)?;

    let mut next = agreement.clone();
    let (title, description) = match response {
        LenderResponse::Offer {
            amount,
            template,
            bank_details,
        } => {
            if *amount <= 0.0 {
                return Err(TransitionError::Validation(
                    "offer amount must be greater than zero",
                ));
            }
            if *template == MailTemplate::AcceptOffer {
                let details = bank_details.as_ref().ok_or(TransitionError::Validation(
                    "bank details are required to accept an offer",
                ))?;
                if details.account_name.trim().is_empty() {
                    return Err(TransitionError::Validation("account name is required"));
                }
                if details.sort_code.trim().is_empty() {
                    return Err(TransitionError::Validation("sort code is required"));
                }
                if details.account_number.trim().is_empty() {
                    return Err(TransitionError::Validation("account number is required"));
                }
            }
            next.status = AgreementStatus::OfferMade;
            next.offer_amount = Some(*amount);
            (
                "Offer made",
                format!("{lender_name} offered £{amount:.2} on agreement {}", agreement.agreement_number),
            )
        }
        LenderResponse::Rejected {
            action: ResponseAction::FosEscalation,
        } => {
            next.status = AgreementStatus::FosEscalation;
            (
                "FOS escalation requested",
                format!(
                    "Rejection by {lender_name} escalated to the Financial Ombudsman Service"
                ),
            )
        }
        LenderResponse::Rejected {
            action: ResponseAction::LeaveAsIs,
        } => {
            next.status = AgreementStatus::Rejected;
            (
                "Claim rejected",
                format!("{lender_name} rejected the claim; no further action taken"),
            )
        }
        LenderResponse::FcaPause => {
            // Explicitly unmapped: the pause never moves the status.
            (
                "FCA pause noted",
                format!("{lender_name} paused the claim under the FCA review"),
            )
        }
        LenderResponse::AlreadySubmitted { want_to_take_over } => {
            next.status = AgreementStatus::ClaimAlreadySubmitted;
            let description = if *want_to_take_over {
                format!("A claim already exists with {lender_name}; take-over requested")
            } else {
                format!("A claim already exists with {lender_name}; left with the current handler")
            };
            ("Claim already submitted", description)
        }
    };
    if next.status != agreement.status || next.offer_amount != agreement.offer_amount {
        next.updated = now;
    }

    let entry = entry(
        ActivityKind::LenderResponse,
        title,
        description,
        ActivityIcon::Reply,
        now,
    );
    Ok(TransitionOutcome {
        agreement: next,
        entry,
    })
}

/// Wire patch for `PATCH /api/claims` matching the outcome of
/// [`record_response`] for the same inputs.
pub fn response_patch(next: &Agreement, response: &LenderResponse) -> AgreementPatch {
    let (want_to_take_over, response_action) = match response {
        LenderResponse::AlreadySubmitted { want_to_take_over } => {
            (Some(*want_to_take_over), None)
        }
        LenderResponse::Rejected { action } => (None, Some(*action)),
        _ => (None, None),
    };
    AgreementPatch {
        status: next.status,
        agreement_number: next.agreement_number.clone(),
        offer_amount: next.offer_amount,
        want_to_take_over,
        response_action,
    }
}

fn require_status(
    agreement: &Agreement,
    expected: AgreementStatus,
) -> Result<(), TransitionError> {
    if agreement.status == expected {
        Ok(())
    } else {
        Err(TransitionError::Precondition {
            claim_id: agreement.claim_id.clone(),
            expected,
            found: agreement.status,
        })
    }
}

fn entry(
    kind: ActivityKind,
    title: &str,
    description: String,
    icon: ActivityIcon,
    timestamp: DateTime<Utc>,
) -> ActivityLogEntry {
    ActivityLogEntry {
        id: Uuid::new_v4(),
        kind,
        title: title.to_string(),
        description,
        timestamp,
        icon,
    }
}
