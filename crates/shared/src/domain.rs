use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(LenderId);
id_newtype!(ClaimId);

/// Per-agreement lifecycle status. Closed set: anything else on the wire
/// fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Pending,
    Submitted,
    OfferMade,
    Rejected,
    FosEscalation,
    ClaimAlreadySubmitted,
    Completed,
}

impl AgreementStatus {
    /// True when the status represents a lender's reply to a submitted
    /// claim. Drives lender-level aggregation and whether the record-response
    /// affordance is offered.
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::OfferMade
                | Self::Rejected
                | Self::ClaimAlreadySubmitted
                | Self::FosEscalation
                | Self::Completed
        )
    }
}

/// Lender-level status, derived from the lender's agreements and never
/// stored. Doubles as the 4-stage progress ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LenderStatus {
    DocumentRequested,
    AgreementAdded,
    ClaimSubmitted,
    LenderResponded,
}

impl LenderStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::DocumentRequested => "Document Requested",
            Self::AgreementAdded => "Agreement Added",
            Self::ClaimSubmitted => "Claim Submitted",
            Self::LenderResponded => "Lender Responded",
        }
    }

    pub fn step_index(self) -> usize {
        match self {
            Self::DocumentRequested => 0,
            Self::AgreementAdded => 1,
            Self::ClaimSubmitted => 2,
            Self::LenderResponded => 3,
        }
    }
}

impl std::fmt::Display for LenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One finance agreement under a claim, as held client-side. Each backend
/// claim wraps exactly one agreement, so the claim id identifies both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub claim_id: ClaimId,
    pub agreement_number: String,
    pub car_registration: String,
    pub status: AgreementStatus,
    pub offer_amount: Option<f64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lender {
    pub id: LenderId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AgreementAdded,
    ClaimSubmitted,
    LenderResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityIcon {
    Document,
    Send,
    Reply,
}

/// Display-only audit record synthesized from a transition. Session-scoped:
/// never persisted server-side, rebuilt from scratch each session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub icon: ActivityIcon,
}
