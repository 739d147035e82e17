//! Lender-level status derivation.
//!
//! Every surface (dashboard cards, lender detail, response modal) derives
//! the lender status and stepper position through these two functions, so
//! the precedence rules live in exactly one place.

use shared::domain::{Agreement, AgreementStatus, LenderStatus};

/// Stage labels for the 4-step progress ladder, indexed by
/// [`LenderStatus::step_index`].
pub const PROGRESS_STAGES: [&str; 4] = [
    "Document Requested",
    "Agreement Added",
    "Submit Claim",
    "Lender Responded",
];

/// Derives the lender-level status from its agreements. First match wins:
/// any response status, then any submitted, then any agreement at all.
/// Order-independent by construction.
pub fn lender_status(agreements: &[Agreement]) -> LenderStatus {
    if agreements.iter().any(|a| a.status.is_response()) {
        LenderStatus::LenderResponded
    } else if agreements
        .iter()
        .any(|a| a.status == AgreementStatus::Submitted)
    {
        LenderStatus::ClaimSubmitted
    } else if !agreements.is_empty() {
        LenderStatus::AgreementAdded
    } else {
        LenderStatus::DocumentRequested
    }
}

/// Stepper position, 0..=3. Same precedence as [`lender_status`].
pub fn step_index(agreements: &[Agreement]) -> usize {
    lender_status(agreements).step_index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::domain::ClaimId;

    fn agreements(statuses: &[AgreementStatus]) -> Vec<Agreement> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Agreement {
                claim_id: ClaimId::new(format!("clm-{i}")),
                agreement_number: format!("AG-{i}"),
                car_registration: "AB12 CDE".into(),
                status: *status,
                offer_amount: None,
                created: Utc::now(),
                updated: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn no_agreements_means_document_requested() {
        assert_eq!(lender_status(&[]), LenderStatus::DocumentRequested);
        assert_eq!(step_index(&[]), 0);
    }

    #[test]
    fn pending_agreements_mean_agreement_added() {
        let set = agreements(&[AgreementStatus::Pending, AgreementStatus::Pending]);
        assert_eq!(lender_status(&set), LenderStatus::AgreementAdded);
        assert_eq!(step_index(&set), 1);
    }

    #[test]
    fn any_submitted_moves_to_claim_submitted() {
        let set = agreements(&[AgreementStatus::Submitted, AgreementStatus::Submitted]);
        assert_eq!(lender_status(&set), LenderStatus::ClaimSubmitted);
        assert_eq!(step_index(&set), 2);
    }

    #[test]
    fn one_response_wins_over_everything_else() {
        let set = agreements(&[
            AgreementStatus::Pending,
            AgreementStatus::Submitted,
            AgreementStatus::OfferMade,
        ]);
        assert_eq!(lender_status(&set), LenderStatus::LenderResponded);
        assert_eq!(step_index(&set), 3);
    }

    #[test]
    fn derivation_is_order_independent() {
        let statuses = [
            AgreementStatus::Pending,
            AgreementStatus::FosEscalation,
            AgreementStatus::Submitted,
        ];
        // All 6 permutations of three distinct statuses.
        let permutations: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for perm in permutations {
            let set = agreements(&perm.map(|i| statuses[i]));
            assert_eq!(lender_status(&set), LenderStatus::LenderResponded);
        }
    }

    #[test]
    fn every_response_status_triggers_lender_responded() {
        for status in [
            AgreementStatus::OfferMade,
            AgreementStatus::Rejected,
            AgreementStatus::ClaimAlreadySubmitted,
            AgreementStatus::FosEscalation,
            AgreementStatus::Completed,
        ] {
            let set = agreements(&[AgreementStatus::Pending, status]);
            assert_eq!(lender_status(&set), LenderStatus::LenderResponded);
        }
    }

    #[test]
    fn stage_labels_line_up_with_step_indices() {
        for status in [
            LenderStatus::DocumentRequested,
            LenderStatus::AgreementAdded,
            LenderStatus::ClaimSubmitted,
            LenderStatus::LenderResponded,
        ] {
            assert!(status.step_index() < PROGRESS_STAGES.len());
        }
        assert_eq!(PROGRESS_STAGES[LenderStatus::DocumentRequested.step_index()], "Document Requested");
        assert_eq!(PROGRESS_STAGES[LenderStatus::LenderResponded.step_index()], "Lender Responded");
    }
}
