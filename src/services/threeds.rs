use crate::domain::remote::{CardDetails, LiabilityShift};

/// Outcome of the 3-D-Secure gate. `NoDecision` and `Proceed` both let the
/// attempt continue; `Reject` is terminal for this attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreeDsDecision {
    NoDecision,
    Proceed,
    Reject,
}

/// Decide from the card's authentication result. Liability shift is the
/// primary signal: `Possible` means the issuer takes fraud liability,
/// `No` with a failed or rejected issuer response means the buyer did not
/// authenticate. Anything ambiguous stays `NoDecision` and the order-status
/// check governs.
pub fn decide(card: Option<&CardDetails>) -> ThreeDsDecision {
    let Some(result) = card.and_then(|c| c.authentication_result.as_ref()) else {
        return ThreeDsDecision::NoDecision;
    };

    match result.liability_shift {
        Some(LiabilityShift::Possible) => ThreeDsDecision::Proceed,
        Some(LiabilityShift::No) => match result.authentication_status.as_deref() {
            // N = failed, R = rejected by issuer.
            Some("N") | Some("R") => ThreeDsDecision::Reject,
            _ => ThreeDsDecision::NoDecision,
        },
        Some(LiabilityShift::Unknown) | None => ThreeDsDecision::NoDecision,
    }
}
