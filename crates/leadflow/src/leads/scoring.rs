use super::domain::{DeviceType, LeadSubmission};

/// Floor of every computation before adjustments apply.
const BASE_SCORE: i16 = 50;

/// Paid acquisition channels that earn the source bonus.
const PAID_MEDIUMS: [&str; 3] = ["cpc", "paid", "ppc"];

/// Discrete contribution to a quality score, kept so CLI and audit output
/// can show how a score was assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreComponent {
    pub factor: &'static str,
    pub points: i16,
}

/// Heuristic lead quality score in `[0, 100]`.
///
/// Deterministic and total: missing or unrecognized fields contribute their
/// neutral branch instead of failing. Adjustments are independent, so one
/// submission can collect several bonuses plus the direct-traffic penalty.
pub fn quality_score(submission: &LeadSubmission) -> u8 {
    let total: i16 = score_components(submission)
        .iter()
        .map(|component| component.points)
        .sum();
    total.clamp(0, 100) as u8
}

/// The additive breakdown behind [`quality_score`]. Only adjustments that
/// actually applied are listed, after the base entry.
pub fn score_components(submission: &LeadSubmission) -> Vec<ScoreComponent> {
    let mut components = vec![ScoreComponent {
        factor: "base",
        points: BASE_SCORE,
    }];

    let investment_points = match submission.investment.as_deref() {
        Some("1500+") => 20,
        Some("1000-1499") => 15,
        Some("250-999") => 10,
        Some("0-249") => 5,
        _ => 0,
    };
    if investment_points > 0 {
        components.push(ScoreComponent {
            factor: "investment_band",
            points: investment_points,
        });
    }

    // Substring containment, not word boundaries: "Has Deposit: yes" in the
    // composed notes is the common trigger.
    let notes = submission
        .notes
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if notes.contains("yes") && notes.contains("deposit") {
        components.push(ScoreComponent {
            factor: "deposit_ready",
            points: 15,
        });
    }

    if submission
        .utm_medium
        .as_deref()
        .is_some_and(|medium| PAID_MEDIUMS.contains(&medium))
    {
        components.push(ScoreComponent {
            factor: "paid_source",
            points: 10,
        });
    }

    let identity_complete = [
        &submission.first_name,
        &submission.last_name,
        &submission.email,
        &submission.phone,
    ]
    .iter()
    .all(|field| field.as_deref().is_some_and(|value| !value.is_empty()));
    if identity_complete {
        components.push(ScoreComponent {
            factor: "complete_profile",
            points: 10,
        });
    }

    if submission
        .device_type
        .as_deref()
        .is_some_and(|device| DeviceType::parse(device) == DeviceType::Desktop)
    {
        components.push(ScoreComponent {
            factor: "desktop_device",
            points: 5,
        });
    }

    let direct_traffic = match submission.referrer.as_deref() {
        None | Some("") | Some("direct") => true,
        Some(_) => false,
    };
    if direct_traffic {
        components.push(ScoreComponent {
            factor: "direct_traffic",
            points: -10,
        });
    }

    components
}
