//! Statistical rollups over a point-in-time lead snapshot.
//!
//! Every function here is a pure, total computation: the caller fetches the
//! snapshot, and an empty snapshot degrades every ratio to zero instead of
//! dividing by it.

pub mod views;

use super::domain::{LeadRecord, LeadStatus};
use chrono::{DateTime, Duration, Days, NaiveTime, Utc};
use std::collections::BTreeMap;
use views::{
    CampaignEntry, DailyTrendEntry, DashboardReport, FunnelDropOff, FunnelReport, FunnelStage,
    OverviewStats, PerformanceStats, QualityBucket, QualityDistribution, QualityReport,
};

/// Number of calendar days covered by the dashboard trend, ending today.
const TREND_DAYS: u64 = 30;

/// Quality score at or above which a lead counts as high quality.
pub const HIGH_QUALITY_THRESHOLD: u8 = 70;

/// Lower bound of the medium quality bucket.
pub const MEDIUM_QUALITY_THRESHOLD: u8 = 40;

/// Response-time tracking is not implemented; timestamps for first contact
/// are not recorded anywhere, so the dashboard carries a fixed placeholder.
const RESPONSE_TIME_PLACEHOLDER: &str = "2.5 hours";

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage_of(part: usize, total: usize, round: fn(f64) -> f64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round(part as f64 / total as f64 * 100.0)
    }
}

fn status_count(leads: &[LeadRecord], status: LeadStatus) -> usize {
    leads.iter().filter(|lead| lead.status == status).count()
}

/// Dashboard overview for the admin UI: time-windowed counts, breakdowns by
/// status/source/campaign/device/investment, the 30-day trend, and the
/// performance counters.
pub fn dashboard_overview(leads: &[LeadRecord], now: DateTime<Utc>) -> DashboardReport {
    let today_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let week_start = now - Duration::days(7);
    let month_start = now - Duration::days(30);

    let total_leads = leads.len();
    let today_leads = leads
        .iter()
        .filter(|lead| lead.created_at >= today_start)
        .count();
    let week_leads = leads
        .iter()
        .filter(|lead| lead.created_at >= week_start)
        .count();
    let month_leads = leads
        .iter()
        .filter(|lead| lead.created_at >= month_start)
        .count();

    let mut status = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut devices = BTreeMap::new();
    let mut investments = BTreeMap::new();
    let mut campaign_rollup: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for lead in leads {
        *status.entry(lead.status.label()).or_insert(0) += 1;
        *sources.entry(lead.source.clone()).or_insert(0) += 1;
        *investments.entry(lead.investment.clone()).or_insert(0) += 1;
        if let Some(device) = lead.device_type {
            *devices.entry(device.label()).or_insert(0) += 1;
        }
        if let Some(campaign) = &lead.utm_campaign {
            let entry = campaign_rollup.entry(campaign.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += lead.conversion_value;
        }
    }

    let campaigns = campaign_rollup
        .into_iter()
        .map(|(campaign, (count, value))| CampaignEntry {
            campaign,
            leads: count,
            value,
        })
        .collect();

    let converted = status_count(leads, LeadStatus::Converted);
    let conversion_rate = percentage_of(converted, total_leads, round2);

    let scored: Vec<u8> = leads
        .iter()
        .map(|lead| lead.quality_score)
        .filter(|score| *score > 0)
        .collect();
    let avg_quality_score = if scored.is_empty() {
        0.0
    } else {
        round1(scored.iter().map(|score| *score as f64).sum::<f64>() / scored.len() as f64)
    };

    let daily_trend = daily_trend(leads, now);

    let high_quality_leads = leads
        .iter()
        .filter(|lead| lead.quality_score >= HIGH_QUALITY_THRESHOLD)
        .count();
    let hot_leads =
        status_count(leads, LeadStatus::Hot) + status_count(leads, LeadStatus::Qualified);

    DashboardReport {
        overview: OverviewStats {
            total_leads,
            today_leads,
            week_leads,
            month_leads,
            conversion_rate,
            avg_quality_score,
        },
        status,
        sources,
        campaigns,
        devices,
        investments,
        daily_trend,
        performance: PerformanceStats {
            avg_response_time: RESPONSE_TIME_PLACEHOLDER,
            high_quality_leads,
            hot_leads,
        },
    }
}

/// Capture volume for each of the 30 calendar days ending at `now`'s day,
/// oldest first, counted over half-open `[day_start, day_start + 1d)`
/// windows so no record falls in two buckets.
fn daily_trend(leads: &[LeadRecord], now: DateTime<Utc>) -> Vec<DailyTrendEntry> {
    (0..TREND_DAYS)
        .rev()
        .map(|offset| {
            let day = now.date_naive() - Days::new(offset);
            let day_start = day.and_time(NaiveTime::MIN).and_utc();
            let day_end = day_start + Duration::days(1);
            let count = leads
                .iter()
                .filter(|lead| lead.created_at >= day_start && lead.created_at < day_end)
                .count();
            DailyTrendEntry {
                date: day.format("%Y-%m-%d").to_string(),
                count,
            }
        })
        .collect()
}

/// Sequential counts for the four pipeline statuses plus the grand total,
/// with stage-to-stage drop-off. The stages are independent status counts,
/// so a drop-off can legitimately come out negative; it is reported as
/// computed rather than clamped.
pub fn conversion_funnel(leads: &[LeadRecord]) -> FunnelReport {
    let total = leads.len();
    let new = status_count(leads, LeadStatus::New);
    let contacted = status_count(leads, LeadStatus::Contacted);
    let qualified = status_count(leads, LeadStatus::Qualified);
    let converted = status_count(leads, LeadStatus::Converted);

    let stage = |name, count| FunnelStage {
        name,
        count,
        percentage: percentage_of(count, total, round1),
    };

    let drop_off_pct = |from: usize, to: usize| {
        if from == 0 {
            0.0
        } else {
            round1((from as f64 - to as f64) / from as f64 * 100.0)
        }
    };

    FunnelReport {
        stages: vec![
            FunnelStage {
                name: "Total Leads",
                count: total,
                percentage: if total == 0 { 0.0 } else { 100.0 },
            },
            stage("New", new),
            stage("Contacted", contacted),
            stage("Qualified", qualified),
            stage("Converted", converted),
        ],
        conversion_rate: percentage_of(converted, total, round2),
        drop_off: FunnelDropOff {
            new_to_contacted: drop_off_pct(new, contacted),
            contacted_to_qualified: drop_off_pct(contacted, qualified),
            qualified_to_converted: drop_off_pct(qualified, converted),
        },
    }
}

/// Partition of the snapshot into disjoint, exhaustive quality buckets:
/// high (>= 70), medium (40..70), low (< 40).
pub fn quality_distribution(leads: &[LeadRecord]) -> QualityReport {
    let high = leads
        .iter()
        .filter(|lead| lead.quality_score >= HIGH_QUALITY_THRESHOLD)
        .count();
    let medium = leads
        .iter()
        .filter(|lead| {
            lead.quality_score >= MEDIUM_QUALITY_THRESHOLD
                && lead.quality_score < HIGH_QUALITY_THRESHOLD
        })
        .count();
    let low = leads
        .iter()
        .filter(|lead| lead.quality_score < MEDIUM_QUALITY_THRESHOLD)
        .count();

    let total = high + medium + low;
    let bucket = |count| QualityBucket {
        count,
        percentage: percentage_of(count, total, round1),
    };

    QualityReport {
        distribution: QualityDistribution {
            high: bucket(high),
            medium: bucket(medium),
            low: bucket(low),
        },
        recommendations: [
            "Focus on high-quality leads first for better conversion rates",
            "Review medium-quality leads for potential qualification",
            "Consider automated follow-up for low-quality leads",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::domain::{DeviceType, LeadId, LeadStatus};
    use chrono::TimeZone;

    fn at(now: DateTime<Utc>, days_ago: i64) -> DateTime<Utc> {
        now - Duration::days(days_ago)
    }

    fn lead(id: u64, status: LeadStatus, score: u8, created_at: DateTime<Utc>) -> LeadRecord {
        LeadRecord {
            id: LeadId(id),
            first_name: "Test".to_string(),
            last_name: format!("Lead{id}"),
            email: format!("lead{id}@example.com"),
            phone: "+10000000000".to_string(),
            investment: "250-999".to_string(),
            source: "website".to_string(),
            status,
            notes: String::new(),
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            referrer: None,
            landing_page: None,
            user_agent: None,
            device_type: Some(DeviceType::Desktop),
            ip_address: None,
            conversion_value: 0.0,
            quality_score: score,
            last_activity: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 14, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn empty_snapshot_degrades_to_zeroes() {
        let now = fixed_now();
        let dashboard = dashboard_overview(&[], now);
        assert_eq!(dashboard.overview.total_leads, 0);
        assert_eq!(dashboard.overview.conversion_rate, 0.0);
        assert_eq!(dashboard.overview.avg_quality_score, 0.0);
        assert_eq!(dashboard.daily_trend.len(), 30);
        assert!(dashboard.daily_trend.iter().all(|entry| entry.count == 0));
        assert!(dashboard.status.is_empty());
        assert!(dashboard.campaigns.is_empty());

        let funnel = conversion_funnel(&[]);
        assert!(funnel
            .stages
            .iter()
            .all(|stage| stage.count == 0 && stage.percentage == 0.0));
        assert_eq!(funnel.drop_off.new_to_contacted, 0.0);

        let quality = quality_distribution(&[]);
        assert_eq!(quality.distribution.high.count, 0);
        assert_eq!(quality.distribution.high.percentage, 0.0);
    }

    #[test]
    fn daily_trend_covers_thirty_days_oldest_first() {
        let now = fixed_now();
        let leads = vec![
            lead(1, LeadStatus::New, 50, at(now, 0)),
            lead(2, LeadStatus::New, 50, at(now, 2)),
            lead(3, LeadStatus::New, 50, at(now, 2)),
            // Outside the window entirely.
            lead(4, LeadStatus::New, 50, at(now, 45)),
        ];

        let report = dashboard_overview(&leads, now);
        let trend = &report.daily_trend;
        assert_eq!(trend.len(), 30);
        assert_eq!(trend[29].date, "2025-06-15");
        assert_eq!(trend[0].date, "2025-05-17");
        assert_eq!(trend[29].count, 1);
        assert_eq!(trend[27].count, 2);
        assert_eq!(trend.iter().map(|entry| entry.count).sum::<usize>(), 3);

        // No gaps or duplicates across the range.
        let mut dates: Vec<&str> = trend.iter().map(|entry| entry.date.as_str()).collect();
        dates.dedup();
        assert_eq!(dates.len(), 30);
    }

    #[test]
    fn overview_windows_are_inclusive_of_their_start() {
        let now = fixed_now();
        let leads = vec![
            lead(1, LeadStatus::New, 60, now - Duration::hours(1)),
            lead(2, LeadStatus::New, 60, at(now, 3)),
            lead(3, LeadStatus::New, 60, at(now, 20)),
            lead(4, LeadStatus::New, 60, at(now, 40)),
        ];

        let report = dashboard_overview(&leads, now);
        assert_eq!(report.overview.total_leads, 4);
        assert_eq!(report.overview.today_leads, 1);
        assert_eq!(report.overview.week_leads, 2);
        assert_eq!(report.overview.month_leads, 3);
    }

    #[test]
    fn breakdowns_group_by_observed_values_only() {
        let now = fixed_now();
        let mut convertee = lead(1, LeadStatus::Converted, 80, at(now, 1));
        convertee.utm_campaign = Some("spring-launch".to_string());
        convertee.conversion_value = 250.0;
        let mut second = lead(2, LeadStatus::Hot, 75, at(now, 1));
        second.utm_campaign = Some("spring-launch".to_string());
        second.device_type = None;
        let third = lead(3, LeadStatus::Qualified, 0, at(now, 1));

        let report = dashboard_overview(&[convertee, second, third], now);
        assert_eq!(report.status.get("converted"), Some(&1));
        assert_eq!(report.status.get("hot"), Some(&1));
        assert_eq!(report.status.get("new"), None);
        assert_eq!(report.devices.get("desktop"), Some(&2));
        assert_eq!(report.devices.len(), 1);

        assert_eq!(report.campaigns.len(), 1);
        assert_eq!(report.campaigns[0].leads, 2);
        assert_eq!(report.campaigns[0].value, 250.0);

        // conversion: 1 of 3; average quality skips the zero score.
        assert_eq!(report.overview.conversion_rate, 33.33);
        assert_eq!(report.overview.avg_quality_score, 77.5);

        assert_eq!(report.performance.high_quality_leads, 2);
        // hot + qualified
        assert_eq!(report.performance.hot_leads, 2);
    }

    #[test]
    fn funnel_reports_the_literal_formula() {
        let now = fixed_now();
        let leads = vec![
            lead(1, LeadStatus::New, 50, at(now, 1)),
            lead(2, LeadStatus::New, 50, at(now, 1)),
            lead(3, LeadStatus::New, 50, at(now, 1)),
            lead(4, LeadStatus::New, 50, at(now, 1)),
            lead(5, LeadStatus::Contacted, 50, at(now, 1)),
            lead(6, LeadStatus::Contacted, 50, at(now, 1)),
            lead(7, LeadStatus::Qualified, 50, at(now, 1)),
            lead(8, LeadStatus::Converted, 50, at(now, 1)),
        ];

        let funnel = conversion_funnel(&leads);
        assert_eq!(funnel.stages[0].count, 8);
        assert_eq!(funnel.stages[0].percentage, 100.0);
        assert_eq!(funnel.stages[1].percentage, 50.0);
        assert_eq!(funnel.drop_off.new_to_contacted, 50.0);
        assert_eq!(funnel.drop_off.contacted_to_qualified, 50.0);
        assert_eq!(funnel.drop_off.qualified_to_converted, 0.0);
        assert_eq!(funnel.conversion_rate, 12.5);
    }

    #[test]
    fn funnel_drop_off_can_go_negative() {
        let now = fixed_now();
        // More qualified than contacted: statuses are not a strict pipeline.
        let leads = vec![
            lead(1, LeadStatus::Contacted, 50, at(now, 1)),
            lead(2, LeadStatus::Qualified, 50, at(now, 1)),
            lead(3, LeadStatus::Qualified, 50, at(now, 1)),
        ];

        let funnel = conversion_funnel(&leads);
        assert_eq!(funnel.drop_off.contacted_to_qualified, -100.0);
        assert_eq!(funnel.drop_off.qualified_to_converted, 100.0);
        // Zero-count leading stage keeps the formula total.
        assert_eq!(funnel.drop_off.new_to_contacted, 0.0);
    }

    #[test]
    fn quality_buckets_are_disjoint_and_exhaustive() {
        let now = fixed_now();
        let leads = vec![
            lead(1, LeadStatus::New, 100, at(now, 1)),
            lead(2, LeadStatus::New, 70, at(now, 1)),
            lead(3, LeadStatus::New, 69, at(now, 1)),
            lead(4, LeadStatus::New, 40, at(now, 1)),
            lead(5, LeadStatus::New, 39, at(now, 1)),
            lead(6, LeadStatus::New, 0, at(now, 1)),
        ];

        let report = quality_distribution(&leads);
        let distribution = report.distribution;
        assert_eq!(distribution.high.count, 2);
        assert_eq!(distribution.medium.count, 2);
        assert_eq!(distribution.low.count, 2);
        assert_eq!(
            distribution.high.count + distribution.medium.count + distribution.low.count,
            leads.len()
        );
        assert_eq!(distribution.high.percentage, 33.3);
        assert_eq!(report.recommendations.len(), 3);
    }
}
