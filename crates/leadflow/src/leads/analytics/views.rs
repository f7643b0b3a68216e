use serde::Serialize;
use std::collections::BTreeMap;

/// Headline counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub total_leads: usize,
    pub today_leads: usize,
    pub week_leads: usize,
    pub month_leads: usize,
    pub conversion_rate: f64,
    pub avg_quality_score: f64,
}

/// One calendar day of capture volume for the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrendEntry {
    pub date: String,
    pub count: usize,
}

/// Per-campaign rollup keyed on `utm_campaign`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignEntry {
    pub campaign: String,
    pub leads: usize,
    pub value: f64,
}

/// Operational counters surfaced alongside the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// Not measured yet: no response timestamps are recorded, so this stays
    /// a fixed placeholder to keep the dashboard payload shape stable.
    pub avg_response_time: &'static str,
    pub high_quality_leads: usize,
    pub hot_leads: usize,
}

/// Full dashboard payload, serialized directly to the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub overview: OverviewStats,
    pub status: BTreeMap<&'static str, usize>,
    pub sources: BTreeMap<String, usize>,
    pub campaigns: Vec<CampaignEntry>,
    pub devices: BTreeMap<&'static str, usize>,
    pub investments: BTreeMap<String, usize>,
    pub daily_trend: Vec<DailyTrendEntry>,
    pub performance: PerformanceStats,
}

/// A single funnel stage with its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub name: &'static str,
    pub count: usize,
    pub percentage: f64,
}

/// Stage-to-stage relative decline. Values can go negative when a later
/// stage out-counts an earlier one; stages are independent status counts,
/// not a cumulative pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelDropOff {
    pub new_to_contacted: f64,
    pub contacted_to_qualified: f64,
    pub qualified_to_converted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelReport {
    pub stages: Vec<FunnelStage>,
    pub conversion_rate: f64,
    pub drop_off: FunnelDropOff,
}

/// Count and share for one quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBucket {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityDistribution {
    pub high: QualityBucket,
    pub medium: QualityBucket,
    pub low: QualityBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub distribution: QualityDistribution,
    pub recommendations: [&'static str; 3],
}
