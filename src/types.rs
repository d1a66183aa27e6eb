use serde::Serialize;

/// One row of the enrollment source (a school or a per-province aggregate).
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolRecord {
    pub province: String,
    pub total: u32,
    pub male: u32,
    pub female: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A school row with the coordinates of its province attached.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub province: String,
    pub total: u32,
    pub male: u32,
    pub female: u32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvinceSummary {
    pub province: Option<String>,
    pub male_count: u64,
    pub female_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub province: String,
    pub total: u32,
    pub male: u32,
    pub female: u32,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: u64,
    pub color: String,
}

/// Bar (male/female/total) and pie (male/female) views for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartViews {
    pub province: Option<String>,
    pub summary: ProvinceSummary,
    pub bar: Vec<ChartSlice>,
    pub pie: Vec<ChartSlice>,
}
