use crate::config::{CategoryConfig, DashboardConfig};
use crate::data::JoinedTable;
use crate::types::{ChartSlice, ChartViews, MapPoint, ProvinceSummary};
use tracing::debug;

/// Everything a selection needs, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    table: JoinedTable,
    config: DashboardConfig,
}

impl DashboardContext {
    pub fn new(table: JoinedTable, config: DashboardConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &JoinedTable {
        &self.table
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn province_options(&self) -> &[String] {
        self.table.province_options()
    }

    /// Initial selector value: the first province, if any.
    pub fn default_selection(&self) -> Option<&str> {
        self.table.province_options().first().map(String::as_str)
    }
}

/// Sums male, female and total over every row of the selected province.
/// No selection, or a province with no rows, gives an all-zero summary.
pub fn summarize(table: &JoinedTable, selection: Option<&str>) -> ProvinceSummary {
    let mut summary = ProvinceSummary {
        province: selection.map(str::to_string),
        ..Default::default()
    };

    let Some(province) = selection else {
        return summary;
    };

    for row in table.rows().iter().filter(|row| row.province == province) {
        summary.male_count += u64::from(row.male);
        summary.female_count += u64::from(row.female);
        summary.total_count += u64::from(row.total);
    }

    summary
}

/// One point per joined row. Marker area is proportional to the row total.
pub fn map_points(ctx: &DashboardContext) -> Vec<MapPoint> {
    let rows = ctx.table().rows();
    let max_total = rows.iter().map(|row| row.total).max().unwrap_or(0);
    let size_max = ctx.config().size_max;

    rows.iter()
        .map(|row| MapPoint {
            latitude: row.latitude,
            longitude: row.longitude,
            province: row.province.clone(),
            total: row.total,
            male: row.male,
            female: row.female,
            size: marker_size(row.total, max_total, size_max),
        })
        .collect()
}

fn marker_size(total: u32, max_total: u32, size_max: f64) -> f64 {
    if max_total == 0 {
        return 0.0;
    }
    size_max * (f64::from(total) / f64::from(max_total)).sqrt()
}

fn slice(category: &CategoryConfig, value: u64) -> ChartSlice {
    ChartSlice {
        label: category.name.clone(),
        value,
        color: category.color.clone(),
    }
}

/// Male, female, total.
pub fn bar_view(summary: &ProvinceSummary, config: &DashboardConfig) -> Vec<ChartSlice> {
    vec![
        slice(&config.male, summary.male_count),
        slice(&config.female, summary.female_count),
        slice(&config.total, summary.total_count),
    ]
}

/// Male, female.
pub fn pie_view(summary: &ProvinceSummary, config: &DashboardConfig) -> Vec<ChartSlice> {
    vec![
        slice(&config.male, summary.male_count),
        slice(&config.female, summary.female_count),
    ]
}

/// Both chart outputs for a selection, derived from the same summary.
pub fn chart_views(ctx: &DashboardContext, selection: Option<&str>) -> ChartViews {
    let summary = summarize(ctx.table(), selection);
    debug!(?selection, total = summary.total_count, "Recomputed province summary");

    ChartViews {
        province: summary.province.clone(),
        bar: bar_view(&summary, ctx.config()),
        pie: pie_view(&summary, ctx.config()),
        summary,
    }
}

/// Last computed chart views. Starts from the zero summary and changes only
/// through `select`.
#[derive(Debug, Clone)]
pub struct SelectionState {
    current: ChartViews,
}

impl SelectionState {
    pub fn new(ctx: &DashboardContext) -> Self {
        Self {
            current: chart_views(ctx, None),
        }
    }

    pub fn select(&mut self, ctx: &DashboardContext, selection: Option<&str>) -> &ChartViews {
        self.current = chart_views(ctx, selection);
        &self.current
    }

    pub fn current(&self) -> &ChartViews {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JoinedRecord;

    fn row(province: &str, male: u32, female: u32, total: u32) -> JoinedRecord {
        JoinedRecord {
            province: province.to_string(),
            total,
            male,
            female,
            latitude: 13.0,
            longitude: 100.0,
        }
    }

    fn sample_table() -> JoinedTable {
        JoinedTable::from_rows(vec![
            row("Bangkok", 10, 12, 22),
            row("Bangkok", 5, 6, 11),
            row("Chiang Mai", 3, 2, 5),
        ])
    }

    fn counts(summary: &ProvinceSummary) -> (u64, u64, u64) {
        (summary.male_count, summary.female_count, summary.total_count)
    }

    #[test]
    fn sums_every_row_of_the_selected_province() {
        let table = sample_table();
        assert_eq!(counts(&summarize(&table, Some("Bangkok"))), (15, 18, 33));
        assert_eq!(counts(&summarize(&table, Some("Chiang Mai"))), (3, 2, 5));
    }

    #[test]
    fn unknown_or_absent_selection_is_zero() {
        let table = sample_table();
        assert_eq!(counts(&summarize(&table, Some("Phuket"))), (0, 0, 0));
        assert_eq!(counts(&summarize(&table, None)), (0, 0, 0));
        assert_eq!(counts(&summarize(&table, Some("bangkok"))), (0, 0, 0));
        assert_eq!(counts(&summarize(&JoinedTable::default(), Some("Bangkok"))), (0, 0, 0));
    }

    #[test]
    fn summarize_is_idempotent() {
        let table = sample_table();
        for selection in [Some("Bangkok"), Some("Phuket"), None] {
            assert_eq!(summarize(&table, selection), summarize(&table, selection));
        }
    }

    #[test]
    fn columns_are_summed_independently() {
        let table = JoinedTable::from_rows(vec![row("A", 1, 1, 100), row("A", 2, 0, 0)]);
        assert_eq!(counts(&summarize(&table, Some("A"))), (3, 1, 100));
    }

    #[test]
    fn sums_do_not_overflow_u32() {
        let table = JoinedTable::from_rows(vec![
            row("A", u32::MAX, 0, u32::MAX),
            row("A", u32::MAX, 0, u32::MAX),
        ]);
        let summary = summarize(&table, Some("A"));
        assert_eq!(summary.male_count, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn map_has_one_point_per_row() {
        let ctx = DashboardContext::new(sample_table(), DashboardConfig::default());
        let points = map_points(&ctx);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].province, "Bangkok");
        assert_eq!(points[0].size, 30.0);
        assert!(points[2].size < points[1].size);
        assert!((points[1].size - 30.0 * (0.5f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_table_gives_empty_map_and_zero_charts() {
        let ctx = DashboardContext::new(JoinedTable::default(), DashboardConfig::default());

        assert!(map_points(&ctx).is_empty());
        assert_eq!(ctx.default_selection(), None);

        let views = chart_views(&ctx, ctx.default_selection());
        assert!(views.bar.iter().all(|s| s.value == 0));
        assert!(views.pie.iter().all(|s| s.value == 0));
    }

    #[test]
    fn zero_totals_give_zero_sized_points() {
        let table = JoinedTable::from_rows(vec![row("A", 0, 0, 0)]);
        let ctx = DashboardContext::new(table, DashboardConfig::default());
        assert_eq!(map_points(&ctx)[0].size, 0.0);
    }

    #[test]
    fn chart_views_follow_category_order() {
        let ctx = DashboardContext::new(sample_table(), DashboardConfig::default());
        let views = chart_views(&ctx, Some("Bangkok"));

        let bar: Vec<(&str, u64)> = views.bar.iter().map(|s| (s.label.as_str(), s.value)).collect();
        assert_eq!(bar, vec![("ชาย", 15), ("หญิง", 18), ("รวม", 33)]);

        let pie: Vec<(&str, u64)> = views.pie.iter().map(|s| (s.label.as_str(), s.value)).collect();
        assert_eq!(pie, vec![("ชาย", 15), ("หญิง", 18)]);
        assert_eq!(views.pie[1].color, "#ff7f0e");
        assert_eq!(views.province.as_deref(), Some("Bangkok"));
    }

    #[test]
    fn default_selection_is_first_option() {
        let ctx = DashboardContext::new(sample_table(), DashboardConfig::default());
        assert_eq!(ctx.default_selection(), Some("Bangkok"));
        assert_eq!(ctx.province_options(), ["Bangkok".to_string(), "Chiang Mai".to_string()]);
    }

    #[test]
    fn selection_state_tracks_last_selection() {
        let ctx = DashboardContext::new(sample_table(), DashboardConfig::default());
        let mut state = SelectionState::new(&ctx);
        assert_eq!(counts(&state.current().summary), (0, 0, 0));

        assert_eq!(counts(&state.select(&ctx, Some("Chiang Mai")).summary), (3, 2, 5));
        assert_eq!(state.current().province.as_deref(), Some("Chiang Mai"));

        state.select(&ctx, Some("Phuket"));
        assert_eq!(counts(&state.current().summary), (0, 0, 0));
        assert_eq!(state.current().bar[2].value, 0);
    }
}
