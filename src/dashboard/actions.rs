//! Dashboard actions and async action creators

use super::DashboardStore;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Row count reported for charts without an explicit `row_limit`
const DEFAULT_ROW_LIMIT: u64 = 10_000;

/// Simulated query latency for chart refreshes
pub const REFRESH_LATENCY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A chart's popover container gained or lost focus
    ChartFocusChanged { slice_id: u64, focused: bool },
    /// Show or hide the chart description
    ToggleExpandSlice(u64),
    /// A chart query was started
    RefreshChart(u64),
    /// A chart query finished
    ChartRefreshed {
        slice_id: u64,
        rows: u64,
        at: DateTime<Utc>,
    },
    /// Drop a chart from the dashboard (edit mode only)
    RemoveSlice(u64),
    SetEditMode(bool),
}

/// Refresh one chart: mark it loading now, report rows when the query completes
pub fn refresh_chart(slice_id: u64) -> impl FnOnce(&DashboardStore) {
    refresh_chart_with_latency(slice_id, REFRESH_LATENCY)
}

pub fn refresh_chart_with_latency(slice_id: u64, latency: Duration) -> impl FnOnce(&DashboardStore) {
    move |store| {
        let row_limit = {
            let state = store.state();
            let Some(chart) = state.charts.get(&slice_id) else {
                tracing::debug!("Refresh requested for unknown chart {}", slice_id);
                return;
            };
            chart
                .form_data
                .get("row_limit")
                .and_then(|v| v.as_u64())
                .unwrap_or(DEFAULT_ROW_LIMIT)
        };

        store.dispatch(Action::RefreshChart(slice_id));
        store.dispatch_task(async move {
            tokio::time::sleep(latency).await;
            Action::ChartRefreshed {
                slice_id,
                rows: row_limit,
                at: Utc::now(),
            }
        });
    }
}

/// Refresh every chart on the dashboard
pub fn refresh_all() -> impl FnOnce(&DashboardStore) {
    move |store| {
        let ids = store.state().slice_ids.clone();
        for id in ids {
            store.dispatch_thunk(refresh_chart(id));
        }
    }
}
