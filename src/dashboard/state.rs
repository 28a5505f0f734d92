//! Bootstrap payload types and initial state derivation
//!
//! The server embeds the dashboard description as JSON. `get_initial_state`
//! turns that wire shape into the state the store starts from.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ─────────────────────────────────────────────────────────────────────────────
// Bootstrap payload (wire format)
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level bootstrap payload
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapData {
    /// Numeric or string id of the viewing user
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    /// Application-wide settings; passed through untouched
    #[allow(dead_code)] // Reserved for locale and feature flags
    #[serde(default)]
    pub common: serde_json::Value,
    /// Open the dashboard in edit mode
    #[serde(default, rename = "editMode")]
    pub edit_mode: bool,
    /// Datasource descriptions keyed by datasource uid
    #[serde(default)]
    pub datasources: BTreeMap<String, serde_json::Value>,
    pub dashboard_data: DashboardData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardData {
    pub id: u64,
    pub dashboard_title: String,
    #[serde(default)]
    pub slices: Vec<SliceData>,
    #[serde(default)]
    pub metadata: DashboardMetadata,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub dash_edit_perm: bool,
    #[serde(default)]
    pub dash_save_perm: bool,
}

/// One chart on the dashboard
#[derive(Debug, Clone, Deserialize)]
pub struct SliceData {
    pub slice_id: u64,
    pub slice_name: String,
    #[serde(default)]
    pub viz_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub form_data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardMetadata {
    #[serde(default)]
    pub filter_immune_slices: Vec<u64>,
    #[serde(default)]
    pub timed_refresh_immune_slices: Vec<u64>,
    /// Slice id (as string) → expanded
    #[serde(default)]
    pub expanded_slices: BTreeMap<String, bool>,
    /// JSON *string* holding the default filter map
    #[serde(default)]
    pub default_filters: Option<String>,
    /// Auto-refresh period in seconds, 0 = off
    #[serde(default)]
    pub refresh_frequency: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardInfo {
    pub id: u64,
    pub title: String,
    pub user_id: Option<String>,
    pub can_edit: bool,
    pub can_save: bool,
}

/// Static description of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceEntity {
    pub id: u64,
    pub name: String,
    pub viz_type: String,
    pub description: Option<String>,
    pub datasource: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Loading,
    Rendered,
}

impl ChartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartStatus::Loading => "loading",
            ChartStatus::Rendered => "rendered",
        }
    }
}

/// Query state of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartState {
    pub id: u64,
    pub status: ChartStatus,
    pub form_data: serde_json::Value,
    pub rows: Option<u64>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Everything the dashboard view renders from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub info: DashboardInfo,
    /// Chart ids in display order
    pub slice_ids: Vec<u64>,
    pub slices: BTreeMap<u64, SliceEntity>,
    pub charts: BTreeMap<u64, ChartState>,
    /// Default filters keyed by the filtering slice id
    pub filters: BTreeMap<String, serde_json::Value>,
    pub expanded_slices: BTreeSet<u64>,
    pub filter_immune_slices: BTreeSet<u64>,
    pub timed_refresh_immune_slices: BTreeSet<u64>,
    pub refresh_frequency: u64,
    pub edit_mode: bool,
    /// Chart whose popover menu is open
    pub focused_chart: Option<u64>,
    pub has_unsaved_changes: bool,
    pub css: String,
    pub datasource_count: usize,
}

impl DashboardState {
    /// Slices in display order
    pub fn ordered_slices(&self) -> impl Iterator<Item = &SliceEntity> {
        self.slice_ids.iter().filter_map(|id| self.slices.get(id))
    }

    pub fn is_expanded(&self, slice_id: u64) -> bool {
        self.expanded_slices.contains(&slice_id)
    }
}

/// Derive the initial dashboard state from the bootstrap payload
///
/// Fails on a malformed `default_filters` string; the payload is trusted
/// server output and a bad one is a startup error, not something to patch over.
pub fn get_initial_state(data: &BootstrapData) -> Result<DashboardState> {
    let dashboard = &data.dashboard_data;
    let metadata = &dashboard.metadata;

    let filters = parse_default_filters(metadata.default_filters.as_deref())
        .with_context(|| format!("Invalid default_filters on dashboard {}", dashboard.id))?;

    let mut slice_ids = Vec::with_capacity(dashboard.slices.len());
    let mut slices = BTreeMap::new();
    let mut charts = BTreeMap::new();

    for slice in &dashboard.slices {
        if slices.contains_key(&slice.slice_id) {
            tracing::warn!(
                "Duplicate slice {} in dashboard {}, keeping the first",
                slice.slice_id,
                dashboard.id
            );
            continue;
        }

        slice_ids.push(slice.slice_id);
        slices.insert(
            slice.slice_id,
            SliceEntity {
                id: slice.slice_id,
                name: slice.slice_name.clone(),
                viz_type: slice.viz_type.clone(),
                description: slice.description.clone().filter(|d| !d.trim().is_empty()),
                datasource: slice.datasource.clone(),
            },
        );
        charts.insert(
            slice.slice_id,
            ChartState {
                id: slice.slice_id,
                status: ChartStatus::Loading,
                form_data: slice.form_data.clone(),
                rows: None,
                refreshed_at: None,
            },
        );
    }

    let expanded_slices = metadata
        .expanded_slices
        .iter()
        .filter(|(_, expanded)| **expanded)
        .filter_map(|(key, _)| match key.parse::<u64>() {
            Ok(id) if slices.contains_key(&id) => Some(id),
            Ok(_) => None,
            Err(_) => {
                tracing::warn!("Ignoring non-numeric expanded slice key {:?}", key);
                None
            }
        })
        .collect();

    let user_id = data.user_id.as_ref().and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let state = DashboardState {
        info: DashboardInfo {
            id: dashboard.id,
            title: dashboard.dashboard_title.clone(),
            user_id,
            can_edit: dashboard.dash_edit_perm,
            can_save: dashboard.dash_save_perm,
        },
        slice_ids,
        slices,
        charts,
        filters,
        expanded_slices,
        filter_immune_slices: metadata.filter_immune_slices.iter().copied().collect(),
        timed_refresh_immune_slices: metadata
            .timed_refresh_immune_slices
            .iter()
            .copied()
            .collect(),
        refresh_frequency: metadata.refresh_frequency,
        // Edit mode needs the permission to go with it
        edit_mode: data.edit_mode && dashboard.dash_edit_perm,
        focused_chart: None,
        has_unsaved_changes: false,
        css: dashboard.css.clone(),
        datasource_count: data.datasources.len(),
    };

    tracing::debug!(
        "Initial state: dashboard {} with {} chart(s), {} filter(s)",
        state.info.id,
        state.slice_ids.len(),
        state.filters.len()
    );
    Ok(state)
}

fn parse_default_filters(raw: Option<&str>) -> Result<BTreeMap<String, serde_json::Value>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(BTreeMap::new()),
        Some(raw) => serde_json::from_str(raw).context("default_filters is not a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(extra_metadata: serde_json::Value) -> BootstrapData {
        let value = json!({
            "user_id": 5,
            "editMode": true,
            "datasources": { "3__table": {}, "4__table": {} },
            "dashboard_data": {
                "id": 9,
                "dashboard_title": "Births",
                "dash_edit_perm": true,
                "slices": [
                    { "slice_id": 11, "slice_name": "Girls", "viz_type": "table",
                      "description": "  ", "form_data": { "row_limit": 50 } },
                    { "slice_id": 12, "slice_name": "Boys", "viz_type": "line" },
                    { "slice_id": 11, "slice_name": "Duplicate" }
                ],
                "metadata": extra_metadata
            }
        });
        serde_json::from_value(value).expect("valid payload")
    }

    #[test]
    fn derives_charts_in_payload_order() {
        let state = get_initial_state(&payload(json!({}))).unwrap();

        assert_eq!(state.slice_ids, vec![11, 12]);
        assert_eq!(state.slices[&11].name, "Girls");
        assert_eq!(state.slices[&11].description, None);
        assert_eq!(state.charts[&11].status, ChartStatus::Loading);
        assert_eq!(state.charts[&11].form_data["row_limit"], 50);
        assert_eq!(state.info.user_id.as_deref(), Some("5"));
        assert_eq!(state.datasource_count, 2);
        assert!(state.edit_mode);
        assert_eq!(state.focused_chart, None);
    }

    #[test]
    fn parses_metadata() {
        let state = get_initial_state(&payload(json!({
            "default_filters": "{\"11\": {\"gender\": [\"girl\"]}}",
            "expanded_slices": { "12": true, "11": false, "99": true, "abc": true },
            "filter_immune_slices": [12],
            "refresh_frequency": 30
        })))
        .unwrap();

        assert_eq!(state.filters["11"], json!({ "gender": ["girl"] }));
        assert_eq!(state.expanded_slices, BTreeSet::from([12]));
        assert!(state.filter_immune_slices.contains(&12));
        assert_eq!(state.refresh_frequency, 30);
    }

    #[test]
    fn malformed_default_filters_fail() {
        let err = get_initial_state(&payload(json!({ "default_filters": "{not json" })))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("default_filters"));
    }

    #[test]
    fn blank_default_filters_are_empty() {
        let state = get_initial_state(&payload(json!({ "default_filters": " " }))).unwrap();
        assert!(state.filters.is_empty());
    }

    #[test]
    fn edit_mode_requires_permission() {
        let mut data = payload(json!({}));
        data.dashboard_data.dash_edit_perm = false;

        let state = get_initial_state(&data).unwrap();
        assert!(!state.edit_mode);
        assert!(!state.info.can_edit);
    }
}
