//! Root reducer for the dashboard state

use super::actions::Action;
use super::state::{ChartStatus, DashboardState};

pub fn root_reducer(state: &mut DashboardState, action: &Action) {
    match action {
        Action::ChartFocusChanged { slice_id, focused } => {
            if *focused {
                state.focused_chart = Some(*slice_id);
            } else if state.focused_chart == Some(*slice_id) {
                // Another chart may already have taken focus in the same click
                state.focused_chart = None;
            }
        }
        Action::ToggleExpandSlice(id) => {
            if !state.slices.contains_key(id) {
                return;
            }
            if !state.expanded_slices.remove(id) {
                state.expanded_slices.insert(*id);
            }
        }
        Action::RefreshChart(id) => {
            if let Some(chart) = state.charts.get_mut(id) {
                chart.status = ChartStatus::Loading;
            }
        }
        Action::ChartRefreshed { slice_id, rows, at } => {
            // The chart may have been removed while its query was running
            if let Some(chart) = state.charts.get_mut(slice_id) {
                chart.status = ChartStatus::Rendered;
                chart.rows = Some(*rows);
                chart.refreshed_at = Some(*at);
            }
        }
        Action::RemoveSlice(id) => {
            if !state.edit_mode {
                tracing::warn!("Ignoring removal of chart {} outside edit mode", id);
                return;
            }
            if state.slices.remove(id).is_none() {
                return;
            }
            state.slice_ids.retain(|s| s != id);
            state.charts.remove(id);
            state.expanded_slices.remove(id);
            if state.focused_chart == Some(*id) {
                state.focused_chart = None;
            }
            state.has_unsaved_changes = true;
        }
        Action::SetEditMode(on) => {
            state.edit_mode = *on && state.info.can_edit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::state::{get_initial_state, BootstrapData};
    use chrono::Utc;
    use serde_json::json;

    fn state(edit_perm: bool) -> DashboardState {
        let data: BootstrapData = serde_json::from_value(json!({
            "dashboard_data": {
                "id": 1,
                "dashboard_title": "Sales",
                "dash_edit_perm": edit_perm,
                "slices": [
                    { "slice_id": 1, "slice_name": "Revenue" },
                    { "slice_id": 2, "slice_name": "Orders" }
                ]
            }
        }))
        .unwrap();
        get_initial_state(&data).unwrap()
    }

    #[test]
    fn focus_follows_latest_gain() {
        let mut s = state(false);

        root_reducer(&mut s, &Action::ChartFocusChanged { slice_id: 1, focused: true });
        assert_eq!(s.focused_chart, Some(1));

        // Chart 2 gains focus before chart 1 reports the loss
        root_reducer(&mut s, &Action::ChartFocusChanged { slice_id: 2, focused: true });
        root_reducer(&mut s, &Action::ChartFocusChanged { slice_id: 1, focused: false });
        assert_eq!(s.focused_chart, Some(2));

        root_reducer(&mut s, &Action::ChartFocusChanged { slice_id: 2, focused: false });
        assert_eq!(s.focused_chart, None);
    }

    #[test]
    fn toggle_expand_flips_known_slices_only() {
        let mut s = state(false);

        root_reducer(&mut s, &Action::ToggleExpandSlice(1));
        assert!(s.is_expanded(1));
        root_reducer(&mut s, &Action::ToggleExpandSlice(1));
        assert!(!s.is_expanded(1));

        root_reducer(&mut s, &Action::ToggleExpandSlice(42));
        assert!(s.expanded_slices.is_empty());
    }

    #[test]
    fn refresh_cycle_updates_chart() {
        let mut s = state(false);
        let at = Utc::now();

        root_reducer(&mut s, &Action::ChartRefreshed { slice_id: 1, rows: 12, at });
        assert_eq!(s.charts[&1].status, ChartStatus::Rendered);
        assert_eq!(s.charts[&1].rows, Some(12));

        root_reducer(&mut s, &Action::RefreshChart(1));
        assert_eq!(s.charts[&1].status, ChartStatus::Loading);
        // Previous result stays visible while loading
        assert_eq!(s.charts[&1].rows, Some(12));
    }

    #[test]
    fn remove_requires_edit_mode() {
        let mut s = state(true);
        root_reducer(&mut s, &Action::RemoveSlice(1));
        assert_eq!(s.slice_ids, vec![1, 2]);

        root_reducer(&mut s, &Action::SetEditMode(true));
        root_reducer(&mut s, &Action::ChartFocusChanged { slice_id: 1, focused: true });
        root_reducer(&mut s, &Action::RemoveSlice(1));

        assert_eq!(s.slice_ids, vec![2]);
        assert!(!s.charts.contains_key(&1));
        assert_eq!(s.focused_chart, None);
        assert!(s.has_unsaved_changes);
    }

    #[test]
    fn late_refresh_for_removed_chart_is_ignored() {
        let mut s = state(true);
        root_reducer(&mut s, &Action::SetEditMode(true));
        root_reducer(&mut s, &Action::RemoveSlice(2));

        root_reducer(&mut s, &Action::ChartRefreshed { slice_id: 2, rows: 1, at: Utc::now() });
        assert!(!s.charts.contains_key(&2));
    }

    #[test]
    fn edit_mode_needs_permission() {
        let mut s = state(false);
        root_reducer(&mut s, &Action::SetEditMode(true));
        assert!(!s.edit_mode);
    }
}
