// Dashboard module - the application state behind the TUI
//
// - state: bootstrap payload types and initial state derivation
// - actions: the actions the dashboard understands, plus async action creators
// - reducer: how actions change state

pub mod actions;
pub mod reducer;
pub mod state;

pub use actions::Action;
pub use reducer::root_reducer;
pub use state::{get_initial_state, BootstrapData, DashboardState};

use crate::store::Store;

/// The store type the whole application shares
pub type DashboardStore = Store<DashboardState, Action>;

#[cfg(test)]
mod tests {
    use super::actions::{refresh_all, refresh_chart_with_latency};
    use super::state::ChartStatus;
    use super::*;
    use crate::store::{apply_middleware, create_store, thunk, Middleware};
    use serde_json::json;
    use std::rc::Rc;
    use std::time::Duration;

    fn store() -> (DashboardStore, crate::store::TaskReceiver<Action>) {
        let data: BootstrapData = serde_json::from_value(json!({
            "dashboard_data": {
                "id": 3,
                "dashboard_title": "Ops",
                "slices": [
                    { "slice_id": 7, "slice_name": "Latency", "form_data": { "row_limit": 25 } },
                    { "slice_id": 8, "slice_name": "Errors" }
                ]
            }
        }))
        .unwrap();
        let (middleware, tasks) = thunk::<Action>();
        let store = create_store(
            root_reducer,
            get_initial_state(&data).unwrap(),
            Some(apply_middleware(vec![
                Rc::new(middleware) as Rc<dyn Middleware<DashboardState, Action>>
            ])),
        );
        (store, tasks)
    }

    #[tokio::test]
    async fn refresh_chart_reports_row_limit() {
        let (store, mut tasks) = store();

        store.dispatch_thunk(refresh_chart_with_latency(7, Duration::from_millis(1)));
        assert_eq!(store.state().charts[&7].status, ChartStatus::Loading);

        let done = tasks.recv().await.expect("refresh result");
        store.dispatch(done);

        let state = store.state();
        assert_eq!(state.charts[&7].status, ChartStatus::Rendered);
        assert_eq!(state.charts[&7].rows, Some(25));
        assert!(state.charts[&7].refreshed_at.is_some());
    }

    #[tokio::test]
    async fn refresh_all_spawns_one_task_per_chart() {
        let (store, mut tasks) = store();

        store.dispatch_thunk(refresh_all());

        let mut finished = Vec::new();
        for _ in 0..2 {
            match tasks.recv().await {
                Some(Action::ChartRefreshed { slice_id, rows, .. }) => finished.push((slice_id, rows)),
                other => panic!("unexpected task result {:?}", other),
            }
        }
        finished.sort();
        assert_eq!(finished, vec![(7, 25), (8, 10_000)]);
    }
}
