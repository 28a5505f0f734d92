// Demo mode - a bundled host page for trying the dashboard without a server
//
// The page mirrors what the server renders: an `app` element carrying the
// bootstrap payload in its `data-bootstrap` attribute.

/// Host page used by `--demo`
pub const DEMO_PAGE: &str = r##"<!DOCTYPE html>
<html>
  <head>
    <title>World's Bank Data</title>
  </head>
  <body>
    <div id="app" data-bootstrap='{
      "user_id": 1,
      "editMode": false,
      "common": { "locale": "en", "feature_flags": {} },
      "datasources": {
        "2__table": { "name": "wb_health_population", "type": "table" },
        "3__table": { "name": "birth_names", "type": "table" }
      },
      "dashboard_data": {
        "id": 1,
        "dashboard_title": "World Bank Data",
        "dash_edit_perm": true,
        "dash_save_perm": true,
        "css": "",
        "metadata": {
          "default_filters": "{\"12\": {\"region\": [\"South Asia\"]}}",
          "expanded_slices": { "13": true },
          "filter_immune_slices": [15],
          "timed_refresh_immune_slices": [],
          "refresh_frequency": 0
        },
        "slices": [
          {
            "slice_id": 12,
            "slice_name": "Region Filter",
            "viz_type": "filter_box",
            "datasource": "2__table",
            "form_data": { "row_limit": 100 }
          },
          {
            "slice_id": 13,
            "slice_name": "World Population",
            "viz_type": "big_number",
            "datasource": "2__table",
            "description": "Total population across all countries, by year.",
            "form_data": { "row_limit": 57 }
          },
          {
            "slice_id": 14,
            "slice_name": "Most Populated Countries",
            "viz_type": "table",
            "datasource": "2__table",
            "form_data": { "row_limit": 25 }
          },
          {
            "slice_id": 15,
            "slice_name": "Growth Rate",
            "viz_type": "line",
            "datasource": "2__table",
            "description": "Annual population growth rate per region.",
            "form_data": {}
          },
          {
            "slice_id": 16,
            "slice_name": "Life Expectancy VS Rural %",
            "viz_type": "bubble",
            "datasource": "2__table",
            "form_data": { "row_limit": 500 }
          },
          {
            "slice_id": 17,
            "slice_name": "Baby Names",
            "viz_type": "word_cloud",
            "datasource": "3__table",
            "form_data": { "row_limit": 100 }
          }
        ]
      }
    }'></div>
  </body>
</html>
"##;
