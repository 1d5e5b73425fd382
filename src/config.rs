use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Plugin base URL, requests go to `<api_base>/api/<command>`.
    pub api_base: String,
    pub poll_interval: Duration,
    pub boxes_delay: Duration,
    pub show_boxes: bool,
    pub hide_title: bool,
    /// Zoom levels below / above the current zoom requested for coverage boxes.
    pub boxes_zoom_below: u32,
    pub boxes_zoom_above: u32,
    pub info_toast: Duration,
    pub error_toast: Duration,
    pub initial_center: (f64, f64),
    pub initial_zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: "http://localhost:8080/plugins/mapproxy".to_string(),
            poll_interval: Duration::from_millis(1000),
            boxes_delay: Duration::from_millis(500),
            show_boxes: true,
            hide_title: false,
            boxes_zoom_below: 4,
            boxes_zoom_above: 6,
            info_toast: Duration::from_secs(5),
            error_toast: Duration::from_secs(10),
            initial_center: (54.0, 13.0),
            initial_zoom: 6.0,
        }
    }
}

impl Config {
    /// Build a config from the URL the GUI page was opened with, e.g.
    /// `http://host:8080/plugins/mapproxy/gui/index.html?title=no`.
    pub fn from_page_url(url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (url, None),
        };

        let api_base = match path.find("mapproxy/gui") {
            Some(idx) => format!("{}mapproxy", &path[..idx]),
            None => path.trim_end_matches('/').to_string(),
        };

        let hide_title = query
            .map(|q| q.split('&').any(|kv| kv == "title=no"))
            .unwrap_or(false);

        Config {
            api_base,
            hide_title,
            ..Config::default()
        }
    }
}
