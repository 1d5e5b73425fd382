use crate::config::Config;
use crate::models::boxes::{BoxQuery, CoverageBox, parse_boxes};
use crate::models::geometry::{LatLng, Viewport};
use crate::traits::AdminApi;
use crate::utils::style::{BoxStyle, box_style};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBox {
    pub coverage: CoverageBox,
    pub style: BoxStyle,
}

impl From<CoverageBox> for RenderedBox {
    fn from(coverage: CoverageBox) -> Self {
        let style = box_style(coverage.zoom);
        RenderedBox { coverage, style }
    }
}

/// The most specific box under `point`: highest zoom, first one on ties.
pub fn pick_topmost(boxes: &[RenderedBox], point: LatLng) -> Option<&RenderedBox> {
    let mut topmost: Option<&RenderedBox> = None;
    for candidate in boxes.iter().filter(|b| b.coverage.bounds.contains(point)) {
        match topmost {
            Some(current) if current.coverage.zoom >= candidate.coverage.zoom => {}
            _ => topmost = Some(candidate),
        }
    }
    topmost
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    api: Arc<dyn AdminApi>,
    viewport: watch::Receiver<Viewport>,
    overlay: watch::Sender<Vec<RenderedBox>>,
    generation: AtomicU64,
    show: AtomicBool,
    pending: Mutex<Option<JoinHandle<()>>>,
    delay: Duration,
    zoom_below: u32,
    zoom_above: u32,
}

/// Keeps the coverage box overlay in line with the viewport.
///
/// Every `schedule` restarts the delay timer, only the last one in a quiet
/// window fetches. Each schedule bumps a generation counter and a fetch result
/// is only applied if no newer schedule happened while it was in flight.
#[derive(Clone)]
pub struct BoxRefresher {
    inner: Arc<Inner>,
}

impl BoxRefresher {
    pub fn new(
        api: Arc<dyn AdminApi>,
        viewport: watch::Receiver<Viewport>,
        config: &Config,
    ) -> Self {
        let (overlay, _) = watch::channel(Vec::new());
        BoxRefresher {
            inner: Arc::new(Inner {
                api,
                viewport,
                overlay,
                generation: AtomicU64::new(0),
                show: AtomicBool::new(config.show_boxes),
                pending: Mutex::new(None),
                delay: config.boxes_delay,
                zoom_below: config.boxes_zoom_below,
                zoom_above: config.boxes_zoom_above,
            }),
        }
    }

    pub fn schedule(&self) {
        self.inner.schedule();
    }

    pub fn set_show_boxes(&self, on: bool) {
        let old = self.inner.show.swap(on, Ordering::SeqCst);
        if old != on {
            self.inner.schedule();
        }
    }

    pub fn show_boxes(&self) -> bool {
        self.inner.show.load(Ordering::SeqCst)
    }

    pub fn overlay(&self) -> Vec<RenderedBox> {
        self.inner.overlay.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<RenderedBox>> {
        self.inner.overlay.subscribe()
    }

    /// Drop a pending timer. Fetches already running finish but are ignored.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = lock(&self.inner.pending).take() {
            handle.abort();
        }
    }
}

impl Inner {
    fn schedule(self: &Arc<Self>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.show.load(Ordering::SeqCst) {
            if let Some(handle) = lock(&self.pending).take() {
                handle.abort();
            }
            self.overlay.send_replace(Vec::new());
            return;
        }

        let this = Arc::clone(self);
        let mut pending = lock(&self.pending);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(this.delay).await;
            this.fire(generation);
        }));
    }

    fn fire(self: &Arc<Self>, generation: u64) {
        let viewport = *self.viewport.borrow();
        if !viewport.has_valid_zoom() {
            warn!("no coverage boxes for zoom {}", viewport.zoom);
            lock(&self.pending).take();
            return;
        }
        let Some(zoom) = viewport.settled_zoom() else {
            debug!("zoom {} not settled, rescheduling boxes", viewport.zoom);
            // this timer is done, forget it instead of aborting ourselves
            lock(&self.pending).take();
            self.schedule();
            return;
        };

        let query = BoxQuery::around(viewport.bounds, zoom, self.zoom_below, self.zoom_above);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.api.get_boxes(&query).await {
                Ok(body) => {
                    if this.generation.load(Ordering::SeqCst) != generation {
                        debug!("dropping boxes of generation {}", generation);
                        return;
                    }
                    let boxes: Vec<RenderedBox> =
                        parse_boxes(&body).into_iter().map(RenderedBox::from).collect();
                    debug!("{} coverage boxes for zoom {}", boxes.len(), zoom);
                    this.overlay.send_replace(boxes);
                }
                Err(e) => warn!("unable to fetch coverage boxes: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::Rectangle;
    use crate::traits::mock::MockApi;

    fn viewport(n: f64, zoom: f64) -> Viewport {
        Viewport {
            bounds: Rectangle::from((n + 1.0, n + 1.0, n, n)),
            zoom,
        }
    }

    fn refresher(api: &Arc<MockApi>, start: Viewport) -> (BoxRefresher, watch::Sender<Viewport>) {
        let (tx, rx) = watch::channel(start);
        (BoxRefresher::new(api.clone(), rx, &Config::default()), tx)
    }

    fn rendered(name: &str, zoom: u32, bounds: (f64, f64, f64, f64)) -> RenderedBox {
        RenderedBox::from(CoverageBox {
            name: name.to_string(),
            zoom,
            bounds: Rectangle::from(bounds),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_moves_fetches_once() {
        let api = Arc::new(MockApi::default());
        let (boxes, moves) = refresher(&api, viewport(0.0, 8.0));

        for (n, zoom) in [(1.0, 8.0), (2.0, 9.0), (3.0, 10.0)] {
            moves.send_replace(viewport(n, zoom));
            boxes.schedule();
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(api.count_calls("getBoxes"), 1);
        let queries = api.box_queries.lock().unwrap().clone();
        assert_eq!(queries[0].bounds, viewport(3.0, 10.0).bounds);
        assert_eq!((queries[0].min_zoom, queries[0].max_zoom), (6, 16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_answer_is_ignored() {
        let api = Arc::new(MockApi::default());
        api.box_answers.lock().unwrap().extend([
            (Duration::from_millis(2000), "OLD 5 10 10 9 9".to_string()),
            (Duration::ZERO, "NEW 6 10 10 9 9".to_string()),
        ]);
        let (boxes, _moves) = refresher(&api, viewport(9.0, 6.0));

        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.count_calls("getBoxes"), 1);

        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(boxes.overlay()[0].coverage.name, "NEW");

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let overlay = boxes.overlay();
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay[0].coverage.name, "NEW");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractional_zoom_waits() {
        let api = Arc::new(MockApi::default());
        let (boxes, moves) = refresher(&api, viewport(0.0, 6.5));

        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.count_calls("getBoxes"), 0);

        moves.send_replace(viewport(0.0, 7.0));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.count_calls("getBoxes"), 1);
        let query = api.box_queries.lock().unwrap()[0];
        assert_eq!((query.min_zoom, query.max_zoom), (3, 13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_zoom_stops_refreshing() {
        let api = Arc::new(MockApi::default());
        let (boxes, moves) = refresher(&api, viewport(0.0, f64::NAN));

        boxes.schedule();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.count_calls("getBoxes"), 0);
        assert!(lock(&boxes.inner.pending).is_none());

        moves.send_replace(viewport(0.0, 8.0));
        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.count_calls("getBoxes"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_boxes_clear_overlay() {
        let api = Arc::new(MockApi::default());
        api.box_answers
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, "A 3 10 20 9 19".to_string()));
        let (boxes, _moves) = refresher(&api, viewport(9.0, 5.0));

        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(boxes.overlay().len(), 1);

        boxes.set_show_boxes(false);
        assert!(boxes.overlay().is_empty());
        boxes.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.count_calls("getBoxes"), 1);
        assert!(!boxes.show_boxes());
    }

    #[test]
    fn test_pick_topmost() {
        let boxes = vec![
            rendered("world", 3, (80.0, 170.0, -80.0, -170.0)),
            rendered("coast", 12, (55.0, 14.0, 53.0, 12.0)),
            rendered("harbour", 16, (54.2, 12.2, 54.0, 12.0)),
            rendered("harbour2", 16, (54.3, 12.3, 54.0, 12.0)),
        ];
        let hit = pick_topmost(&boxes, LatLng::new(54.1, 12.1)).unwrap();
        assert_eq!(hit.coverage.name, "harbour");

        let hit = pick_topmost(&boxes, LatLng::new(54.5, 13.0)).unwrap();
        assert_eq!(hit.coverage.name, "coast");

        assert!(pick_topmost(&boxes, LatLng::new(89.0, 0.0)).is_none());
    }
}
