/// Items added to the visible window per growth step, and its initial size.
pub const PAGE_SIZE: usize = 24;
/// Distance from the bottom, in pixels, at which the window grows.
pub const SCROLL_THRESHOLD_PX: f64 = 200.0;

/// Scroll position of the product list container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Metrics for a container scrolled all the way down.
    pub fn at_bottom(scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_height,
            scroll_top: (scroll_height - client_height).max(0.0),
            client_height,
        }
    }

    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + threshold
    }
}

/// Infinite-scroll window over a filtered list.
///
/// `display_count` never shrinks except through [`VisibleWindow::reset`],
/// which callers invoke whenever the filtered list's identity changes.
#[derive(Debug, Clone)]
pub struct VisibleWindow {
    display_count: usize,
    page_size: usize,
    threshold: f64,
}

impl Default for VisibleWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibleWindow {
    pub fn new() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            display_count: page_size,
            page_size,
            threshold: SCROLL_THRESHOLD_PX,
        }
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn reset(&mut self) {
        self.display_count = self.page_size;
    }

    /// Grow by one page when the container is near the bottom and more items
    /// exist. Returns whether the window grew.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, filtered_len: usize) -> bool {
        if !metrics.near_bottom(self.threshold) || !self.has_more(filtered_len) {
            return false;
        }
        self.display_count += self.page_size;
        true
    }

    pub fn has_more(&self, filtered_len: usize) -> bool {
        self.display_count < filtered_len
    }
}
