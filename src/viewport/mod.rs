use std::collections::HashMap;
use std::sync::Mutex;

pub const HEADER_ELEMENT: &str = "sidetotal";
pub const CONTAINER_ELEMENT: &str = "container";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
    /// Full content height, including what is scrolled out of view.
    pub scroll_height: f64,
}

/// Layout measurements the screen reads on every scroll tick.
pub trait ViewportMetrics: Send + Sync {
    fn current_scroll(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn document_height(&self) -> f64;
    fn element_rect(&self, id: &str) -> Option<ElementRect>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollThresholds {
    pub near_bottom_px: f64,
    pub back_to_top_px: f64,
}

impl Default for ScrollThresholds {
    fn default() -> Self {
        Self {
            near_bottom_px: 150.0,
            back_to_top_px: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollFlags {
    pub near_bottom: bool,
    pub show_back_to_top: bool,
    pub sticky_header: bool,
}

impl Default for ScrollFlags {
    fn default() -> Self {
        // Until the first scroll tick the user is treated as being at the bottom.
        Self {
            near_bottom: true,
            show_back_to_top: false,
            sticky_header: false,
        }
    }
}

impl ScrollFlags {
    pub fn measure(
        metrics: &dyn ViewportMetrics,
        thresholds: &ScrollThresholds,
        header_offset: f64,
    ) -> Self {
        let scroll = metrics.current_scroll();
        let viewport_height = metrics.viewport_height();
        let container_height = metrics
            .element_rect(CONTAINER_ELEMENT)
            .map(|rect| rect.height)
            .unwrap_or(0.0);

        Self {
            near_bottom: is_near_bottom(
                scroll,
                viewport_height,
                metrics.document_height(),
                thresholds.near_bottom_px,
            ),
            show_back_to_top: container_height > viewport_height
                && scroll > thresholds.back_to_top_px,
            sticky_header: scroll >= header_offset,
        }
    }
}

pub fn is_near_bottom(scroll: f64, viewport_height: f64, document_height: f64, threshold: f64) -> bool {
    scroll + viewport_height > document_height - threshold
}

/// Viewport with fixed measurements, adjustable between ticks.
#[derive(Debug, Default)]
pub struct StaticViewport {
    state: Mutex<StaticLayout>,
}

#[derive(Debug, Default, Clone)]
struct StaticLayout {
    scroll: f64,
    viewport_height: f64,
    document_height: f64,
    elements: HashMap<String, ElementRect>,
}

impl StaticViewport {
    pub fn new(viewport_height: f64, document_height: f64) -> Self {
        Self {
            state: Mutex::new(StaticLayout {
                viewport_height,
                document_height,
                ..Default::default()
            }),
        }
    }

    pub fn with_element(self, id: &str, rect: ElementRect) -> Self {
        self.set_element(id, rect);
        self
    }

    pub fn scroll_to(&self, scroll: f64) {
        self.layout().scroll = scroll;
    }

    pub fn set_document_height(&self, height: f64) {
        self.layout().document_height = height;
    }

    pub fn set_element(&self, id: &str, rect: ElementRect) {
        self.layout().elements.insert(id.to_string(), rect);
    }

    fn layout(&self) -> std::sync::MutexGuard<'_, StaticLayout> {
        // A poisoned lock still holds plain numbers, so keep using them.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ViewportMetrics for StaticViewport {
    fn current_scroll(&self) -> f64 {
        self.layout().scroll
    }

    fn viewport_height(&self) -> f64 {
        self.layout().viewport_height
    }

    fn document_height(&self) -> f64 {
        self.layout().document_height
    }

    fn element_rect(&self, id: &str) -> Option<ElementRect> {
        self.layout().elements.get(id).copied()
    }
}
