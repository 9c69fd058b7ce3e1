use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    gateway::{CatalogGateway, GatewayError, NotificationKind, NotificationSink},
    models::{CartError, CartModel, LineEntry, Product, SaleError, SaleRecord},
    viewport::{ScrollFlags, ScrollThresholds, ViewportMetrics, CONTAINER_ELEMENT, HEADER_ELEMENT},
};

pub const SOLD_MESSAGE: &str = "Sold";

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart has lines with zero quantity")]
    InvalidCart,

    #[error("A sale is already being submitted")]
    SubmissionInFlight,

    #[error("Cart error: {0}")]
    CartError(#[from] CartError),

    #[error("Sale error: {0}")]
    SaleError(#[from] SaleError),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
}

/// Inputs to the screen, produced by line widgets, the window and the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    LineUpserted(LineEntry),
    LineDeleted(usize),
    LineWidgetsChanged,
    Scrolled,
    AddSlot,
    Sell,
    ScrollTop,
    RefreshCatalog,
}

/// Instructions for whatever renders the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderSignal {
    ProductsReplaced(usize),
    TotalsChanged { grand_total: Decimal, invalid: bool },
    SlotsChanged(Vec<u32>),
    FlagsChanged(ScrollFlags),
    ScrollTo { top: f64, smooth: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Editing,
    Submitting,
}

/// Holds the screen in `Submitting` and puts it back to `Editing` when
/// dropped, including when the sell future is cancelled mid-request.
struct SubmittingGuard<'a> {
    state: &'a mut ScreenState,
}

impl<'a> SubmittingGuard<'a> {
    fn enter(state: &'a mut ScreenState) -> Self {
        *state = ScreenState::Submitting;
        Self { state }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        *self.state = ScreenState::Editing;
    }
}

pub struct SalesScreen {
    cart: CartModel,
    products: Vec<Product>,
    state: ScreenState,
    flags: ScrollFlags,
    thresholds: ScrollThresholds,
    header_offset: f64,
    opened_at: Option<DateTime<Local>>,
    gateway: Arc<dyn CatalogGateway>,
    notifier: Arc<dyn NotificationSink>,
    viewport: Arc<dyn ViewportMetrics>,
    render_tx: Option<mpsc::UnboundedSender<RenderSignal>>,
}

impl SalesScreen {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        notifier: Arc<dyn NotificationSink>,
        viewport: Arc<dyn ViewportMetrics>,
        thresholds: ScrollThresholds,
    ) -> Self {
        Self {
            cart: CartModel::new(),
            products: Vec::new(),
            state: ScreenState::Editing,
            flags: ScrollFlags::default(),
            thresholds,
            header_offset: 0.0,
            opened_at: None,
            gateway,
            notifier,
            viewport,
            render_tx: None,
        }
    }

    /// Open the render signal stream. Only the latest receiver gets signals.
    pub fn render_signals(&mut self) -> mpsc::UnboundedReceiver<RenderSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.render_tx = Some(tx);
        rx
    }

    /// Capture the open time and header position, then load the catalog.
    pub async fn initialize(&mut self) {
        self.opened_at = Some(Local::now());
        self.header_offset = self
            .viewport
            .element_rect(HEADER_ELEMENT)
            .map(|rect| rect.top)
            .unwrap_or(0.0);

        info!(
            "Sales screen opened, sticky header offset {}px",
            self.header_offset
        );
        self.emit(RenderSignal::SlotsChanged(self.cart.slots().to_vec()));

        if let Err(e) = self.refresh_catalog().await {
            debug!("Catalog unavailable at startup: {}", e);
        }
    }

    /// Consume events until every sender is gone, then hand the screen back.
    pub async fn run(mut self, mut events: mpsc::Receiver<ScreenEvent>) -> Self {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("Screen event channel closed");
        self
    }

    pub async fn handle_event(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::LineUpserted(entry) => self.upsert_line(entry),
            ScreenEvent::LineDeleted(position) => {
                if let Err(e) = self.delete_line(position) {
                    error!("Failed to delete line: {}", e);
                    self.notifier.notify(NotificationKind::Error, &e.to_string());
                }
            }
            ScreenEvent::LineWidgetsChanged => self.on_line_widgets_changed(),
            ScreenEvent::Scrolled => self.on_scroll(),
            ScreenEvent::AddSlot => {
                self.add_slot();
            }
            ScreenEvent::Sell => {
                if let Err(e) = self.sell().await {
                    warn!("Sale not completed: {}", e);
                }
            }
            ScreenEvent::ScrollTop => self.scroll_top(),
            ScreenEvent::RefreshCatalog => {
                let _ = self.refresh_catalog().await;
            }
        }
    }

    pub async fn refresh_catalog(&mut self) -> Result<usize, GatewayError> {
        match self.gateway.fetch_all().await {
            Ok(products) => {
                let count = products.len();
                self.products = products;
                debug!("Catalog refreshed with {} products", count);
                self.emit(RenderSignal::ProductsReplaced(count));
                Ok(count)
            }
            Err(e) => {
                error!("Failed to fetch catalog: {}", e);
                self.notifier.notify(NotificationKind::Error, e.message());
                Err(e)
            }
        }
    }

    pub fn upsert_line(&mut self, entry: LineEntry) {
        debug!(
            "Line {} set to {} x {} ({})",
            entry.index, entry.product.quantity, entry.product.name, entry.total
        );
        self.cart.upsert(entry);
        self.emit_totals();
    }

    pub fn delete_line(&mut self, position: usize) -> Result<Option<LineEntry>, ScreenError> {
        let removed = self.cart.delete_at(position)?;
        info!("Removed cart slot at position {}", position);
        self.emit(RenderSignal::SlotsChanged(self.cart.slots().to_vec()));
        self.emit_totals();
        Ok(removed)
    }

    /// Open a new empty slot for the next product.
    pub fn add_slot(&mut self) -> u32 {
        let slot = self.cart.open_slot();
        debug!("Opened cart slot {}", slot);
        self.emit(RenderSignal::SlotsChanged(self.cart.slots().to_vec()));
        slot
    }

    /// Submit the cart. Nothing reaches the gateway unless the cart is
    /// non-empty, valid and no other submission is pending.
    pub async fn sell(&mut self) -> Result<(), ScreenError> {
        if self.state == ScreenState::Submitting {
            warn!("Sell requested while a submission is pending");
            return Err(ScreenError::SubmissionInFlight);
        }
        if self.cart.is_empty() {
            warn!("Sell requested on an empty cart");
            return Err(ScreenError::EmptyCart);
        }
        if self.cart.is_invalid() {
            warn!("Sell requested with zero quantity lines");
            return Err(ScreenError::InvalidCart);
        }

        let record = SaleRecord::from_cart(&self.cart)?;
        info!(
            "Submitting sale: {} lines, total {}",
            record.details.len(),
            record.total
        );

        let result = {
            let _submitting = SubmittingGuard::enter(&mut self.state);
            self.gateway.submit_sale(&record).await
        };

        match result {
            Ok(()) => {
                self.cart.reset();
                info!("Sale completed for {}", record.total);
                self.notifier.notify(NotificationKind::Success, SOLD_MESSAGE);
                self.emit(RenderSignal::SlotsChanged(self.cart.slots().to_vec()));
                self.emit_totals();
                let _ = self.refresh_catalog().await;
                Ok(())
            }
            Err(e) => {
                error!("Failed to submit sale: {}", e);
                self.notifier.notify(NotificationKind::Error, e.message());
                Err(ScreenError::GatewayError(e))
            }
        }
    }

    pub fn on_scroll(&mut self) {
        let flags = ScrollFlags::measure(self.viewport.as_ref(), &self.thresholds, self.header_offset);
        if flags != self.flags {
            self.flags = flags;
            self.emit(RenderSignal::FlagsChanged(flags));
        }
    }

    /// Follow the newest line, but only if the user was already at the bottom.
    pub fn on_line_widgets_changed(&mut self) {
        if !self.flags.near_bottom {
            debug!("User scrolled away from the bottom, not following new line");
            return;
        }

        let top = self
            .viewport
            .element_rect(CONTAINER_ELEMENT)
            .map(|rect| rect.scroll_height)
            .unwrap_or_else(|| self.viewport.document_height());
        self.emit(RenderSignal::ScrollTo { top, smooth: true });
    }

    pub fn scroll_top(&mut self) {
        self.emit(RenderSignal::ScrollTo {
            top: 0.0,
            smooth: true,
        });
    }

    pub fn cart(&self) -> &CartModel {
        &self.cart
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn flags(&self) -> ScrollFlags {
        self.flags
    }

    pub fn header_offset(&self) -> f64 {
        self.header_offset
    }

    pub fn opened_at(&self) -> Option<DateTime<Local>> {
        self.opened_at
    }

    fn emit_totals(&self) {
        self.emit(RenderSignal::TotalsChanged {
            grand_total: self.cart.grand_total(),
            invalid: self.cart.is_invalid(),
        });
    }

    fn emit(&self, signal: RenderSignal) {
        if let Some(tx) = &self.render_tx {
            if tx.send(signal).is_err() {
                debug!("Render signal dropped, no receiver");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineProduct;
    use crate::viewport::{ElementRect, StaticViewport};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    // Gateway that always fails; counts calls
    #[derive(Default)]
    struct DownGateway {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl CatalogGateway for DownGateway {
        async fn fetch_all(&self) -> Result<Vec<Product>, GatewayError> {
            *self.calls.lock().unwrap() += 1;
            Err(GatewayError::CatalogFetch {
                message: "Http failure response: 0 Unknown Error".to_string(),
            })
        }

        async fn submit_sale(&self, _record: &SaleRecord) -> Result<(), GatewayError> {
            *self.calls.lock().unwrap() += 1;
            Err(GatewayError::SaleSubmit {
                message: "down".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct Silent;

    impl NotificationSink for Silent {
        fn notify(&self, _kind: NotificationKind, _message: &str) {}
    }

    fn screen(viewport: Arc<StaticViewport>) -> (SalesScreen, Arc<DownGateway>) {
        let gateway = Arc::new(DownGateway::default());
        let screen = SalesScreen::new(
            gateway.clone(),
            Arc::new(Silent),
            viewport,
            ScrollThresholds::default(),
        );
        (screen, gateway)
    }

    fn line(index: usize, quantity: u32) -> LineEntry {
        LineEntry {
            index,
            product: LineProduct {
                id: "p".to_string(),
                name: "Pen".to_string(),
                unit_price: dec!(1),
                quantity,
            },
            discount: None,
            total: Decimal::from(quantity),
        }
    }

    #[tokio::test]
    async fn test_initialize_measures_header() {
        let viewport = Arc::new(StaticViewport::new(800.0, 2000.0).with_element(
            HEADER_ELEMENT,
            ElementRect {
                top: 240.0,
                height: 60.0,
                scroll_height: 60.0,
            },
        ));
        let (mut screen, _) = screen(viewport);

        screen.initialize().await;
        assert_eq!(screen.header_offset(), 240.0);
        assert!(screen.opened_at().is_some());
        assert!(screen.products().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_cart_never_reaches_gateway() {
        let (mut screen, gateway) = screen(Arc::new(StaticViewport::new(800.0, 2000.0)));
        screen.upsert_line(line(0, 0));

        let result = screen.sell().await;
        assert!(matches!(result, Err(ScreenError::InvalidCart)));
        assert_eq!(*gateway.calls.lock().unwrap(), 0);
        assert_eq!(screen.state(), ScreenState::Editing);
    }

    #[tokio::test]
    async fn test_failed_sale_returns_to_editing() {
        let (mut screen, _) = screen(Arc::new(StaticViewport::new(800.0, 2000.0)));
        screen.upsert_line(line(0, 2));

        let result = screen.sell().await;
        assert!(matches!(result, Err(ScreenError::GatewayError(_))));
        assert_eq!(screen.state(), ScreenState::Editing);
        assert_eq!(screen.cart().grand_total(), dec!(2));
    }

    #[tokio::test]
    async fn test_pending_submission_blocks_second_sell() {
        let (mut screen, gateway) = screen(Arc::new(StaticViewport::new(800.0, 2000.0)));
        screen.upsert_line(line(0, 1));
        screen.state = ScreenState::Submitting;

        let result = screen.sell().await;
        assert!(matches!(result, Err(ScreenError::SubmissionInFlight)));
        assert_eq!(*gateway.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_submitting_guard_restores_editing() {
        let mut state = ScreenState::Editing;
        {
            let guard = SubmittingGuard::enter(&mut state);
            assert_eq!(*guard.state, ScreenState::Submitting);
        }
        assert_eq!(state, ScreenState::Editing);
    }

    #[tokio::test]
    async fn test_flags_emitted_only_on_change() {
        let viewport = Arc::new(StaticViewport::new(800.0, 2000.0));
        let (mut screen, _) = screen(viewport.clone());
        let mut signals = screen.render_signals();

        viewport.scroll_to(1060.0);
        screen.on_scroll();
        viewport.scroll_to(1100.0);
        screen.on_scroll();

        // near bottom was already true, only sticky header flips at offset 0
        assert_eq!(
            signals.try_recv().unwrap(),
            RenderSignal::FlagsChanged(ScrollFlags {
                near_bottom: true,
                show_back_to_top: false,
                sticky_header: true,
            })
        );
        assert!(signals.try_recv().is_err());
    }
}
