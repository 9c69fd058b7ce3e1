use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Confirm};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    cli::args::*,
    gateway::{CatalogGateway, ConsoleNotifier, HttpCatalogGateway, NotificationSink},
    models::LineEntry,
    services::{RenderSignal, SalesScreen, ScreenEvent},
    utils::{
        formatting::{format_cart_table, format_catalog_table, format_date, format_grand_total},
        Config,
    },
    viewport::{ElementRect, ScrollFlags, StaticViewport, CONTAINER_ELEMENT},
};

static WARNING: Emoji<'_, '_> = Emoji("⚠️ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static CART: Emoji<'_, '_> = Emoji("🛒 ", "");

// The terminal has no page layout; only the viewport height is meaningful.
const TERMINAL_VIEWPORT_HEIGHT: f64 = 800.0;

lazy_static! {
    static ref LINE_SPEC: Regex =
        Regex::new(r"^(?P<id>[^:\s]+):(?P<qty>\d+)(?::(?P<discount>\d+(?:\.\d+)?))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub product_id: String,
    pub quantity: u32,
    pub discount: Option<Decimal>,
}

pub fn parse_line_spec(raw: &str) -> Result<LineSpec> {
    let caps = LINE_SPEC
        .captures(raw.trim())
        .with_context(|| format!("Invalid line '{}'. Use ID:QTY or ID:QTY:DISCOUNT", raw))?;

    let quantity = caps["qty"]
        .parse::<u32>()
        .with_context(|| format!("Invalid quantity in '{}'", raw))?;
    let discount = caps
        .name("discount")
        .map(|m| Decimal::from_str(m.as_str()))
        .transpose()
        .with_context(|| format!("Invalid discount in '{}'", raw))?;

    Ok(LineSpec {
        product_id: caps["id"].to_string(),
        quantity,
        discount,
    })
}

pub struct CliApp {
    config: Config,
    gateway: Arc<dyn CatalogGateway>,
    notifier: Arc<dyn NotificationSink>,
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let gateway = HttpCatalogGateway::new(config.catalog_api_url.clone(), config.request_timeout)
            .context("Failed to initialize catalog gateway")?;

        Ok(Self::with_collaborators(
            config,
            Arc::new(gateway),
            Arc::new(ConsoleNotifier),
        ))
    }

    pub fn with_collaborators(
        config: Config,
        gateway: Arc<dyn CatalogGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            gateway,
            notifier,
        }
    }

    pub async fn run(&self, args: Args) -> Result<()> {
        match args.command {
            Commands::Catalog => self.handle_catalog().await,
            Commands::Sell { lines, yes } => self.handle_sell(lines, yes).await,
            Commands::Scroll {
                document_height,
                viewport_height,
                offset,
                container_height,
                header_offset,
            } => self.handle_scroll(
                document_height,
                viewport_height,
                offset,
                container_height,
                header_offset,
            ),
        }
    }

    async fn handle_catalog(&self) -> Result<()> {
        let mut screen = self.screen(Arc::new(StaticViewport::new(TERMINAL_VIEWPORT_HEIGHT, 0.0)));
        screen.initialize().await;

        if screen.products().is_empty() {
            println!("{} No products found", INFO);
        } else {
            println!(
                "{} {}",
                INFO,
                style(format!("{} products", screen.products().len())).bold()
            );
            println!("{}", format_catalog_table(screen.products()));
        }
        Ok(())
    }

    async fn handle_sell(&self, lines: Vec<String>, yes: bool) -> Result<()> {
        let specs = lines
            .iter()
            .map(|raw| parse_line_spec(raw))
            .collect::<Result<Vec<_>>>()?;

        let mut screen = self.screen(Arc::new(StaticViewport::new(TERMINAL_VIEWPORT_HEIGHT, 0.0)));
        screen.initialize().await;
        if screen.products().is_empty() {
            println!("{} No products available, nothing to sell", WARNING);
            return Ok(());
        }

        if let Some(opened_at) = screen.opened_at() {
            println!("{} {} {}", CART, style("New sale").bold().cyan(), style(format_date(&opened_at)).dim());
        }

        let mut events = Vec::new();
        for (position, spec) in specs.iter().enumerate() {
            let product = screen
                .find_product(&spec.product_id)
                .with_context(|| format!("Unknown product id '{}'", spec.product_id))?;

            if spec.quantity > product.quantity {
                println!(
                    "{} Only {} of '{}' in stock",
                    WARNING,
                    product.quantity,
                    style(&product.name).yellow()
                );
            }

            if position > 0 {
                events.push(ScreenEvent::AddSlot);
                events.push(ScreenEvent::LineWidgetsChanged);
            }
            events.push(ScreenEvent::LineUpserted(LineEntry::from_product(
                position,
                product,
                spec.quantity,
                spec.discount,
            )));
        }

        let screen = drive(screen, events).await?;
        println!("{}", format_cart_table(screen.cart()));
        println!("{}", format_grand_total(screen.cart()));

        if !screen.cart().can_sell() {
            println!("{} Cart has lines with zero quantity, sale not submitted", WARNING);
            return Ok(());
        }

        if !yes {
            let confirm = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Submit this sale?")
                .default(true)
                .interact()?;

            if !confirm {
                println!("Sale cancelled");
                return Ok(());
            }
        }

        let screen = drive(screen, vec![ScreenEvent::Sell]).await?;
        ensure_sold(&screen)?;
        info!("Sell flow finished");
        Ok(())
    }

    fn handle_scroll(
        &self,
        document_height: f64,
        viewport_height: f64,
        offset: f64,
        container_height: f64,
        header_offset: f64,
    ) -> Result<()> {
        let viewport = StaticViewport::new(viewport_height, document_height).with_element(
            CONTAINER_ELEMENT,
            ElementRect {
                top: 0.0,
                height: container_height,
                scroll_height: container_height,
            },
        );
        viewport.scroll_to(offset);

        let flags = ScrollFlags::measure(&viewport, &self.config.scroll_thresholds, header_offset);
        println!("{} {}", INFO, style("Scroll flags").bold().cyan());
        println!("near bottom:  {}", yes_no(flags.near_bottom));
        println!("back to top:  {}", yes_no(flags.show_back_to_top));
        println!("sticky header: {}", yes_no(flags.sticky_header));
        Ok(())
    }

    fn screen(&self, viewport: Arc<StaticViewport>) -> SalesScreen {
        SalesScreen::new(
            self.gateway.clone(),
            self.notifier.clone(),
            viewport,
            self.config.scroll_thresholds,
        )
    }
}

/// Feed events through the screen's loop and get the screen back once drained.
async fn drive(mut screen: SalesScreen, events: Vec<ScreenEvent>) -> Result<SalesScreen> {
    let mut signals = screen.render_signals();
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            match signal {
                RenderSignal::ScrollTo { top, .. } => debug!("Scroll to {}px", top),
                other => debug!("Render: {:?}", other),
            }
        }
    });

    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(screen.run(rx));
    for event in events {
        if tx.send(event).await.is_err() {
            warn!("Screen stopped before all events were delivered");
            break;
        }
    }
    drop(tx);

    let screen = handle.await.context("Sales screen task failed")?;
    Ok(screen)
}

/// A completed sale leaves the cart empty; anything else means it was rejected.
fn ensure_sold(screen: &SalesScreen) -> Result<()> {
    if screen.cart().is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Sale was not completed, {} lines remain in the cart",
            screen.cart().line_count()
        ))
    }
}

fn yes_no(flag: bool) -> console::StyledObject<&'static str> {
    if flag {
        style("yes").green()
    } else {
        style("no").dim()
    }
}
