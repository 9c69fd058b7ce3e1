use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pos-cart")]
#[command(about = "Point of sale cart: ring up lines and submit the sale")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the product catalog
    Catalog,
    /// Build a cart and submit it as a sale
    Sell {
        /// Cart lines as ID:QTY or ID:QTY:DISCOUNT
        #[arg(required = true, value_name = "ID:QTY[:DISCOUNT]")]
        lines: Vec<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Evaluate the scroll flags for a page layout
    Scroll {
        /// Total document height in px
        #[arg(long)]
        document_height: f64,
        /// Visible viewport height in px
        #[arg(long)]
        viewport_height: f64,
        /// Current vertical scroll offset in px
        #[arg(long)]
        offset: f64,
        /// Rendered height of the cart container in px
        #[arg(long, default_value_t = 0.0)]
        container_height: f64,
        /// Top offset of the totals header at load time in px
        #[arg(long, default_value_t = 0.0)]
        header_offset: f64,
    },
}
