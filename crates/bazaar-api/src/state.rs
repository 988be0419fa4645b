//! Shared application state.

use std::sync::{Arc, Mutex};

use bazaar_core::clock::Clock;
use bazaar_core::repository::EventRepository;
use bazaar_core::rng::DeterministicRng;
use bazaar_notifications::dispatcher::SideEffectDispatcher;
use bazaar_ordering::application::ports::PaymentInitiator;
use bazaar_shipping::application::ports::{ProductCatalog, VendorDirectory};
use bazaar_shipping::application::quote_handlers::QuoteSettings;
use rust_decimal::Decimal;

/// External collaborators the handlers talk to.
#[derive(Clone)]
pub struct Collaborators {
    /// Product lookup.
    pub catalog: Arc<dyn ProductCatalog>,
    /// Vendor policies and return addresses.
    pub vendors: Arc<dyn VendorDirectory>,
    /// Card payment initiation.
    pub payments: Arc<dyn PaymentInitiator>,
    /// Post-commit notifications and emails.
    pub dispatcher: SideEffectDispatcher,
}

/// Marketplace-wide settings.
#[derive(Debug, Clone)]
pub struct MarketplaceSettings {
    /// Currency and line resolution rule for quotes and checkout.
    pub quote: QuoteSettings,
    /// VAT rate shown in the buyer's price split.
    pub vat_rate_percent: Decimal,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            quote: QuoteSettings::default(),
            vat_rate_percent: Decimal::from(19),
        }
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for deterministic carrier simulation.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Event repository for persistence.
    pub event_repository: Arc<dyn EventRepository>,
    /// Catalog, vendors, payments and side-effect dispatch.
    pub collaborators: Collaborators,
    /// Marketplace settings.
    pub settings: MarketplaceSettings,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        event_repository: Arc<dyn EventRepository>,
        collaborators: Collaborators,
        settings: MarketplaceSettings,
    ) -> Self {
        Self {
            clock,
            rng,
            event_repository,
            collaborators,
            settings,
        }
    }
}
