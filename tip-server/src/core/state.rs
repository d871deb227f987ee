use std::sync::Arc;

use crate::budget::RoleBudget;
use crate::core::Config;
use crate::directory::InMemoryDirectory;
use crate::ledger::PaymentLedger;
use crate::statistics::StatisticsService;
use crate::transfer::{ManualSettlementGateway, SettlementGateway, TransferValidator};

/// Server state: shared references to every engine component
///
/// Cloning is cheap (all fields are `Arc`).
///
/// | Field | Type | Role |
/// |-------|------|------|
/// | config | Config | immutable configuration |
/// | directory | InMemoryDirectory | employees |
/// | budget | Arc<RoleBudget> | role percentages |
/// | ledger | Arc<PaymentLedger> | payments + state machine |
/// | statistics | Arc<StatisticsService> | snapshots + cache |
/// | transfers | Arc<TransferValidator> | transfer reconciliation |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub directory: InMemoryDirectory,
    pub budget: Arc<RoleBudget>,
    pub ledger: Arc<PaymentLedger>,
    pub statistics: Arc<StatisticsService>,
    pub transfers: Arc<TransferValidator>,
}

impl ServerState {
    /// Build state with the manual settlement gateway
    pub fn initialize(config: &Config) -> Self {
        Self::with_gateway(config, Arc::new(ManualSettlementGateway))
    }

    /// Build state with a custom settlement gateway
    pub fn with_gateway(config: &Config, gateway: Arc<dyn SettlementGateway>) -> Self {
        let directory = InMemoryDirectory::new();
        let ledger = Arc::new(PaymentLedger::new());
        let budget = Arc::new(RoleBudget::new(directory.clone()));
        let statistics = Arc::new(StatisticsService::new(
            ledger.clone(),
            Arc::new(directory.clone()),
            config.tz(),
            config.stats_cache_ttl(),
            config.default_per_page,
        ));
        let transfers = Arc::new(TransferValidator::new(
            ledger.clone(),
            gateway,
            config.settlement_timeout(),
        ));

        tracing::info!(
            timezone = %config.timezone,
            cache_ttl_secs = config.stats_cache_ttl_secs,
            settlement_timeout_ms = config.settlement_timeout_ms,
            "Server state initialized"
        );

        Self {
            config: config.clone(),
            directory,
            budget,
            ledger,
            statistics,
            transfers,
        }
    }
}
