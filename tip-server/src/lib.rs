//! Tip Server - restaurant tipping engine
//!
//! # Architecture
//!
//! - **Role budget** (`budget`): tip-share percentages, never above 100% per restaurant
//! - **Payment ledger** (`ledger`): append-mostly payments and their status machine
//! - **Aggregation** (`aggregation`): grouping, totals and waiter ranking
//! - **Statistics** (`statistics`): snapshots, comparison mode, paging, cache
//! - **Transfers** (`transfer`): bank transfer reconciliation
//! - **HTTP API** (`api`): axum routes over all of the above
//!
//! # Layout
//!
//! ```text
//! tip-server/src/
//! ├── core/          # config, state, server
//! ├── api/           # HTTP routes and handlers
//! ├── budget/        # role budget
//! ├── directory.rs   # employee directory
//! ├── ledger/        # payment ledger
//! ├── aggregation/   # grouping + ranking
//! ├── statistics/    # snapshots + cache
//! ├── transfer/      # transfer validator + settlement gateway
//! └── utils/         # logger, time, validation
//! ```

pub mod aggregation;
pub mod api;
pub mod budget;
pub mod core;
pub mod directory;
pub mod ledger;
pub mod statistics;
pub mod transfer;
pub mod utils;

pub use budget::{BudgetError, RoleBudget};
pub use crate::core::{Config, Server, ServerState};
pub use directory::{EmployeeDirectory, InMemoryDirectory};
pub use ledger::{LedgerError, PaymentFilter, PaymentLedger};
pub use statistics::{StatisticsError, StatisticsService};
pub use transfer::{SettlementGateway, TransferError, TransferValidator};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Initialize logging from the configuration
pub fn setup_environment(config: &Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}
