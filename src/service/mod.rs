pub mod balance_aggregator;
pub mod explorer_client;
pub mod persister;
pub mod scanner;

pub use balance_aggregator::BalanceAggregator;
pub use explorer_client::{BalanceQueryClient, BalanceSource, EtherscanSource, RetryPolicy};
pub use persister::{FileResultPersister, ResultPersister};
pub use scanner::{IterationOutcome, SeedScanner, TerminationPolicy};
