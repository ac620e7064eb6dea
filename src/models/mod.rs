pub mod link_token;
pub mod message_log;
pub mod transaction;
pub mod user_mapping;

pub use link_token::{LinkOutcome, LinkRejection, LinkToken};
pub use message_log::{MessageKind, NewLogEntry};
pub use transaction::{NewTransaction, PendingTransaction, TransactionStatus};
pub use user_mapping::UserMapping;
