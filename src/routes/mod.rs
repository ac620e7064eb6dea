pub mod health;
pub mod link;
pub mod transactions;
pub mod validation;
pub mod webhook;

pub use health::health_check;
pub use link::{create_link_token, link_status, unlink};
pub use transactions::{confirm_transaction, list_transactions};
pub use validation::{require_owner_id, OwnerQuery};
pub use webhook::receive_message;
