//! Reply texts sent back over WhatsApp

use rust_decimal::Decimal;

use crate::models::LinkOutcome;

pub const HELP: &str = "📱 *Expense Bot - Commands*

*Add Transactions:*
• \"Lunch $15\" - Add expense
• \"Coffee $5.50\" - Quick entry
• \"Groceries $45.99\" - With vendor name

*Other Commands:*
• \"Help\" - Show this message

*Tips:*
• Send receipt photos (coming soon!)
• Include date: \"Lunch $15 12/25\"
• Use \"today\" or \"yesterday\" for dates";

pub const WELCOME: &str = "✅ Account linked! How can I help you today?

Try sending:
• \"Lunch $15\" - Add a transaction
• \"Coffee $5.50\" - Quick expense entry
• \"Help\" - See all commands

You can also send photos of receipts!";

pub const LINK_INVALID: &str =
    "Invalid or expired link token. Please generate a new one from the app.";

pub const LINK_EXPIRED: &str =
    "This link token has expired. Please generate a new one from the app.";

pub const LINK_ALREADY_USED: &str =
    "This link token has already been used. Please generate a new one from the app.";

pub const NOT_LINKED: &str =
    "Your WhatsApp number is not linked. Please link your account first using the app.";

pub const USAGE: &str = "I couldn't understand that. Please send a transaction like:
• \"Lunch $15\"
• \"Coffee $5.50\"
• \"Groceries $45.99\"

Or type \"help\" for more options.";

pub const RECEIPT_COMING_SOON: &str = "📸 Receipt received! Receipt processing is coming soon - for now, please send transactions as text like 'Coffee $5.50'.";

pub const LINK_APOLOGY: &str =
    "Sorry, there was an error processing your link. Please try again.";

pub const TRANSACTION_APOLOGY: &str =
    "Sorry, there was an error processing your transaction. Please try again or contact support.";

pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Reply for a link attempt
pub fn link_reply(outcome: &LinkOutcome) -> &'static str {
    match outcome {
        LinkOutcome::Linked { .. } => WELCOME,
        LinkOutcome::NotFound => LINK_INVALID,
        LinkOutcome::Expired => LINK_EXPIRED,
        LinkOutcome::AlreadyUsed => LINK_ALREADY_USED,
    }
}

/// Confirmation echoing vendor and amount, plus the note when there is one
pub fn transaction_added(vendor: &str, amount: Decimal, note: Option<&str>) -> String {
    let vendor = if vendor.is_empty() { "Transaction" } else { vendor };

    let mut reply = format!("✅ Added: {} ${:.2}", vendor, amount);
    if let Some(note) = note {
        reply.push_str(&format!("\nNote: {}", note));
    }
    reply.push_str("\n\nTransaction will appear in the app after sync.");
    reply
}
