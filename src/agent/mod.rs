//! Conversational layer over the price list matcher.

pub mod answer;
pub mod price_agent;

pub use answer::{render_answer, GREETING, HISTORY_CLEARED, NO_MATCHES, PRICE_NOT_SPECIFIED};
pub use price_agent::{PriceAgent, TurnOutcome};
