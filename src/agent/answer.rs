//! Reply texts shown to the user.

use price_matcher::CatalogEntry;

pub const GREETING: &str = "Здравствуйте. Опишите, какая услуга вас интересует.";
pub const HISTORY_CLEARED: &str = "История диалога очищена.";
pub const NO_MATCHES: &str = "В предоставленном прайс-листе нет информации по данному запросу.";
pub const PRICE_NOT_SPECIFIED: &str = "Цена не указана";
const FOUND_HEADING: &str = "Доступные услуги:";

/// Bulleted list of found services, or the fixed no-match message
pub fn render_answer<'a>(found: impl IntoIterator<Item = &'a CatalogEntry>) -> String {
    let lines: Vec<String> = found
        .into_iter()
        .map(|entry| {
            let price = if entry.price.is_empty() {
                PRICE_NOT_SPECIFIED
            } else {
                entry.price.as_str()
            };
            format!("• {} — {}", entry.name, price)
        })
        .collect();

    if lines.is_empty() {
        return NO_MATCHES.to_string();
    }
    format!("{}\n\n{}", FOUND_HEADING, lines.join("\n"))
}
