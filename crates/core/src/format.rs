//! Display helpers for INR amounts and percentages.

const CRORE: f64 = 1_00_00_000.0;
const LAKH: f64 = 1_00_000.0;
const THOUSAND: f64 = 1_000.0;

/// Whole rupees with Indian digit grouping: `₹12,34,567`, `-₹1,500`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    format!("{sign}₹{}", group_indian(&digits))
}

/// Compact form using crore / lakh / thousand: `₹1.50 cr`, `-₹2.35 lakh`.
pub fn format_currency_words(amount: f64) -> String {
    let abs = amount.abs();
    let words = if abs >= CRORE {
        format!("{:.2} cr", abs / CRORE)
    } else if abs >= LAKH {
        format!("{:.2} lakh", abs / LAKH)
    } else if abs >= THOUSAND {
        format!("{:.2} th", abs / THOUSAND)
    } else {
        format!("{abs}")
    };
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}₹{words}")
}

/// Signed percentage with two decimals: `+12.34%`, `-5.00%`.
pub fn format_percentage(percent: f64) -> String {
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{sign}{percent:.2}%")
}

/// Last three digits, then groups of two: "1234567" → "12,34,567".
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}
