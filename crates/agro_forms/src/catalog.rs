/// Crops the fertilizer guide offers, in display order.
pub const CROPS: [&str; 22] = [
    "rice",
    "maize",
    "chickpea",
    "kidneybeans",
    "pigeonpeas",
    "mothbeans",
    "mungbean",
    "blackgram",
    "lentil",
    "pomegranate",
    "banana",
    "mango",
    "grapes",
    "watermelon",
    "muskmelon",
    "apple",
    "orange",
    "papaya",
    "coconut",
    "cotton",
    "jute",
    "coffee",
];

/// Catalog spelling of `name`, matched case-insensitively.
pub fn lookup(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CROPS.iter().copied().find(|c| c.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(lookup(" Rice "), Some("rice"));
        assert_eq!(lookup("KIDNEYBEANS"), Some("kidneybeans"));
        assert_eq!(lookup("kale"), None);
    }
}
