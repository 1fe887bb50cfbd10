const INPUT_USD_PER_1K: f64 = 0.00025;
const OUTPUT_USD_PER_1K: f64 = 0.0005;

/// Rough token count: one token per four characters.
pub fn estimate_tokens(text: &str) -> u64 {
    tokens_for_chars(text.chars().count())
}

pub fn tokens_for_chars(chars: usize) -> u64 {
    (chars as u64).div_ceil(4)
}

/// Cost in whole cents, charging every token at both the input and output rate.
pub fn estimate_cost_cents(tokens: u64) -> u64 {
    let t = tokens as f64;
    let usd = (t * INPUT_USD_PER_1K / 1000.0) + (t * OUTPUT_USD_PER_1K / 1000.0);
    (usd * 100.0).round() as u64
}
