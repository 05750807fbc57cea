use std::collections::HashSet;

/// Split `text` into lowercase alphanumeric tokens, keeping only the first
/// occurrence of each token. Token order follows the text, so a token's index
/// in the returned vector is its position.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for piece in text.split(|c: char| !c.is_alphanumeric()) {
        if piece.is_empty() {
            continue;
        }
        let token = piece.to_lowercase();
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }

    tokens
}
