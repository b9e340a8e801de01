//! Similarity primitives shared by the strategies
//!
//! Edit distance, phonetic encoding, cosine similarity over sparse term
//! weights and great-circle distance.

use std::collections::HashMap;

/// Mean Earth radius in kilometres
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Levenshtein edit distance, counted in characters
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();

    let mut dp: Vec<usize> = (0..=b_len).collect();
    for (i, ac) in a.chars().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;

        for (j, bc) in b_chars.iter().enumerate() {
            let temp = dp[j + 1];
            let cost = usize::from(ac != *bc);
            dp[j + 1] = (dp[j + 1] + 1).min(dp[j] + 1).min(prev + cost);
            prev = temp;
        }
    }

    dp[b_len]
}

/// `1 - distance / max_len`; `None` when either side is empty
pub fn similarity(a: &str, b: &str) -> Option<f64> {
    let max_len = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some(1.0 - edit_distance(a, b) as f64 / max_len as f64)
}

/// American Soundex code of the letters in `text` (non-letters are skipped).
/// Returns an empty string when `text` holds no ASCII letters.
pub fn soundex(text: &str) -> String {
    let mut letters = text
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase());

    let Some(first) = letters.next() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut prev_digit = soundex_digit(first);

    for ch in letters {
        let digit = soundex_digit(ch);
        match digit {
            Some(d) if digit != prev_digit => {
                code.push(d);
                if code.len() == 4 {
                    break;
                }
            }
            _ => {}
        }
        // H and W do not separate letters with the same code
        if ch != 'H' && ch != 'W' {
            prev_digit = digit;
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn soundex_digit(ch: char) -> Option<char> {
    match ch {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Do two texts sound alike? Empty encodings never match.
pub fn sounds_alike(a: &str, b: &str) -> bool {
    let code = soundex(a);
    !code.is_empty() && code == soundex(b)
}

/// Cosine similarity of two sparse weight vectors; missing terms weigh 0.
/// Zero-magnitude vectors give 0, never NaN.
pub fn cosine_similarity(v1: &HashMap<String, f64>, v2: &HashMap<String, f64>) -> f64 {
    let (small, large) = if v1.len() <= v2.len() { (v1, v2) } else { (v2, v1) };

    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|w2| w * w2))
        .sum();

    let norm1 = v1.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm2 = v2.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm1 == 0.0 || norm2 == 0.0 {
        return 0.0;
    }
    (dot / (norm1 * norm2)).clamp(0.0, 1.0)
}

/// Great-circle distance between two (lat, lng) points in kilometres
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
