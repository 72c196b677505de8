//! Fallback nickname for server entries that do not name one.
//!
//! Produces `crab` followed by four digits (e.g. `crab0421`), short enough
//! for the traditional 9-character nick limit.

use rand::RngExt;

const NICK_STEM: &str = "crab";

pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let suffix: u16 = rng.random_range(0..10000);
    format!("{}{:04}", NICK_STEM, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_nick_fits_classic_limit() {
        for _ in 0..50 {
            let nick = generate_nickname();
            assert!(nick.starts_with(NICK_STEM));
            assert_eq!(nick.len(), 8);
            assert!(nick[NICK_STEM.len()..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
