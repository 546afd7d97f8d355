use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of generated scope ids and blank node labels.
pub const UID_LEN: usize = 16;

/// Random alphanumeric identifier.
pub fn uid() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(UID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_alphanumeric_and_distinct() {
        let a = uid();
        let b = uid();
        assert_eq!(a.len(), UID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
