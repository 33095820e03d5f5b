/// Chain identifier embedded in a bech32-style address, e.g. `osmo` for `osmo1...`.
///
/// Takes the text before the first `.` or `1`, whichever comes first and is not at
/// position zero. Falls back to the first six characters for long addresses.
pub fn chain_from_address(address: &str) -> String {
    let dot = address.find('.').filter(|&i| i > 0);
    let one = address.find('1').filter(|&i| i > 0);

    let cut = match (dot, one) {
        (Some(d), Some(o)) => Some(d.min(o)),
        (Some(d), None) => Some(d),
        (None, Some(o)) => Some(o),
        (None, None) => None,
    };

    match cut {
        Some(end) => address[..end].to_string(),
        None if address.chars().count() > 6 => address.chars().take(6).collect(),
        None => "unknown".to_string(),
    }
}

/// Display form `abcdef...wxyz` for long addresses; short ones are returned as-is.
pub fn shorten_address(
    address: &str,
    prefix_len: usize,
    suffix_len: usize,
) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= prefix_len + suffix_len {
        return address.to_string();
    }
    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("osmo1qwerty", "osmo")]
    #[case("cosmos1abcdef", "cosmos")]
    #[case("axelar.gateway1", "axelar")]
    #[case("1leading", "1leadi")]
    #[case("abcdefgh", "abcdef")]
    #[case("abc", "unknown")]
    #[case("", "unknown")]
    fn test_chain_from_address(
        #[case] address: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(chain_from_address(address), expected);
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(shorten_address("osmo1qwertyuiopasdf", 6, 4), "osmo1q...asdf");
        assert_eq!(shorten_address("short", 6, 4), "short");
        assert_eq!(shorten_address("exactly10c", 6, 4), "exactly10c");
    }
}
