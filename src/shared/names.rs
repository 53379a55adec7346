pub const MAX_PLAYER_NAME_LENGTH: usize = 16;
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Collapses runs of whitespace and caps the name at `MAX_PLAYER_NAME_LENGTH`
/// characters. Blank names become `fallback`.
pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return fallback.to_string();
    }
    collapsed
        .chars()
        .take(MAX_PLAYER_NAME_LENGTH)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Rejects names a client must not send: blank, over-long, or containing a
/// line break that would split the handshake line.
pub fn validate_player_name(name: &str) -> anyhow::Result<&str> {
    if name.contains(['\n', '\r']) {
        anyhow::bail!("player name must fit on one line");
    }
    if name.trim().is_empty() {
        anyhow::bail!("player name must not be blank");
    }
    let length = name.chars().count();
    if length > MAX_PLAYER_NAME_LENGTH {
        anyhow::bail!("player name has {length} characters, the limit is {MAX_PLAYER_NAME_LENGTH}");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_collapsed_and_blank_falls_back() {
        assert_eq!(sanitize_player_name("  Ada \t Lovelace ", DEFAULT_PLAYER_NAME), "Ada Lovelace");
        assert_eq!(sanitize_player_name(" \t ", DEFAULT_PLAYER_NAME), "Player");
    }

    #[test]
    fn long_names_are_cut_on_character_boundaries() {
        let name = "ÄÖÜäöüßÄÖÜäöüßÄÖÜ";
        let sanitized = sanitize_player_name(name, DEFAULT_PLAYER_NAME);
        assert_eq!(sanitized.chars().count(), MAX_PLAYER_NAME_LENGTH);
        assert!(name.starts_with(&sanitized));
    }

    #[test]
    fn validation_enforces_the_client_limit() {
        assert_eq!(validate_player_name("Alice").expect("valid"), "Alice");
        assert!(validate_player_name("abcdefghijklmnop").is_ok());
        assert!(validate_player_name("abcdefghijklmnopq").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name("Al\nice").is_err());
    }
}
