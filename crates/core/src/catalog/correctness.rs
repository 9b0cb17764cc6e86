//! Heuristic for "does the release name actually name this game".
//!
//! Only the first word is compared. Two different games that share a first
//! word (`Halo Wars` against `Halo.Infinite-CODEX`) pass; that is a known
//! limitation of the heuristic.

/// Separators in release names that are treated as spaces.
const RELEASE_SEPARATORS: [char; 3] = ['.', '-', '_'];

/// True when the first word of `name` equals the first word of
/// `torrent_name`, case-insensitively, after release separators in the
/// torrent name are turned into spaces.
pub fn is_correct(name: &str, torrent_name: &str) -> bool {
    let name = name.trim().to_lowercase();
    let torrent_name = torrent_name.trim().to_lowercase();
    if name.is_empty() || torrent_name.is_empty() {
        return false;
    }

    let first_name_word = first_word(&name);
    let normalized = torrent_name.replace(RELEASE_SEPARATORS, " ");
    let first_torrent_word = first_word(&normalized);

    !first_name_word.is_empty() && first_name_word == first_torrent_word
}

/// Name search key derived from a release name: everything before the
/// first `-`, trimmed. Release names without a hyphen are used whole.
pub fn search_key(torrent_name: &str) -> &str {
    torrent_name
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
}

fn first_word(text: &str) -> &str {
    text.split(' ').next().unwrap_or_default()
}
