use super::direction::Direction;

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The character at the `dir` end of `text`.
pub(crate) fn end_char(text: &str, dir: Direction) -> Option<char> {
    match dir {
        Direction::Left => text.chars().next(),
        Direction::Right => text.chars().next_back(),
    }
}

/// Removes and returns the character at the `dir` end of `text`.
pub(crate) fn take_end_char(text: &mut String, dir: Direction) -> Option<char> {
    match dir {
        Direction::Left => {
            let ch = text.chars().next()?;
            text.drain(..ch.len_utf8());
            Some(ch)
        }
        Direction::Right => text.pop(),
    }
}

/// Inserts `addition` at the `dir` end of `text`.
pub(crate) fn insert_at_end(text: &mut String, addition: &str, dir: Direction) {
    match dir {
        Direction::Left => text.insert_str(0, addition),
        Direction::Right => text.push_str(addition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_index_counts_multibyte_characters() {
        assert_eq!(char_to_byte_idx("héllo", 0), 0);
        assert_eq!(char_to_byte_idx("héllo", 2), 3);
        assert_eq!(char_to_byte_idx("héllo", 9), "héllo".len());
    }

    #[test]
    fn end_characters_follow_direction() {
        assert_eq!(end_char("abc", Direction::Left), Some('a'));
        assert_eq!(end_char("abc", Direction::Right), Some('c'));
        assert_eq!(end_char("", Direction::Right), None);
    }

    #[test]
    fn take_end_char_strips_one_character() {
        let mut text = String::from("ñab");
        assert_eq!(take_end_char(&mut text, Direction::Left), Some('ñ'));
        assert_eq!(take_end_char(&mut text, Direction::Right), Some('b'));
        assert_eq!(text, "a");
    }

    #[test]
    fn insert_at_end_prepends_or_appends() {
        let mut text = String::from("b");
        insert_at_end(&mut text, "a", Direction::Left);
        insert_at_end(&mut text, "c", Direction::Right);
        assert_eq!(text, "abc");
    }
}
