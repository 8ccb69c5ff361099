use crate::line::utf16_len;
use crate::models::SnippetTable;

/// Result of running the snippet table over one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Unchanged,
    /// `new_cursor` is the UTF-16 length of `new_line`: the caret lands at
    /// the end of the rewritten line.
    Replaced { new_line: String, new_cursor: usize },
}

impl Expansion {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Expansion::Replaced { .. })
    }
}

/// Apply every snippet to `line` as a literal, global replacement.
///
/// Entries run in table order and each one sees the output of the previous
/// one, so `{"a": "b", "b": "c"}` rewrites `"a"` to `"c"`.
pub fn expand(line: &str, table: &SnippetTable) -> Expansion {
    let mut replaced = line.to_string();

    for snippet in table {
        if snippet.trigger.is_empty() || !replaced.contains(snippet.trigger.as_str()) {
            continue;
        }
        replaced = replaced.replace(snippet.trigger.as_str(), &snippet.expansion);
    }

    if replaced == line {
        return Expansion::Unchanged;
    }

    Expansion::Replaced {
        new_cursor: utf16_len(&replaced),
        new_line: replaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(pairs: &[(&str, &str)]) -> SnippetTable {
        pairs.iter().copied().collect()
    }

    fn replaced(line: &str) -> Expansion {
        Expansion::Replaced {
            new_line: line.to_string(),
            new_cursor: utf16_len(line),
        }
    }

    #[test]
    fn test_empty_table_is_unchanged() {
        for line in ["", "anything", ":smile:"] {
            assert_eq!(expand(line, &SnippetTable::new()), Expansion::Unchanged);
        }
    }

    #[test]
    fn test_no_matching_trigger_is_unchanged() {
        let snippets = SnippetTable::defaults();
        assert_eq!(expand("plain text :smile", &snippets), Expansion::Unchanged);
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let snippets = table(&[(":smile:", "😄")]);
        assert_eq!(
            expand(":smile: and :smile:", &snippets),
            replaced("😄 and 😄")
        );
    }

    #[test]
    fn test_replacements_chain_in_table_order() {
        assert_eq!(expand("a", &table(&[("a", "b"), ("b", "c")])), replaced("c"));
        assert_eq!(expand("a", &table(&[("b", "c"), ("a", "b")])), replaced("b"));
    }

    #[test]
    fn test_matches_do_not_overlap() {
        assert_eq!(expand("aaa", &table(&[("aa", "x")])), replaced("xa"));
    }

    #[test]
    fn test_empty_expansion_deletes_trigger() {
        assert_eq!(expand("drop:me:", &table(&[(":me:", "")])), replaced("drop"));
    }

    #[test]
    fn test_identity_snippet_is_unchanged() {
        assert_eq!(expand("same", &table(&[("same", "same")])), Expansion::Unchanged);
    }

    #[test]
    fn test_cursor_is_utf16_length_of_new_line() {
        let result = expand("hello :smile: world", &SnippetTable::defaults());

        match result {
            Expansion::Replaced {
                new_line,
                new_cursor,
            } => {
                assert_eq!(new_line, "hello 😄 world");
                assert_eq!(new_cursor, 14);
                assert_eq!(new_cursor, utf16_len(&new_line));
            }
            Expansion::Unchanged => panic!("expected a replacement"),
        }
    }

    #[test]
    fn test_expansion_is_repeatable() {
        let snippets = SnippetTable::defaults();
        let first = expand(":fire: :party:", &snippets);
        assert!(first.is_replaced());
        assert_eq!(expand(":fire: :party:", &snippets), first);
    }
}
