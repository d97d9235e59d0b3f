//! Title to filename-safe slug conversion.
//!
//! Slugs are lowercase ASCII letters, digits and single hyphens, with no
//! leading or trailing hyphen. Everything else collapses into a separator.
//! Because hyphens and spaces are interchangeable, slugifying a title that
//! was itself recovered from a slug yields the same slug.

pub trait Slugifier {
    fn slugify(&self, text: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSlugifier;

impl Slugifier for DefaultSlugifier {
    fn slugify(&self, text: &str) -> String {
        let mut slug = String::with_capacity(text.len());
        let mut pending_separator = false;

        for ch in text.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(ch.to_ascii_lowercase());
            } else if ch == '\'' {
                // "Don't" -> "dont"
                continue;
            } else {
                pending_separator = true;
            }
        }

        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::title_from_slug;

    fn slugify(s: &str) -> String {
        DefaultSlugifier.slugify(s)
    }

    #[test]
    fn test_basic_slugs() {
        assert_eq!(slugify("The Long Night"), "the-long-night");
        assert_eq!(slugify("  Chapter 1: Arrival!  "), "chapter-1-arrival");
        assert_eq!(slugify("Don't Panic"), "dont-panic");
        assert_eq!(slugify("a__b--c"), "a-b-c");
        assert_eq!(slugify("../../etc/passwd"), "etc-passwd");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Épilogue"), "pilogue");
    }

    #[test]
    fn test_stable_through_title_recovery() {
        for title in ["The Long Night", "Foo_Bar", "x  y", "Part 2 - The End"] {
            let slug = slugify(title);
            assert_eq!(slugify(&title_from_slug(&slug)), slug);
        }
    }
}
