use unicode_segmentation::UnicodeSegmentation;

const MAX_NAME_GRAPHEMES: usize = 256;
const FORBIDDEN_CHARACTERS: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

/// A display name submitted through the web form.
///
/// Making an incorrect value unrepresentable by construction lets the compiler enforce the
/// constraints for us: the inner string is never exposed mutably, so whatever `parse` checked
/// holds for the lifetime of the value. The registry itself accepts any non-blank name; these
/// extra rules only apply to input collected over HTTP.
#[derive(Debug, Clone)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Returns a `SubscriberName` if the input is non-blank, at most 256 graphemes long and free
    /// of characters that commonly show up in injection attempts.
    pub fn parse(s: String) -> Result<SubscriberName, String> {
        let is_empty_or_whitespace = s.trim().is_empty();

        // A grapheme is a "user-perceived" character: `a̐` is one grapheme made of two chars.
        let is_too_long = s.graphemes(true).count() > MAX_NAME_GRAPHEMES;

        let contains_forbidden_characters = s.chars().any(|g| FORBIDDEN_CHARACTERS.contains(&g));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
            Err(format!("{s:?} is not a valid subscriber name."))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SubscriberName> for String {
    fn from(name: SubscriberName) -> Self {
        name.0
    }
}
