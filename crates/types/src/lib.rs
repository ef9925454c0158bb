/// A string type that never holds more than `MAX` characters.
///
/// Form fields with a hard character cap (for example the referral sub-form fields) are
/// stored as `CappedText` so the cap is enforced at the type level. Length is measured in
/// Unicode scalar values, not bytes, so accented Portuguese text counts one per letter.
///
/// [`CappedText::truncating`] is the only constructor: it silently cuts the input at the
/// cap, which is what an interactive text box does while the user is typing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CappedText<const MAX: usize>(String);

impl<const MAX: usize> CappedText<MAX> {
    /// Maximum number of characters this type accepts.
    pub const MAX: usize = MAX;

    /// Creates a new `CappedText`, keeping only the first `MAX` characters of the input.
    pub fn truncating(input: impl AsRef<str>) -> Self {
        Self(input.as_ref().chars().take(MAX).collect())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters currently held.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Characters left before the cap is reached.
    pub fn remaining(&self) -> usize {
        MAX.saturating_sub(self.len())
    }
}

impl<const MAX: usize> std::fmt::Display for CappedText<MAX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<const MAX: usize> AsRef<str> for CappedText<MAX> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> serde::Serialize for CappedText<MAX> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}
