//! Message Classifier
//!
//! A message is spam when any keyword occurs in its body, compared after
//! lowercasing both sides. Matching is plain substring search: `"win"` also
//! matches `"winter"`.

use crate::keywords::KeywordSet;

/// Whether `body` contains any of `keywords`.
///
/// An absent body or an empty keyword set never classifies as spam.
pub fn classify(keywords: &KeywordSet, body: Option<&str>) -> bool {
    first_match(keywords, body).is_some()
}

/// First keyword found in `body`, if any.
///
/// Which keyword is reported depends on iteration order, whether one is
/// reported does not.
pub fn first_match<'k>(keywords: &'k KeywordSet, body: Option<&str>) -> Option<&'k str> {
    let body = body?;
    if keywords.is_empty() {
        return None;
    }

    let haystack = body.to_lowercase();
    keywords
        .iter()
        .find(|keyword| !keyword.is_empty() && haystack.contains(&keyword.to_lowercase()))
}
