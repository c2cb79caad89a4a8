use regex::Regex;

/// Decides which tracked URLs are paginated "load more" listings
#[derive(Debug, Clone)]
pub struct PaginationMatcher {
    pattern: Regex,
}

impl PaginationMatcher {
    /// Creates a matcher from a regex pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns true if the URL must be assembled page by page
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::url::PaginationMatcher;
    ///
    /// let matcher = PaginationMatcher::new(r"/en/[a-z_]+/[a-z_]+/$").unwrap();
    /// assert!(matcher.is_paginated("translations.example.com/en/android/settings/"));
    /// assert!(!matcher.is_paginated("translations.example.com/en/android/"));
    /// ```
    pub fn is_paginated(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}
