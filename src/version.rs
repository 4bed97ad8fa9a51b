//! Semantic version parsing for tool and release versions

use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` version. Missing minor/patch components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Find the first whitespace-separated token in `text` that reads as a version.
    ///
    /// Handles tool banners such as `v20.11.1` and `Homebrew 4.2.0`.
    pub fn extract(text: &str) -> Option<Self> {
        text.split_whitespace()
            .map(|token| token.trim_matches(|c: char| c == ',' || c == '(' || c == ')'))
            .find_map(|token| token.parse().ok())
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err("version cannot be empty".to_string());
        }

        // Drop pre-release/build suffixes like "4.2.0-12-gabc" or "1.0.0+meta"
        let core = trimmed
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or(trimmed);

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(format!("version should have at most 3 parts: {}", s));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("version should only contain numbers: {}", s))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
