//! Epoch-version-release parsing and ordering.
//!
//! Ordering follows rpm's segment comparison: versions are split into
//! alternating numeric and alphabetic segments, separators are ignored,
//! numeric segments beat alphabetic ones, `~` sorts before anything (even
//! the end of the string) and `^` sorts after the end of the string but
//! before any further segment.

use std::cmp::Ordering;
use std::fmt;

/// A parsed `[epoch:]version[-release]` string.
#[derive(Debug, Clone)]
pub struct Evr {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl Evr {
    /// Parse an EVR string.
    ///
    /// Parsing is lenient: a missing or non-numeric epoch is treated as 0
    /// and everything after the last `-` is the release.
    ///
    /// - "1.2.3" → epoch=0, version="1.2.3", release=None
    /// - "2:1.2.3-4.fc40" → epoch=2, version="1.2.3", release=Some("4.fc40")
    pub fn parse(s: &str) -> Self {
        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) if e.chars().all(|c| c.is_ascii_digit()) => {
                (e.parse::<u64>().unwrap_or(0), r)
            }
            _ => (0, s),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v.to_string(), Some(r.to_string())),
            None => (rest.to_string(), None),
        };

        Self {
            epoch,
            version,
            release,
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(release) = &self.release {
            write!(f, "-{release}")?;
        }
        Ok(())
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| vercmp(&self.version, &other.version))
            .then_with(|| match (&self.release, &other.release) {
                (Some(a), Some(b)) => vercmp(a, b),
                // rpm skips the release when one side lacks it, which is not
                // a total order. A missing release sorts lower instead;
                // repoquery output always carries one.
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Evr {}

/// Compare two EVR strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    Evr::parse(a).cmp(&Evr::parse(b))
}

fn is_separator(c: u8) -> bool {
    !c.is_ascii_alphanumeric() && c != b'~' && c != b'^'
}

/// Compare a single version or release component the way rpm does.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (mut one, mut two) = (a.as_bytes(), b.as_bytes());

    while !one.is_empty() || !two.is_empty() {
        while let Some((&c, rest)) = one.split_first() {
            if !is_separator(c) {
                break;
            }
            one = rest;
        }
        while let Some((&c, rest)) = two.split_first() {
            if !is_separator(c) {
                break;
            }
            two = rest;
        }

        // Tilde sorts before everything, including the end of the string
        match (one.first(), two.first()) {
            (Some(b'~'), Some(b'~')) => {
                one = &one[1..];
                two = &two[1..];
                continue;
            }
            (Some(b'~'), _) => return Ordering::Less,
            (_, Some(b'~')) => return Ordering::Greater,
            _ => {}
        }

        // Caret sorts after the end of the string but before any segment
        match (one.first(), two.first()) {
            (Some(b'^'), Some(b'^')) => {
                one = &one[1..];
                two = &two[1..];
                continue;
            }
            (None, Some(b'^')) => return Ordering::Less,
            (Some(b'^'), None) => return Ordering::Greater,
            (Some(b'^'), Some(_)) => return Ordering::Less,
            (Some(_), Some(b'^')) => return Ordering::Greater,
            _ => {}
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let take = |s: &[u8]| -> usize {
            s.iter()
                .take_while(|c| {
                    if numeric {
                        c.is_ascii_digit()
                    } else {
                        c.is_ascii_alphabetic()
                    }
                })
                .count()
        };

        let (len_one, len_two) = (take(one), take(two));
        let (seg_one, seg_two) = (&one[..len_one], &two[..len_two]);

        if seg_two.is_empty() {
            // Numeric segments are newer than alphabetic ones
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let strip = |s: &[u8]| s.iter().take_while(|&&c| c == b'0').count();
            let (seg_one, seg_two) = (&seg_one[strip(seg_one)..], &seg_two[strip(seg_two)..]);
            seg_one
                .len()
                .cmp(&seg_two.len())
                .then_with(|| seg_one.cmp(seg_two))
        } else {
            seg_one.cmp(seg_two)
        };

        if ord != Ordering::Equal {
            return ord;
        }

        one = &one[len_one..];
        two = &two[len_two..];
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evr() {
        let evr = Evr::parse("2:1.2.3-4.fc40");
        assert_eq!(evr.epoch, 2);
        assert_eq!(evr.version, "1.2.3");
        assert_eq!(evr.release.as_deref(), Some("4.fc40"));

        let evr = Evr::parse("1.0");
        assert_eq!(evr.epoch, 0);
        assert_eq!(evr.version, "1.0");
        assert!(evr.release.is_none());
    }

    #[test]
    fn test_display_omits_zero_epoch() {
        assert_eq!(Evr::parse("0:1.0-1").to_string(), "1.0-1");
        assert_eq!(Evr::parse("3:1.0-1").to_string(), "3:1.0-1");
    }

    #[test]
    fn test_vercmp_numeric() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.01", "1.1"), Ordering::Equal);
        assert_eq!(vercmp("2.0", "2.0.1"), Ordering::Less);
    }

    #[test]
    fn test_vercmp_alpha_and_separators() {
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1a", "1.1"), Ordering::Less);
        assert_eq!(vercmp("1_0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("fc40", "fc39"), Ordering::Greater);
    }

    #[test]
    fn test_vercmp_tilde_and_caret() {
        assert_eq!(vercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(vercmp("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1.0^git1", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_epoch_wins() {
        assert_eq!(compare("1:1.0-1", "9.9-9"), Ordering::Greater);
        assert_eq!(compare("1.0-2.fc40", "1.0-10.fc40"), Ordering::Less);
    }

    #[test]
    fn test_missing_release_sorts_lower() {
        assert_eq!(compare("1.0", "1.0-1"), Ordering::Less);
        assert_eq!(compare("1.0-1", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0", "1.0-2"), Ordering::Less);
        assert_eq!(compare("1.1", "1.0-9"), Ordering::Greater);
    }
}
