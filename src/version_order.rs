use anyhow::{Error, anyhow};
use std::cmp::Ordering;
use std::str::FromStr;

/// How version strings are ordered when deciding which version is "earlier"
/// and which one is the latest.
///
/// `Lexical` compares the raw strings, so "1.10" sorts before "1.2". Retention
/// and legacy-user figures have always been computed that way; `Semantic`
/// compares dot-separated numeric components instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionOrder {
    #[default]
    Lexical,
    Semantic,
}

impl VersionOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            VersionOrder::Lexical => a.cmp(b),
            VersionOrder::Semantic => compare_components(a, b).then_with(|| a.cmp(b)),
        }
    }

    pub fn sort(&self, versions: &mut [String]) {
        versions.sort_by(|a, b| self.compare(a, b));
    }
}

fn compare_components(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                // Numeric components sort before textual ones.
                let ordering = match (l.trim().parse::<u64>(), r.trim().parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl FromStr for VersionOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(VersionOrder::Lexical),
            "semantic" => Ok(VersionOrder::Semantic),
            other => Err(anyhow!("Unknown version order: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(order: VersionOrder, versions: &[&str]) -> Vec<String> {
        let mut versions: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        order.sort(&mut versions);
        versions
    }

    #[test]
    fn lexical_keeps_string_order() {
        assert_eq!(
            sorted(VersionOrder::Lexical, &["1.2", "1.10", "1.0"]),
            vec!["1.0", "1.10", "1.2"]
        );
    }

    #[test]
    fn semantic_compares_numbers() {
        assert_eq!(
            sorted(VersionOrder::Semantic, &["1.2", "1.10", "1.0", "1.2.1"]),
            vec!["1.0", "1.2", "1.2.1", "1.10"]
        );
    }

    #[test]
    fn semantic_is_a_total_order() {
        let order = VersionOrder::Semantic;
        assert_eq!(order.compare("2", "10"), Ordering::Less);
        assert_eq!(order.compare("10", "1a"), Ordering::Less);
        assert_eq!(order.compare("2", "1a"), Ordering::Less);
        assert_eq!(
            sorted(order, &["1a", "10", "2", "1.b", "1.3", "01"]),
            vec!["01", "1.3", "1.b", "2", "10", "1a"]
        );
    }

    #[test]
    fn parse() {
        assert_eq!("Semantic".parse::<VersionOrder>().unwrap(), VersionOrder::Semantic);
        assert!("calendar".parse::<VersionOrder>().is_err());
    }
}
