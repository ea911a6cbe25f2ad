use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ASCII digits only. The separator is `.` unescaped, so any single character is accepted between digit groups
    static ref SRC_PATTERN: Regex = Regex::new(r"SRC=([0-9]{1,3}.[0-9]{1,3}.[0-9]{1,3}.[0-9]{1,3})").unwrap();
    static ref DPT_PATTERN: Regex = Regex::new(r"DPT=([0-9]{1,5})").unwrap();
}

/// The fields pulled out of one log line. Either, both, or neither may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub ip: Option<String>,
    pub port: Option<String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.ip.is_none() && self.port.is_none()
    }
}

/// Look for a `SRC=` source address and a `DPT=` destination port anywhere in the line.
pub fn match_line(line: &str) -> MatchResult {
    MatchResult {
        ip: SRC_PATTERN.captures(line).map(|c| c[1].to_owned()),
        port: DPT_PATTERN.captures(line).map(|c| c[1].to_owned()),
    }
}
