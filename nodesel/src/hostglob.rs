//! Host name patterns: matching, splitting, expansion and compression.
//!
//! # Grammar
//!
//! ```text
//! multi-pattern ::= pattern ("," pattern)*
//! pattern       ::= (literal | "*" | set)*
//! set           ::= "[" term ("," term)* "]"
//! term          ::= number | number "-" number
//! ```
//!
//! `*` matches any run of characters other than `.`, so it never crosses a
//! host-element boundary. A set matches the decimal representation of any of
//! its members: `c[1-3]-[2,4]` matches `c1-2`, `c3-4` and four more.
//!
//! A prefix matcher accepts a host name if the pattern matches a whole number
//! of leading host elements: `ml8` prefix-matches `ml8.hpc.uio.no`.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use regex::Regex;

use crate::{Error, Result};

/// Longest regex source we are willing to build.
const MAX_REGEX_LEN: usize = 50_000;

/// Most members a single bracket set may expand to.
const MAX_SET_SIZE: usize = 10_000;

/// Most host names a pattern may expand to.
const MAX_EXPANSION: usize = 10_000;

/// One scanned element of a pattern.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(char),
    Star,
    Set(Vec<u64>),
}

/// Pulls segments off a pattern one at a time, so callers can enforce their
/// own limits between segments.
struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            chars: pattern.chars().peekable(),
        }
    }

    fn next_segment(&mut self) -> Result<Option<Segment>> {
        let Some(c) = self.chars.next() else {
            return Ok(None);
        };
        match c {
            '*' => Ok(Some(Segment::Star)),
            '[' => self.read_set().map(|set| Some(Segment::Set(set))),
            ',' => Err(Error::CommaNotAllowed),
            c => Ok(Some(Segment::Literal(c))),
        }
    }

    // Opening bracket already consumed.
    fn read_set(&mut self) -> Result<Vec<u64>> {
        let mut set = Vec::new();
        loop {
            let start = self.read_int()?;
            if self.chars.next_if_eq(&'-').is_some() {
                let end = self.read_int()?;
                if start > end {
                    return Err(Error::InvalidRange { start, end });
                }
                for n in start..=end {
                    set.push(n);
                    if set.len() > MAX_SET_SIZE {
                        return Err(Error::RangeTooLarge);
                    }
                }
            } else {
                set.push(start);
            }
            match self.chars.next() {
                Some(']') => return Ok(set),
                Some(',') => continue,
                _ => return Err(Error::ExpectedComma),
            }
        }
    }

    fn read_int(&mut self) -> Result<u64> {
        let mut n: u64 = 0;
        let mut digits = 0;
        while let Some(d) = self.chars.peek().and_then(|c| c.to_digit(10)) {
            self.chars.next();
            n = n * 10 + u64::from(d);
            if n > 0xFFFF_FFFF {
                return Err(Error::NumberOutOfRange);
            }
            digits += 1;
        }
        if digits == 0 {
            return Err(Error::InvalidNumber);
        }
        Ok(n)
    }
}

/// A compiled matcher for a single host name pattern.
#[derive(Debug, Clone)]
pub struct HostGlobber {
    pattern: String,
    prefix: bool,
    regex: Regex,
}

impl HostGlobber {
    /// Compile `pattern`. With `prefix`, the pattern need only match a whole
    /// number of leading host elements.
    pub fn new(pattern: &str, prefix: bool) -> Result<Self> {
        let regex = compile_globber(pattern, prefix)?;
        Ok(Self {
            pattern: pattern.to_string(),
            prefix,
            regex,
        })
    }

    /// True iff `hostname` is matched by the pattern.
    pub fn is_match(&self, hostname: &str) -> bool {
        self.regex.is_match(hostname)
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_prefix(&self) -> bool {
        self.prefix
    }
}

impl fmt::Display for HostGlobber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

fn compile_globber(pattern: &str, prefix: bool) -> Result<Regex> {
    let mut scanner = Scanner::new(pattern);
    let mut r = String::from("^");
    let mut buf = [0u8; 4];
    loop {
        if r.len() > MAX_REGEX_LEN {
            return Err(Error::ExpressionTooLarge);
        }
        match scanner.next_segment()? {
            None => break,
            Some(Segment::Star) => r.push_str("[^.]*"),
            Some(Segment::Literal(c)) => r.push_str(&regex::escape(c.encode_utf8(&mut buf))),
            Some(Segment::Set(set)) => {
                r.push_str("(?:");
                for (i, n) in set.iter().enumerate() {
                    if i > 0 {
                        r.push('|');
                    }
                    r.push_str(&n.to_string());
                }
                r.push(')');
            }
        }
    }
    if prefix {
        // Either end of string or a `.` followed by the remaining elements.
        r.push_str(r"(?:\..*)?$");
    } else {
        r.push('$');
    }
    Ok(Regex::new(&r)?)
}

/// A set of host patterns; a host name matches if any pattern matches it.
#[derive(Debug, Clone, Default)]
pub struct HostFilter {
    prefix: bool,
    globbers: Vec<HostGlobber>,
}

impl HostFilter {
    /// Create an empty filter whose patterns all use the same prefix mode.
    pub fn new(prefix: bool) -> Self {
        Self {
            prefix,
            globbers: Vec::new(),
        }
    }

    /// Add a single pattern.
    pub fn insert(&mut self, pattern: &str) -> Result<()> {
        self.globbers.push(HostGlobber::new(pattern, self.prefix)?);
        Ok(())
    }

    /// Add every pattern of a comma-separated multi-pattern.
    pub fn insert_multi(&mut self, patterns: &str) -> Result<()> {
        for p in split_multi_pattern(patterns)? {
            self.insert(&p)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.globbers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.globbers.len()
    }

    /// True iff at least one pattern matches `hostname`.
    pub fn is_match(&self, hostname: &str) -> bool {
        self.globbers.iter().any(|g| g.is_match(hostname))
    }
}

/// Split a comma-separated multi-pattern into its patterns.
///
/// Commas inside brackets belong to the set and do not split.
pub fn split_multi_pattern(s: &str) -> Result<Vec<String>> {
    let mut patterns = Vec::new();
    if s.is_empty() {
        return Ok(patterns);
    }
    let mut inside_brackets = false;
    let mut start: Option<usize> = None;
    for (ix, c) in s.char_indices() {
        match c {
            '[' if inside_brackets => {
                return Err(Error::IllegalPattern("nested brackets".to_string()));
            }
            ']' if !inside_brackets => {
                return Err(Error::IllegalPattern("unmatched end bracket".to_string()));
            }
            ',' if !inside_brackets => {
                let Some(st) = start.take() else {
                    return Err(Error::IllegalPattern("Empty host name".to_string()));
                };
                patterns.push(s[st..ix].to_string());
                continue;
            }
            '[' => inside_brackets = true,
            ']' => inside_brackets = false,
            _ => {}
        }
        if start.is_none() {
            start = Some(ix);
        }
    }
    if inside_brackets {
        return Err(Error::IllegalPattern("Missing end bracket".to_string()));
    }
    match start {
        Some(st) => patterns.push(s[st..].to_string()),
        None => return Err(Error::IllegalPattern("Empty host name".to_string())),
    }
    Ok(patterns)
}

/// Expand a pattern without wildcards into the host names it denotes.
///
/// Names come out in pattern order: `a[1-2].b[3,4]` gives `a1.b3`, `a1.b4`,
/// `a2.b3`, `a2.b4`.
pub fn expand_pattern(pattern: &str) -> Result<Vec<String>> {
    let mut scanner = Scanner::new(pattern);
    let mut names = vec![String::new()];
    while let Some(segment) = scanner.next_segment()? {
        match segment {
            Segment::Star => return Err(Error::WildcardNotAllowed(pattern.to_string())),
            Segment::Literal(c) => names.iter_mut().for_each(|n| n.push(c)),
            Segment::Set(set) => {
                if names.len().saturating_mul(set.len()) > MAX_EXPANSION {
                    return Err(Error::ExpansionTooLarge(pattern.to_string()));
                }
                names = names
                    .iter()
                    .flat_map(|n| set.iter().map(move |x| format!("{}{}", n, x)))
                    .collect();
            }
        }
    }
    Ok(names)
}

/// Compress a list of host names into patterns whose expansion is exactly
/// that list.
///
/// Names with equal tails (everything after the first `.`) whose first
/// elements are `<prefix><number>` with a common prefix are merged:
/// `a1.fox`, `a2.fox`, `a3.fox`, `a5.fox` become `a[1-3,5].fox`.
pub fn compress_hostnames<S: AsRef<str>>(hosts: &[S]) -> Vec<String> {
    let mut names: Vec<Vec<&str>> = hosts
        .iter()
        .map(|h| h.as_ref().split('.').collect())
        .collect();
    names.sort_by(|a, b| a[1..].cmp(&b[1..]).then_with(|| a[0].cmp(b[0])));
    names.dedup();

    let mut results = Vec::new();
    for group in names.chunk_by(|a, b| a[1..] == b[1..]) {
        let tail = &group[0][1..];
        let mut runs: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        let mut heads: Vec<String> = Vec::new();
        for name in group {
            match numeric_suffix(name[0]) {
                Some((prefix, n)) => runs.entry(prefix).or_default().push(n),
                None => heads.push(name[0].to_string()),
            }
        }
        for (prefix, mut numbers) in runs {
            numbers.sort_unstable();
            if numbers.len() == 1 {
                heads.push(format!("{}{}", prefix, numbers[0]));
            } else {
                heads.push(format!("{}[{}]", prefix, compress_range(&numbers)));
            }
        }
        heads.sort();
        for head in heads {
            let mut elements = vec![head.as_str()];
            elements.extend_from_slice(tail);
            results.push(elements.join("."));
        }
    }
    results
}

/// Split `<prefix><digits>` where the prefix is non-empty. Digit strings with
/// leading zeros are rejected since they would not survive expansion.
fn numeric_suffix(element: &str) -> Option<(&str, u64)> {
    let i = element.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if i == 0 || i == element.len() {
        return None;
    }
    let digits = &element[i..];
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    let n = digits.parse::<u64>().ok().filter(|&n| n <= 0xFFFF_FFFF)?;
    Some((&element[..i], n))
}

// `numbers` is sorted and free of duplicates.
fn compress_range(numbers: &[u64]) -> String {
    let mut parts = Vec::new();
    let mut k = 0;
    while k < numbers.len() {
        let mut m = k + 1;
        while m < numbers.len() && numbers[m] == numbers[m - 1] + 1 {
            m += 1;
        }
        if m == k + 1 {
            parts.push(numbers[k].to_string());
        } else {
            parts.push(format!("{}-{}", numbers[k], numbers[m - 1]));
        }
        k = m;
    }
    parts.join(",")
}
