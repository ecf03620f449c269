//! Cues and `sync`
//!
//! Every inbound OSC message becomes a [`Cue`] on a broadcast [`CueBus`].
//! Loops hold a [`CueReceiver`] and `sync` on an OSC address pattern: the
//! call suspends until the next cue whose path matches.
//!
//! Inbound paths carry the sender's address the way Sonic Pi presents them,
//! so `/synth` from `127.0.0.1:50123` is seen as
//! `/osc:127.0.0.1:50123/synth` and matches the pattern `/osc*/synth`.

use regex::Regex;
use rosc::OscType;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Cues buffered per receiver before the slowest one starts lagging
pub const DEFAULT_CAPACITY: usize = 256;

/// An inbound message as the loops see it
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub path: String,
    pub args: Vec<OscType>,
}

impl Cue {
    pub fn new(path: impl Into<String>, args: Vec<OscType>) -> Self {
        Self {
            path: path.into(),
            args,
        }
    }
}

/// Path under which a message from `source` is cued
pub fn osc_path(source: SocketAddr, addr: &str) -> String {
    format!("/osc:{}:{}{}", source.ip(), source.port(), addr)
}

/// Invalid OSC address pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// Pattern does not start with `/`
    NotAbsolute(String),
    /// `[` or `{` without its closing bracket
    Unclosed(char),
    /// Translated pattern was rejected by the regex engine
    Invalid(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::NotAbsolute(p) => write!(f, "Address pattern must start with '/': {}", p),
            PatternError::Unclosed(c) => write!(f, "Unclosed '{}' in address pattern", c),
            PatternError::Invalid(msg) => write!(f, "Invalid address pattern: {}", msg),
        }
    }
}

impl std::error::Error for PatternError {}

/// OSC 1.0 address pattern: `*`, `?`, `[abc]`, `[a-z]`, `[!abc]`, `{foo,bar}`
#[derive(Debug, Clone)]
pub struct AddressPattern {
    source: String,
    regex: Regex,
}

impl AddressPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        }

        let mut re = String::from("^");
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => re.push_str("[^/]*"),
                '?' => re.push_str("[^/]"),
                '[' => {
                    re.push('[');
                    if chars.peek() == Some(&'!') {
                        chars.next();
                        re.push('^');
                    }
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some('-') => re.push('-'),
                            Some(ch) => re.push_str(&regex::escape(&ch.to_string())),
                            None => return Err(PatternError::Unclosed('[')),
                        }
                    }
                    re.push(']');
                }
                '{' => {
                    let mut alternatives = Vec::new();
                    let mut current = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(',') => alternatives.push(std::mem::take(&mut current)),
                            Some(ch) => current.push(ch),
                            None => return Err(PatternError::Unclosed('{')),
                        }
                    }
                    alternatives.push(current);
                    let escaped: Vec<String> =
                        alternatives.iter().map(|a| regex::escape(a)).collect();
                    re.push_str(&format!("(?:{})", escaped.join("|")));
                }
                other => re.push_str(&regex::escape(&other.to_string())),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| PatternError::Invalid(e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Broadcast bus for inbound cues
#[derive(Clone)]
pub struct CueBus {
    tx: broadcast::Sender<Arc<Cue>>,
}

impl CueBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Deliver a cue to every receiver, returning how many there were
    pub fn publish(&self, cue: Cue) -> usize {
        // No subscribers is fine: nobody is syncing yet
        self.tx.send(Arc::new(cue)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> CueReceiver {
        CueReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CueBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One loop's view of the cue bus
pub struct CueReceiver {
    rx: broadcast::Receiver<Arc<Cue>>,
}

impl CueReceiver {
    /// Wait for the next cue matching `pattern`; `None` once the bus is gone
    pub async fn sync(&mut self, pattern: &AddressPattern) -> Option<Arc<Cue>> {
        loop {
            match self.rx.recv().await {
                Ok(cue) if pattern.matches(&cue.path) => return Some(cue),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!("Cue receiver for {} lagged, {} cues dropped", pattern, missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
