//! Resolution of the effective signal.

use log::debug;

use super::grammar::{MarkdownGrammar, SignalGrammar};
use super::types::{MarkerMatch, ParsedProgress, Signal};

/// Turns progress document text into its single effective signal.
pub struct SignalParser {
    grammar: Box<dyn SignalGrammar>,
}

impl Default for SignalParser {
    fn default() -> Self {
        Self::new(Box::new(MarkdownGrammar))
    }
}

impl SignalParser {
    pub fn new(grammar: Box<dyn SignalGrammar>) -> Self {
        Self { grammar }
    }

    /// Parse the full document text.
    ///
    /// The marker with the greatest offset wins regardless of kind, so the
    /// agent's latest statement overrides everything before it. Markers at
    /// the same offset go to the later-declared kind. No markers at all
    /// means `Continue`.
    pub fn parse(&self, text: &str) -> ParsedProgress {
        let markers = self.grammar.markers(text);
        let signal = Self::resolve(&markers);
        let iteration_count = self.grammar.iteration_count(text);

        debug!(
            "Parsed {} marker(s), {} iteration(s), effective {:?}",
            markers.len(),
            iteration_count,
            signal.kind()
        );

        ParsedProgress {
            signal,
            iteration_count,
        }
    }

    fn resolve(markers: &[MarkerMatch]) -> Signal {
        markers
            .iter()
            .max_by_key(|m| (m.offset, m.kind))
            .map(Signal::from_marker)
            .unwrap_or(Signal::Continue)
    }
}

/// Convenience function to parse with the markdown grammar.
pub fn parse_progress(text: &str) -> ParsedProgress {
    SignalParser::default().parse(text)
}
