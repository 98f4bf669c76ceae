//! Rewrite capability traits and the remote-then-local composition

use crate::direction::Direction;
use crate::error::{RewriteError, RewriteResult};
use crate::glossary::Glossary;

/// A capability that rewrites one piece of text for a direction.
///
/// Implementations may block (network round trip) and may fail.
pub trait TextRewriter {
    fn rewrite(&self, text: &str, direction: Direction) -> RewriteResult<String>;
}

impl<T: TextRewriter + ?Sized> TextRewriter for &T {
    fn rewrite(&self, text: &str, direction: Direction) -> RewriteResult<String> {
        (**self).rewrite(text, direction)
    }
}

impl<T: TextRewriter + ?Sized> TextRewriter for Box<T> {
    fn rewrite(&self, text: &str, direction: Direction) -> RewriteResult<String> {
        (**self).rewrite(text, direction)
    }
}

/// A best-effort rewrite that cannot fail
pub trait LocalRewrite {
    fn rewrite_local(&self, text: &str, direction: Direction) -> String;
}

impl LocalRewrite for Glossary {
    fn rewrite_local(&self, text: &str, direction: Direction) -> String {
        self.apply(text, direction)
    }
}

impl<T: LocalRewrite + ?Sized> LocalRewrite for &T {
    fn rewrite_local(&self, text: &str, direction: Direction) -> String {
        (**self).rewrite_local(text, direction)
    }
}

/// Placeholder primary for purely local rewriting; always unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl TextRewriter for Offline {
    fn rewrite(&self, _text: &str, _direction: Direction) -> RewriteResult<String> {
        Err(RewriteError::NoEndpoints)
    }
}

/// Which stage produced a rewrite
#[derive(Debug)]
pub enum Outcome {
    /// No source-script text; returned as is
    Unchanged,
    /// The local rewrite covered the text, or no primary is configured
    Local,
    /// The primary capability answered
    Primary,
    /// The primary failed and the local rewrite was used instead
    Fallback(RewriteError),
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback(_))
    }
}

#[derive(Debug)]
pub struct Rewritten {
    pub text: String,
    pub outcome: Outcome,
}

/// Two-stage rewrite: a fallible primary with a local fallback.
///
/// Text without any source-script character is returned untouched. The
/// local rewrite runs first; when it leaves no source-script text behind
/// its result is used without a round trip. Otherwise the primary is
/// asked, and any failure falls through to the local result.
#[derive(Debug, Clone)]
pub struct FallbackRewriter<P, F> {
    primary: Option<P>,
    fallback: F,
}

impl<P, F> FallbackRewriter<P, F> {
    pub fn new(primary: Option<P>, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> Option<&P> {
        self.primary.as_ref()
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<F> FallbackRewriter<Offline, F> {
    /// Local rewriting only
    pub fn local(fallback: F) -> Self {
        Self::new(None, fallback)
    }
}

impl<P: TextRewriter, F: LocalRewrite> FallbackRewriter<P, F> {
    /// Rewrite and report which stage produced the text
    pub fn rewrite_with_outcome(&self, text: &str, direction: Direction) -> Rewritten {
        if !direction.has_source_script(text) {
            return Rewritten {
                text: text.to_string(),
                outcome: Outcome::Unchanged,
            };
        }

        let local = self.fallback.rewrite_local(text, direction);
        let covered = local != text && !direction.has_source_script(&local);

        let primary = match &self.primary {
            Some(primary) if !covered => primary,
            _ => {
                return Rewritten {
                    text: local,
                    outcome: Outcome::Local,
                }
            }
        };

        match primary.rewrite(text, direction) {
            Ok(rewritten) => Rewritten {
                text: rewritten,
                outcome: Outcome::Primary,
            },
            Err(e) => {
                log::debug!("Rewrite of {:?} failed, using glossary: {}", text, e);
                Rewritten {
                    text: local,
                    outcome: Outcome::Fallback(e),
                }
            }
        }
    }
}

impl<P: TextRewriter, F: LocalRewrite> TextRewriter for FallbackRewriter<P, F> {
    fn rewrite(&self, text: &str, direction: Direction) -> RewriteResult<String> {
        Ok(self.rewrite_with_outcome(text, direction).text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Counts calls; answers with a fixed string or fails
    struct Scripted {
        answer: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn ok(answer: &'static str) -> Self {
            Self {
                answer: Some(answer),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                calls: Cell::new(0),
            }
        }
    }

    impl TextRewriter for Scripted {
        fn rewrite(&self, _text: &str, _direction: Direction) -> RewriteResult<String> {
            self.calls.set(self.calls.get() + 1);
            match self.answer {
                Some(a) => Ok(a.to_string()),
                None => Err(RewriteError::Network("connection refused".into())),
            }
        }
    }

    #[test]
    fn test_non_source_text_skips_everything() {
        let primary = Scripted::ok("x");
        let r = FallbackRewriter::new(Some(&primary), Glossary::builtin());
        let out = r.rewrite_with_outcome("订单书", Direction::KoreanToChinese);
        assert_eq!(out.text, "订单书");
        assert!(matches!(out.outcome, Outcome::Unchanged));
        assert_eq!(primary.calls.get(), 0);
    }

    #[test]
    fn test_glossary_covered_text_skips_primary() {
        let primary = Scripted::ok("x");
        let r = FallbackRewriter::new(Some(&primary), Glossary::builtin());
        let out = r.rewrite_with_outcome("발주서", Direction::KoreanToChinese);
        assert_eq!(out.text, "订单书");
        assert!(matches!(out.outcome, Outcome::Local));
        assert_eq!(primary.calls.get(), 0);
    }

    #[test]
    fn test_primary_used_for_uncovered_text() {
        let primary = Scripted::ok("你好");
        let r = FallbackRewriter::new(Some(&primary), Glossary::builtin());
        let out = r.rewrite_with_outcome("안녕하세요", Direction::KoreanToChinese);
        assert_eq!(out.text, "你好");
        assert!(matches!(out.outcome, Outcome::Primary));
        assert_eq!(primary.calls.get(), 1);
    }

    #[test]
    fn test_primary_failure_falls_back() {
        let primary = Scripted::failing();
        let r = FallbackRewriter::new(Some(&primary), Glossary::builtin());
        let out = r.rewrite_with_outcome("품목 안내", Direction::KoreanToChinese);
        assert_eq!(out.text, "品目 안내");
        assert!(out.outcome.is_fallback());
        assert!(matches!(
            out.outcome,
            Outcome::Fallback(RewriteError::Network(_))
        ));

        // The trait surface never fails
        assert_eq!(
            r.rewrite("품목 안내", Direction::KoreanToChinese).unwrap(),
            "品目 안내"
        );
    }

    #[test]
    fn test_local_only() {
        let r = FallbackRewriter::local(Glossary::builtin());
        let out = r.rewrite_with_outcome("안녕 수량", Direction::KoreanToChinese);
        assert_eq!(out.text, "안녕 数量");
        assert!(matches!(out.outcome, Outcome::Local));
        assert!(r.primary().is_none());
    }
}
