//! # sheetlingo-rewrite
//!
//! Text rewrite capabilities for the sheetlingo engine: translation
//! direction, script detection, glossary substitution, a remote
//! LibreTranslate-compatible client and a client for the asynchronous
//! whole-file job service.
//!
//! [`FallbackRewriter`] combines a fallible primary with the glossary so
//! a failed remote call never stops a run:
//!
//! ```rust,no_run
//! use sheetlingo_rewrite::{Direction, FallbackRewriter, Glossary, RemoteConfig, RemoteRewriter};
//!
//! let remote = RemoteRewriter::new(RemoteConfig::default()).ok();
//! let rewriter = FallbackRewriter::new(remote, Glossary::builtin());
//! let out = rewriter.rewrite_with_outcome("발주서", Direction::KoreanToChinese);
//! assert_eq!(out.text, "订单书");
//! ```

pub mod direction;
pub mod error;
pub mod glossary;
mod http;
pub mod job;
pub mod remote;
pub mod rewriter;
pub mod script;

pub use direction::Direction;
pub use error::{RewriteError, RewriteResult};
pub use glossary::{Glossary, Term};
pub use job::{JobClient, JobClientConfig, JobHandle, JobOutput, JobRequest, JobStatus};
pub use remote::{RemoteConfig, RemoteRewriter, DEFAULT_ENDPOINTS};
pub use rewriter::{FallbackRewriter, LocalRewrite, Offline, Outcome, Rewritten, TextRewriter};
pub use script::{contains_han, contains_hangul, looks_english};
