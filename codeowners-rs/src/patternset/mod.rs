//! Matching of CODEOWNERS patterns. All patterns in a set are compiled into a
//! single NFA whose transitions consume one path segment at a time, so a path
//! is checked against every pattern in one pass.

mod builder;
mod matcher;
mod nfa;

pub use self::builder::Builder;
pub use self::matcher::Matcher;
