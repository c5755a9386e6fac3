//! Page text acquisition and normalization.

mod acquire;
mod normalize;

pub use acquire::{PageText, TextAcquirer, TextSource};
pub use normalize::{NormalizedLines, clean, normalize};

#[cfg(test)]
pub(crate) use acquire::tests::{BlankRenderer, ScriptedOcr};
