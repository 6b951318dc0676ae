//! Markup serialization
//!
//! Converts documents to and from the HTML subset exchanged with the host:
//!
//! - Blocks: `p`, `h1`, `h2`, `ul`, `ol`, `li`, `table` (`thead`, `tbody`,
//!   `tr`, `td`, `th`) and `img[src][width]`, with `style="text-align: …"`
//!   on paragraphs and headings
//! - Marks: `strong`/`b`, `em`/`i`, `u`, `sub`, `sup` and `a[href]`
//!
//! Parsing is lenient. Unknown elements are dropped while their text is kept,
//! `h3`-`h6` become paragraphs, and an image inside a paragraph splits it.
//! Rendering is deterministic, so `parse(&render(&doc))` reproduces any
//! document built through editing commands.

mod dom;
mod lexer;
mod parser;
mod render;

pub use parser::parse;
pub use render::render;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
