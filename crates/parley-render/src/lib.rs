//! Content dispatch and presentation for Parley transcripts.

pub mod asset;
pub mod chrome;
pub mod dispatch;
pub mod graph;
pub mod node;
pub mod table;
pub mod terminal;
pub mod transcript;

pub use chrome::Chrome;
pub use dispatch::render;
pub use node::{NodeKind, RenderNode};
pub use transcript::{TranscriptView, render_transcript};
