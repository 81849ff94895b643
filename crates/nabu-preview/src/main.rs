//! Interactive preview for nabu shader programs.
//!
//! `nabu-preview [VERTEX] [FRAGMENT]`: with one path the file is a fragment
//! stage linked against the built-in vertex stage; with none, a demo gradient
//! is shown. Escape quits, S saves the current frame as a PNG.

mod app;
mod snapshot;
mod source;
mod surface;

use anyhow::Result;
use nabu_engine::logging::{init_logging, LoggingConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let sources = source::ShaderSources::from_args(std::env::args().skip(1))?;
    app::run(sources)
}
