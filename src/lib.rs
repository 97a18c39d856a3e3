mod analysis;
mod batch;
mod discovery;
mod midi_importer;
mod model;
mod util;
mod writer;

pub use analysis::beat_accuracy::*;
pub use analysis::extractor::*;
pub use batch::*;
pub use discovery::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::score::*;
pub use model::statistics::*;
pub use util::*;
pub use writer::*;
