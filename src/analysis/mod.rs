pub mod beat_accuracy;
pub mod extractor;
