//! Local emulation of the notification cascade.
//!
//! A deployed pipeline chains stages through storage notifications. Here the
//! notification for each write is built and handed straight to the next
//! stage, so the same handlers run in the same order.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::HandlerError;
use crate::handler::StageHandler;
use crate::invocation::notification;
use crate::metrics::MetricsRecord;
use crate::stage::Stage;
use crate::storage::{ObjectStore, StorageLocation};

/// Records from every stage that ran, and where the last one wrote.
#[derive(Debug, Clone)]
pub struct ChainRun {
    pub records: Vec<MetricsRecord>,
    pub output: StorageLocation,
}

/// Run every stage from the one `start` triggers through grayscale.
///
/// The first failing stage stops the chain and its error is returned; the
/// objects written by earlier stages stay in place.
pub fn run_chain(
    start: &StorageLocation,
    store: Arc<dyn ObjectStore>,
    config: &PipelineConfig,
) -> Result<ChainRun, HandlerError> {
    let Some(first) = Stage::for_key(&start.key) else {
        return Err(HandlerError::Validation(format!(
            "{} is not under input/, stage1/ or stage2/",
            start.key
        )));
    };

    let mut location = start.clone();
    let mut records = Vec::new();
    let mut next = Some(first);
    while let Some(stage) = next {
        let handler = StageHandler::from_config(stage, store.clone(), config);
        log::debug!("chain: {} <- {}", handler.stage(), location);
        records.push(handler.handle(&notification(&location))?);
        location = stage.next_location(&location);
        next = stage.next();
    }

    log::info!("chain finished at {} after {} stage(s)", location, records.len());
    Ok(ChainRun {
        records,
        output: location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_chain_from_middle_runs_remaining_stages() {
        let store = Arc::new(MemoryStore::new());
        let start = StorageLocation::new("b", "stage1/pic.jpg");
        store.insert(start.clone(), jpeg_bytes(6, 4), "image/jpeg");

        let run = run_chain(&start, store.clone(), &PipelineConfig::default()).unwrap();

        assert_eq!(run.output, StorageLocation::new("b", "output/pic.jpg"));
        assert_eq!(run.records.len(), 2);
        assert_eq!(run.records[0]["pipeline_stage"], "resize");
        assert_eq!(run.records[1]["new_file"], "output/pic.jpg");
        assert_eq!(
            store.keys("b"),
            vec!["output/pic.jpg", "stage1/pic.jpg", "stage2/pic.jpg"]
        );
    }

    #[test]
    fn test_chain_rejects_untriggered_prefix() {
        let store = Arc::new(MemoryStore::new());
        let start = StorageLocation::new("b", "output/pic.jpg");

        let err = run_chain(&start, store, &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let store = Arc::new(MemoryStore::new());
        let start = StorageLocation::new("b", "input/missing.jpg");

        let err = run_chain(&start, store.clone(), &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "StorageError");
        assert!(store.is_empty());
    }
}
