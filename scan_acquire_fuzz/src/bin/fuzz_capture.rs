use honggfuzz::fuzz;
use scan_acquire::capture::{Capture, CaptureConfig, CaptureOutcome};
use scan_acquire::device::ScanContext;
use scan_acquire::raster::ImageHolder;
use scan_acquire_fuzz::ScriptedScan;
use std::sync::Arc;

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let context = ScanContext::new();
    loop {
        fuzz!(|input: ScriptedScan| {
            rt.block_on(async {
                let device = Arc::new(context.open_device("fuzz", input.source()).unwrap());
                let holder = ImageHolder::new();
                let config = CaptureConfig {
                    height_hint: input.height_hint.map(u32::from),
                    ..CaptureConfig::default()
                };
                let outcome = Capture::with_config(device, holder.clone(), config)
                    .run()
                    .await;

                if input.width == 0 || input.fails() {
                    assert!(matches!(outcome, CaptureOutcome::Failed(_)));
                } else {
                    assert_eq!(outcome, CaptureOutcome::Finished);
                    let (width, height) = holder.dimensions().unwrap();
                    assert_eq!(width, input.width as u32);
                    assert_eq!(height, input.expected_height());
                }
            });
        });
    }
}
