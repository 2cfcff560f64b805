//! Timer drivers for the playback engine.

use super::engine::PlaybackEngine;

/// Tick the engine on a tokio timer until it disarms (pause, stop, end of
/// recording or dispose).
///
/// Returns immediately if the engine is not playing.
pub async fn drive(engine: &mut PlaybackEngine) {
    while let Some(delay) = engine.next_tick_in() {
        tokio::time::sleep(delay).await;
        let _ = engine.tick();
    }
}

/// Tick the engine using its clock's `sleep` until it disarms.
///
/// With a [`ManualClock`](crate::clock::ManualClock) this renders a whole
/// recording instantly and deterministically.
pub fn drive_blocking(engine: &mut PlaybackEngine) {
    while let Some(delay) = engine.next_tick_in() {
        engine.clock().sleep(delay);
        let _ = engine.tick();
    }
}
