//! Playback engine benchmarks.
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shellcast::playback::drive_blocking;
use shellcast::recording::{deserialize_recording_file, serialize_recording_file};
use shellcast::{
    ManualClock, PlaybackCallbacks, PlaybackEngine, RecordingEvent, RecordingFile,
    RecordingMetadata, TerminalSize,
};

const START: i64 = 1_700_000_000_000;

fn recording(events: usize) -> RecordingFile {
    let events = (0..events)
        .map(|i| {
            let ts = START + i64::try_from(i).unwrap_or(i64::MAX) * 10;
            RecordingEvent::output(ts, format!("line {i}\r\n").into_bytes())
        })
        .collect();
    RecordingFile::new(
        RecordingMetadata::new("bench", "bench", START, TerminalSize::default()),
        events,
    )
}

fn bench_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek");
    for size in [1_000usize, 10_000, 100_000] {
        let mut engine = PlaybackEngine::new(ManualClock::shared(0));
        engine.load(recording(size));
        let target = START + i64::try_from(size).unwrap_or(0) * 5;
        group.bench_with_input(BenchmarkId::from_parameter(size), &target, |b, &target| {
            b.iter(|| engine.seek(black_box(target)));
        });
    }
    group.finish();
}

fn bench_full_playback(c: &mut Criterion) {
    let file = recording(10_000);
    c.bench_function("drive_blocking_10k_events", |b| {
        b.iter(|| {
            let mut engine = PlaybackEngine::new(ManualClock::shared(0))
                .with_callbacks(PlaybackCallbacks::new().on_output(|bytes| {
                    black_box(bytes);
                }));
            engine.load(file.clone());
            let _ = engine.set_playback_speed(4.0);
            let _ = engine.play();
            drive_blocking(&mut engine);
        });
    });
}

fn bench_codec(c: &mut Criterion) {
    let file = recording(5_000);
    let json = serialize_recording_file(&file).unwrap_or_default();

    c.bench_function("serialize_5k_events", |b| {
        b.iter(|| serialize_recording_file(black_box(&file)));
    });
    c.bench_function("deserialize_5k_events", |b| {
        b.iter(|| deserialize_recording_file(black_box(&json)));
    });
}

criterion_group!(benches, bench_seek, bench_full_playback, bench_codec);
criterion_main!(benches);
