use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use resynth_core::{ControlPoint, Partial, RealtimeSynthesizer, SynthParams};

struct CountingAllocator;

static TRACK_ALLOCATIONS: AtomicBool = AtomicBool::new(false);
static ALLOC_CALLS: AtomicUsize = AtomicUsize::new(0);
static REALLOC_CALLS: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: CountingAllocator = CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            ALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            ALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
        }
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            REALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
        }
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

fn begin_alloc_tracking() {
    ALLOC_CALLS.store(0, Ordering::Relaxed);
    REALLOC_CALLS.store(0, Ordering::Relaxed);
    TRACK_ALLOCATIONS.store(true, Ordering::SeqCst);
}

fn end_alloc_tracking() -> (usize, usize) {
    TRACK_ALLOCATIONS.store(false, Ordering::SeqCst);
    (
        ALLOC_CALLS.load(Ordering::Relaxed),
        REALLOC_CALLS.load(Ordering::Relaxed),
    )
}

/// Overlapping partials with staggered starts so admission and retirement
/// both happen while tracking.
fn partial_cloud(count: usize) -> Vec<Partial> {
    (0..count)
        .map(|i| {
            let start = i as f64 * 0.01;
            let frequency = 110.0 * (1 + i % 12) as f64;
            Partial::new(vec![
                ControlPoint::new(start, frequency, 0.05, 0.2, 0.0),
                ControlPoint::new(start + 0.05, frequency * 1.01, 0.04, 0.4, 0.0),
                ControlPoint::new(start + 0.12, frequency, 0.0, 0.1, 0.0),
            ])
            .with_label(i as i32)
        })
        .collect()
}

#[test]
fn synthesize_next_does_not_allocate() {
    let params = SynthParams::new(44100.0).with_noise_seed(9);
    let mut synth = RealtimeSynthesizer::new(params).unwrap();
    synth.setup(&partial_cloud(48)).unwrap();
    synth.prepare_for_note(1.25).unwrap();
    let mut buffer = vec![0.0; synth.required_len()];

    begin_alloc_tracking();
    while !synth.is_finished() {
        synth.synthesize_next(&mut buffer, 256);
    }
    synth.rewind();
    synth.synthesize_next(&mut buffer, 512);
    synth.clear_partials_being_processed();
    let (alloc_calls, realloc_calls) = end_alloc_tracking();

    assert_eq!(alloc_calls, 0, "synthesize_next allocated {alloc_calls} times");
    assert_eq!(realloc_calls, 0, "synthesize_next reallocated {realloc_calls} times");
    assert!(buffer.iter().any(|s| s.abs() > 0.01));
}
