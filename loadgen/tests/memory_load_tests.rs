use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vmscale_loadgen::memory::generate_memory_load;
use vmscale_loadgen::{Intensity, MemoryLoadPlan};

const MB: u64 = 1024 * 1024;

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_hold_releases_everything() {
    let plan = MemoryLoadPlan::new(32 * MB, Intensity::new(50).unwrap(), Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    let handle = tokio::spawn(async move { generate_memory_load(&plan, &token).await });

    // 16 MiB is two chunks, so allocation is done well before 10s.
    tokio::time::sleep(Duration::from_secs(10)).await;
    cancel.cancel();

    let report = handle.await.unwrap().unwrap();
    assert!(report.interrupted);
    assert_eq!(report.peak_allocated_bytes, 16 * MB);
    assert_eq!(report.retained_bytes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_allocation_releases_everything() {
    let plan = MemoryLoadPlan::new(400 * MB, Intensity::new(100).unwrap(), Duration::from_secs(60))
        .with_chunk_size(MB as usize);
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    let handle = tokio::spawn(async move { generate_memory_load(&plan, &token).await });

    tokio::time::sleep(Duration::from_millis(1_750)).await;
    cancel.cancel();

    let report = handle.await.unwrap().unwrap();
    assert!(report.interrupted);
    assert!(report.chunks < 400);
    assert!(report.peak_allocated_bytes < report.target_bytes);
    assert_eq!(report.retained_bytes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_never_allocates_beyond_target() {
    let total = 8 * MB + 123;
    for percent in [1u8, 7, 33, 50, 99, 100] {
        let plan = MemoryLoadPlan::new(total, Intensity::new(percent).unwrap(), Duration::from_secs(120))
            .with_chunk_size(MB as usize)
            .with_chunk_pause(Duration::from_millis(10));
        let report = generate_memory_load(&plan, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.target_bytes, total * u64::from(percent) / 100);
        assert!(report.peak_allocated_bytes <= report.target_bytes);
        assert_eq!(report.peak_allocated_bytes, report.target_bytes);
        assert_eq!(report.retained_bytes, 0);
    }
}
