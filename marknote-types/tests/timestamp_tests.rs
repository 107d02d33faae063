use marknote_types::{mtime_epoch, unix_now};

#[test]
fn unix_now_is_recent() {
    // 2023-01-01 as a floor; anything earlier means the clock math broke.
    assert!(unix_now() > 1_672_531_200);
}

#[test]
fn mtime_epoch_of_fresh_file_is_recent() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("marknote_ts_test_{}.tmp", std::process::id()));
    std::fs::write(&path, b"x").unwrap();

    let metadata = std::fs::metadata(&path).unwrap();
    let mtime = mtime_epoch(&metadata);
    let now = unix_now();
    assert!(mtime <= now + 1);
    assert!(mtime > now.saturating_sub(60));

    std::fs::remove_file(&path).ok();
}
