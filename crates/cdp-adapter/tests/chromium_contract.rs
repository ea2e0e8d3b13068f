//! Contract tests against a real Chromium binary. Ignored by default because they need
//! Chrome or Chromium on the host.
//!
//! Run with:
//! ```bash
//! export SMOKEPROBE_CDP_CONTRACT=1
//! cargo test -p cdp-adapter --test chromium_contract -- --ignored --nocapture
//! ```

use std::env;
use std::time::Duration;

use cdp_adapter::{BrowserDriver, ChromiumDriver, DriverConfig, VIDEO_EXTENSION};

fn contract_enabled() -> bool {
    env::var("SMOKEPROBE_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

const PAGE: &str = "data:text/html,<title>contract</title><input id='q'><button id='go' onclick=\"document.title='clicked'\">go</button><div id='ghost' style='display:none'>x</div>";

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SMOKEPROBE_CDP_CONTRACT=1"]
async fn contract_click_fill_and_visibility() {
    if !contract_enabled() {
        eprintln!("skipping chromium contract test (SMOKEPROBE_CDP_CONTRACT not enabled)");
        return;
    }

    let videos = tempfile::tempdir().expect("tempdir");
    let config = DriverConfig {
        video_dir: Some(videos.path().to_path_buf()),
        ..DriverConfig::default()
    };
    let driver = ChromiumDriver::launch(config)
        .await
        .expect("launch chromium");

    driver
        .navigate(PAGE, Duration::from_secs(15))
        .await
        .expect("navigate");
    assert_eq!(driver.title().await.expect("title"), "contract");

    driver
        .fill("#q", "hello", Duration::from_secs(2))
        .await
        .expect("fill");
    let value = driver
        .evaluate("document.querySelector('#q').value")
        .await
        .expect("read value");
    assert_eq!(value.as_str(), Some("hello"));

    driver
        .click("#go", Duration::from_secs(2))
        .await
        .expect("click");
    assert_eq!(driver.title().await.expect("title"), "clicked");

    let hidden = driver
        .wait_visible("#ghost", Duration::from_millis(300))
        .await
        .expect_err("hidden element");
    assert_eq!(hidden.kind, cdp_adapter::AdapterErrorKind::NotVisible);

    let missing = driver
        .wait_visible("#absent", Duration::from_millis(300))
        .await
        .expect_err("missing element");
    assert_eq!(missing.kind, cdp_adapter::AdapterErrorKind::TargetNotFound);

    let shot = driver.screenshot().await.expect("screenshot");
    assert!(shot.starts_with(b"\x89PNG"));

    driver.shutdown().await.expect("shutdown");

    let recorded = std::fs::read_dir(videos.path())
        .expect("read video dir")
        .filter_map(Result::ok)
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some(VIDEO_EXTENSION));
    assert!(recorded, "expected a screencast file");
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SMOKEPROBE_CDP_CONTRACT=1"]
async fn contract_unresolvable_host_reports_net_error() {
    if !contract_enabled() {
        eprintln!("skipping chromium contract test (SMOKEPROBE_CDP_CONTRACT not enabled)");
        return;
    }

    let driver = ChromiumDriver::launch(DriverConfig::default())
        .await
        .expect("launch chromium");
    let err = driver
        .navigate("http://smokeprobe.invalid/", Duration::from_secs(15))
        .await
        .expect_err("navigation should fail");
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"), "{err}");
    driver.shutdown().await.expect("shutdown");
}
