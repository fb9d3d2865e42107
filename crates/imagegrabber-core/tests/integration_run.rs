//! Integration tests: full runs against a local HTTP server.
//!
//! Each test serves one or more pages, runs the controller into a temp dir and
//! checks files on disk, counters, console lines and request counts.

mod common;

use common::image_server::ImageServer;
use imagegrabber_core::config::GrabberConfig;
use imagegrabber_core::report::{RunEvent, RunStats};
use imagegrabber_core::run::run;
use tempfile::{tempdir, TempDir};

struct Fixture {
    download_dir: TempDir,
    _state_dir: TempDir,
    config: GrabberConfig,
}

fn fixture() -> Fixture {
    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let config = GrabberConfig {
        lock_path: Some(state_dir.path().join("gate.lock")),
        ..GrabberConfig::default()
    };
    Fixture {
        download_dir,
        _state_dir: state_dir,
        config,
    }
}

fn run_collecting(fx: &Fixture, urls: &[String]) -> (anyhow::Result<RunStats>, Vec<RunEvent>) {
    let mut events = Vec::new();
    let res = run(&fx.config, fx.download_dir.path(), urls, |e| events.push(e.clone()));
    (res, events)
}

fn dir_entries(fx: &Fixture) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(fx.download_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn retry_count(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RunEvent::Retry { .. }))
        .count()
}

#[test]
fn single_image_is_downloaded() {
    let server = ImageServer::start();
    let image: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
    server.serve("/a.png", image.clone());
    let page = format!("<html>\n<a href=\"{}\">A</a>\n</html>\n", server.url("/a.png"));
    server.serve("/index.html", page);

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/index.html")]);
    let stats = res.expect("run succeeds");

    assert_eq!(
        stats,
        RunStats {
            downloaded: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(std::fs::read(fx.download_dir.path().join("a.png")).unwrap(), image);
    assert_eq!(dir_entries(&fx), vec!["a.png"]);

    let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            format!("Retrieving URL \"{}\"...", server.url("/index.html")),
            format!("Downloading image:  {}", server.url("/a.png")),
            "1 downloaded, 0 skipped, 0 failed.".to_string(),
            "Done.".to_string(),
        ]
    );
}

#[test]
fn shared_image_across_pages_is_fetched_once() {
    let server = ImageServer::start();
    server.serve("/img/shared.jpg", b"shared-bytes".to_vec());
    let page = format!("<a href=\"{}\">s</a>\n", server.url("/img/shared.jpg"));
    server.serve("/one.html", page.clone());
    server.serve("/two.html", page);

    let fx = fixture();
    let (res, _) = run_collecting(&fx, &[server.url("/one.html"), server.url("/two.html")]);
    let stats = res.unwrap();

    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(server.hits("/img/shared.jpg"), 1);
}

#[test]
fn existing_file_is_skipped_without_request() {
    let server = ImageServer::start();
    server.serve("/pic.gif", b"remote".to_vec());
    server.serve("/p.html", format!("<a href=\"{}\">", server.url("/pic.gif")));

    let fx = fixture();
    std::fs::write(fx.download_dir.path().join("pic.gif"), b"local").unwrap();
    let (res, events) = run_collecting(&fx, &[server.url("/p.html")]);
    let stats = res.unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.downloaded, 0);
    assert_eq!(server.hits("/pic.gif"), 0);
    assert_eq!(std::fs::read(fx.download_dir.path().join("pic.gif")).unwrap(), b"local");
    assert!(events.contains(&RunEvent::SkippingExisting {
        filename: "pic.gif".to_string()
    }));
}

#[test]
fn succeeds_on_fifth_attempt_after_four_retries() {
    let server = ImageServer::start();
    server.serve_flaky("/flaky.png", b"finally".to_vec(), 4);
    server.serve("/p.html", format!("<a href=\"{}\">", server.url("/flaky.png")));

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/p.html")]);
    let stats = res.unwrap();

    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(retry_count(&events), 4);
    assert_eq!(server.hits("/flaky.png"), 5);
    assert_eq!(
        std::fs::read(fx.download_dir.path().join("flaky.png")).unwrap(),
        b"finally"
    );
    assert!(!events.contains(&RunEvent::Failed));
}

#[test]
fn image_failing_every_attempt_counts_as_failed() {
    let server = ImageServer::start();
    // No route for /missing.jpg: every request gets 404.
    server.serve(
        "/p.html",
        format!(
            "<a href=\"{}\">\n<a href=\"{}\">\n",
            server.url("/missing.jpg"),
            server.url("/ok.jpg")
        ),
    );
    server.serve("/ok.jpg", b"ok".to_vec());

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/p.html")]);
    let stats = res.expect("a failed image does not end the run");

    assert_eq!(
        stats,
        RunStats {
            downloaded: 1,
            skipped: 0,
            failed: 1
        }
    );
    assert_eq!(server.hits("/missing.jpg"), 5);
    assert_eq!(retry_count(&events), 5);
    let retries: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Retry { attempt } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![1, 2, 3, 4, 5]);
    assert!(events.contains(&RunEvent::Failed));
    assert_eq!(dir_entries(&fx), vec!["ok.jpg"]);
}

#[test]
fn link_without_slash_is_reported_and_not_counted() {
    let server = ImageServer::start();
    server.serve("/p.html", "<a href=\"local.gif\">here</a>\n");

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/p.html")]);
    let stats = res.unwrap();

    assert_eq!(stats, RunStats::default());
    assert!(events.contains(&RunEvent::InvalidLink {
        link: "local.gif".to_string()
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, RunEvent::Downloading { .. })));
}

#[test]
fn unreachable_page_ends_the_run() {
    let server = ImageServer::start();
    server.serve("/good.html", format!("<a href=\"{}\">", server.url("/x.png")));
    server.serve("/x.png", b"x".to_vec());

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/absent.html"), server.url("/good.html")]);

    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("failed to retrieve"));
    assert_eq!(server.hits("/absent.html"), 1);
    assert_eq!(server.hits("/good.html"), 0);
    assert!(!events.iter().any(|e| matches!(e, RunEvent::Summary(_))));
}

#[test]
fn sanitized_mode_strips_query_string() {
    let server = ImageServer::start();
    server.serve("/img/photo.jpg?v=2.png", b"big".to_vec());
    server.serve(
        "/p.html",
        format!("<a href=\"{}\">", server.url("/img/photo.jpg?v=2.png")),
    );

    let mut fx = fixture();
    fx.config.sanitize_filenames = true;
    let (res, _) = run_collecting(&fx, &[server.url("/p.html")]);

    assert_eq!(res.unwrap().downloaded, 1);
    assert_eq!(std::fs::read(fx.download_dir.path().join("photo.jpg")).unwrap(), b"big");
    assert!(!fx.download_dir.path().join("photo.jpg?v=2.png").exists());
}

#[test]
fn filename_near_name_max_is_downloaded() {
    let name = format!("{}.jpg", "a".repeat(248));
    assert_eq!(name.len(), 252);
    let path = format!("/{}", name);

    let server = ImageServer::start();
    server.serve(&path, b"long".to_vec());
    server.serve("/p.html", format!("<a href=\"{}\">", server.url(&path)));

    let fx = fixture();
    let (res, events) = run_collecting(&fx, &[server.url("/p.html")]);

    assert_eq!(
        res.expect("long filename does not end the run"),
        RunStats {
            downloaded: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(std::fs::read(fx.download_dir.path().join(&name)).unwrap(), b"long");
    assert_eq!(dir_entries(&fx), vec![name]);
    assert_eq!(events.last(), Some(&RunEvent::Done));
}

#[test]
fn sanitized_name_capped_at_name_max_is_downloaded() {
    let path = format!("/img/{}.jpg", "b".repeat(296));

    let server = ImageServer::start();
    server.serve(&path, b"capped".to_vec());
    server.serve("/p.html", format!("<a href=\"{}\">", server.url(&path)));

    let mut fx = fixture();
    fx.config.sanitize_filenames = true;
    let (res, _) = run_collecting(&fx, &[server.url("/p.html")]);

    assert_eq!(res.expect("capped filename does not end the run").downloaded, 1);
    let capped = "b".repeat(255);
    assert_eq!(std::fs::read(fx.download_dir.path().join(&capped)).unwrap(), b"capped");
    assert_eq!(dir_entries(&fx), vec![capped]);
}
