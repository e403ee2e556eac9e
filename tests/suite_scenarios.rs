//! End-to-end scenarios over a scratch suite: update, run, freshness and
//! configuration failures, driven through the library API.

mod common;

use std::fs;
use std::time::{Duration, SystemTime};

use common::{two_test_fixture, BrokenConverter, EchoConverter, Fixture};
use conform::backend::Backend;
use conform::errors::ConfigErrorKind;
use conform::mtime::FsModTimes;
use conform::report::BufferSink;
use conform::{Harness, HarnessError, Tally, TestSuite};
use filetime::{set_file_mtime, FileTime};

fn at(secs: u64) -> FileTime {
    FileTime::from_system_time(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
}

#[test]
fn update_then_run_passes_every_backend() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();

    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let written = suite.update(&mut h, None, None, true).unwrap();
    assert_eq!(written.len(), 2);
    assert!(fx.exists("data/paragraphs-docbook.xml"));
    assert!(fx.exists("data/lists-html5.html"));

    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let tally = suite.run(&mut h, None, None).unwrap();
    assert_eq!(
        tally,
        Tally {
            passed: 2,
            failed: 0,
            skipped: 0
        }
    );
    let out = sink.stdout_text();
    assert!(out.contains("TOTAL PASSED:  2"));
    assert!(!out.contains("TOTAL FAILED"));
    assert!(!out.contains("TOTAL SKIPPED"));
    assert!(sink.stderr.is_empty());
}

#[test]
fn first_update_reports_created_datadir() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, false).unwrap();

    let creating: Vec<_> = sink
        .stdout
        .iter()
        .filter(|l| l.starts_with("CREATING: "))
        .collect();
    assert_eq!(creating.len(), 1);
    assert!(sink
        .stdout
        .iter()
        .any(|l| l.starts_with("WRITING: ") && l.ends_with("lists-html5.html")));
}

#[test]
fn missing_golden_file_is_skipped() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, true).unwrap();
    fs::remove_file(fx.path("data/lists-html5.html")).unwrap();

    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let tally = suite.run(&mut h, None, None).unwrap();
    assert_eq!(
        tally,
        Tally {
            passed: 1,
            failed: 0,
            skipped: 1
        }
    );
    assert!(sink
        .stdout
        .iter()
        .any(|l| l.starts_with("SKIPPED: html5: ")));
    assert!(sink.stdout_text().contains("TOTAL SKIPPED: 1"));
}

#[test]
fn update_only_rewrites_outdated_golden_files() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, true).unwrap();

    let golden_one = fx.path("data/paragraphs-docbook.xml");
    let golden_two = fx.path("data/lists-html5.html");
    set_file_mtime(&golden_one, at(1_000_000)).unwrap();
    set_file_mtime(&golden_two, at(1_000_000)).unwrap();
    set_file_mtime(fx.path("cases/paragraphs.txt"), at(2_000_000)).unwrap();
    set_file_mtime(fx.path("cases/lists.txt"), at(500_000)).unwrap();

    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let written = suite.update(&mut h, None, None, false).unwrap();
    assert_eq!(written, [suite.tests[0].backend_filename(Backend::Docbook)]);
    assert_eq!(converter.call_count(), 1);
}

#[test]
fn force_rewrites_current_golden_files() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, true).unwrap();
    let again = suite.update(&mut h, None, None, false).unwrap();
    assert!(again.is_empty());
    let forced = suite.update(&mut h, None, None, true).unwrap();
    assert_eq!(forced.len(), 2);
}

#[test]
fn changed_output_fails_with_a_diff_on_stderr() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, true).unwrap();

    fx.write("cases/lists.txt", "- one\n- three\n");
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let tally = suite.run(&mut h, None, None).unwrap();
    assert_eq!(tally.failed, 1);
    assert_eq!(tally.passed, 1);
    assert!(tally.has_failures());

    let golden = suite.tests[1].backend_filename(Backend::Html5);
    assert_eq!(sink.stderr[0], format!("+++ {}", golden.display()));
    assert_eq!(sink.stderr[1], "--- got");
    assert!(sink.stderr.contains(&"-<p>- three</p>".to_string()));
    assert!(sink.stderr.contains(&"+<p>- two</p>".to_string()));
    assert_eq!(sink.stderr.last().map(String::as_str), Some(""));
    assert!(sink.stdout_text().contains("TOTAL FAILED:  1"));
}

#[test]
fn backend_filter_limits_the_run() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    suite.update(&mut h, None, None, true).unwrap();

    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let tally = suite.run(&mut h, None, Some(Backend::Html5)).unwrap();
    assert_eq!(tally.total(), 1);
    assert_eq!(converter.calls.borrow()[0].1, Backend::Html5);
    assert!(sink.stdout[0].starts_with("2: Lists"));
}

#[test]
fn attributes_reach_the_converter() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let lines = suite.tests[1]
        .generate_expected(Backend::Html5, &converter)
        .unwrap();
    assert_eq!(lines[0], "<!-- html5 -->");
    assert_eq!(lines[1], "<!-- icons=None -->");
}

#[test]
fn missing_source_skips_every_backend() {
    let fx = two_test_fixture();
    fs::remove_file(fx.path("cases/lists.txt")).unwrap();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);

    let run = suite.tests[1].run(&mut h, None).unwrap();
    assert_eq!(run.tally().skipped, 1);
    assert!(sink.stdout.iter().any(|l| l.starts_with("MISSING: ")));
    assert_eq!(converter.call_count(), 0);

    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);
    let written = suite.tests[1].update(&mut h, None, true).unwrap();
    assert!(written.is_empty());
}

#[test]
fn unknown_directive_aborts_before_any_conversion() {
    let fx = Fixture::new();
    fx.conf("%%%%\nBad\n% source\na.txt\n% colour\nred\n");
    let err = TestSuite::load(fx.path("conformance.conf")).unwrap_err();
    match err {
        HarnessError::Config(e) => assert_eq!(
            e.kind,
            ConfigErrorKind::UnknownDirective {
                name: "colour".to_string()
            }
        ),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn converter_failure_aborts_the_run() {
    let fx = two_test_fixture();
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&BrokenConverter, &FsModTimes, &mut sink);
    let err = suite.update(&mut h, None, None, true).unwrap_err();
    assert!(matches!(err, HarnessError::Convert(_)));
}

#[test]
fn disabled_test_runs_only_by_number() {
    let fx = Fixture::new();
    fx.conf("%%%%\n!Broken\n% source\nbroken.txt\n% backends\n['html4']\n");
    fx.write("broken.txt", "text\n");
    let suite = TestSuite::load(fx.path("conformance.conf")).unwrap();
    let converter = EchoConverter::new();
    let mut sink = BufferSink::new();
    let mut h = Harness::new(&converter, &FsModTimes, &mut sink);

    assert!(suite.update(&mut h, None, None, true).unwrap().is_empty());
    assert_eq!(suite.update(&mut h, Some(1), None, true).unwrap().len(), 1);
    assert_eq!(suite.run(&mut h, None, None).unwrap().total(), 0);
    assert_eq!(suite.run(&mut h, Some(1), None).unwrap().passed, 1);
}
