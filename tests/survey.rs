use std::fs;
use std::path::Path;

use noscan::{run_survey, Args, Category, Observation};

const HEADER: &str = "url,timestamp,jsEnabled,scriptCount,noscript,dataFileName,load1\n";

fn write_capture(dir: &Path, name: &str, html: &str) {
    fs::write(dir.join("noscript").join(format!("{}.html", name)), html).unwrap();
}

fn args(dir: &Path, workers: usize) -> Args {
    Args {
        output_dir: dir.to_path_buf(),
        top: None,
        verbose: false,
        workers: Some(workers),
        strict_images: false,
    }
}

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("noscript")).unwrap();

    let rows = [
        "https://a.com/,1589961600000,true,4,true,a_com_js_1,10",
        "https://a.com/,1589961601000,false,4,true,a_com_nojs_1,10",
        "https://b.com/,1589961602000,true,0,false,b_com_js_1,10",
        "https://b.com/,1589961603000,false,0,false,b_com_nojs_1,10",
        "https://c.com/,1589961604000,true,2,true,c_com_js_1,10",
        "https://c.com/,1589961605000,false,2,false,c_com_nojs_1,10",
        "https://d.com/,1589961606000,TRUE,1,True,d_com_js_1,10",
        "https://d.com/,1589961607000,FALSE,1,false,d_com_nojs_1,10",
        "https://e.com/,1589961608000,true,1,false,e_com_js_1,10",
        "https://e.com/,1589961609000,false,1,true,e_com_nojs_1,10",
    ];
    fs::write(
        dir.path().join("benchmark.csv"),
        format!("{}{}\n", HEADER, rows.join("\n")),
    )
    .unwrap();

    write_capture(
        dir.path(),
        "a_com_js_1",
        r#"<noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-X" height="0" width="0"></iframe></noscript>"#,
    );
    write_capture(
        dir.path(),
        "a_com_nojs_1",
        "<noscript><img src=\"https://www.facebook.com/tr?id=1\"></noscript>\n\
         <noscript><img src=\"https://www.facebook.com/tr?id=2\"><object data=\"x.swf\"></object></noscript>",
    );
    // no capture file for c.com
    write_capture(dir.path(), "d_com_js_1", "<noscript></noscript>");
    write_capture(dir.path(), "e_com_nojs_1", "<noscript>Enable JS</noscript>");

    dir
}

#[test]
fn survey_classifies_deduplicates_and_skips() {
    let dir = setup();
    let report = run_survey(&args(dir.path(), 2)).unwrap();

    assert_eq!(report.processed_hosts, vec!["a.com", "d.com", "e.com"]);
    assert_eq!(report.skipped_pages.len(), 1);
    assert_eq!(report.skipped_pages[0].url, "https://c.com/");

    let aggregate = &report.aggregate;
    assert_eq!(aggregate.pages_scanned, 3);
    assert_eq!(aggregate.count(&Observation::tracking("google_tag_manager")), 1);
    assert_eq!(aggregate.count(&Observation::tracking("facebook")), 1);
    // a noscript holding only text has no element children, so it is empty
    assert_eq!(aggregate.count(&Observation::other("empty")), 2);
    assert!(aggregate.ranked(Category::AlternativeContent).is_empty());
}

#[test]
fn survey_is_independent_of_worker_count() {
    let dir = setup();
    let single = run_survey(&args(dir.path(), 1)).unwrap();
    let many = run_survey(&args(dir.path(), 4)).unwrap();

    assert_eq!(single.aggregate, many.aggregate);
    assert_eq!(single.processed_hosts, many.processed_hosts);
}

#[test]
fn survey_fails_without_benchmark_table() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_survey(&args(dir.path(), 1)).is_err());
}
