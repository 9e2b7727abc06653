use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::benchmark::{self, PageCapture};
use crate::classifier::{self, Classifier, ClassifierOptions, ImgGate, UnrecognizedTag};
use crate::html;
use crate::observation::PageResult;
use crate::stats::{Aggregate, SkippedPage, SurveyReport};
use crate::Args;

/// Layout of a benchmark output directory.
#[derive(Debug, Clone)]
pub struct SurveyPaths {
    pub benchmark: PathBuf,
    pub noscript: PathBuf,
}

impl SurveyPaths {
    pub fn from_output_dir(dir: &Path) -> Self {
        Self {
            benchmark: dir.join("benchmark.csv"),
            noscript: dir.join("noscript"),
        }
    }
}

/// Classification of one logical page.
#[derive(Debug, Clone)]
pub struct PageScan {
    pub url: Url,
    pub host: String,
    pub result: PageResult,
    pub unrecognized: Vec<UnrecognizedTag>,
}

/// Classifies the noscript content of both captures of a page. Returns
/// `None` when neither capture emitted a noscript element.
pub fn scan_page(
    classifier: &Classifier,
    capture: &PageCapture,
    noscript_dir: &Path,
) -> Result<Option<PageScan>> {
    let url = Url::parse(&capture.js.url)
        .with_context(|| format!("Invalid page URL '{}'", capture.js.url))?;

    let mut noscripts = Vec::new();
    for row in capture.captures() {
        if row.noscript {
            let path = noscript_dir.join(format!("{}.html", row.data_file_name));
            noscripts.extend(html::load_noscript_elements(&path)?);
        }
    }

    if noscripts.is_empty() {
        return Ok(None);
    }

    let mut observations = Vec::new();
    let mut unrecognized = Vec::new();
    for noscript in &noscripts {
        let scan = classifier.classify_noscript(noscript, &url);
        observations.extend(scan.observations);
        unrecognized.extend(scan.unrecognized);
    }

    info!(
        action = "scan",
        component = "page",
        host = url.host_str().unwrap_or_default(),
        captured_at = ?capture.js.captured_at(),
        noscript_count = noscripts.len(),
        observation_count = observations.len(),
        "Scanned page"
    );

    Ok(Some(PageScan {
        host: url.host_str().unwrap_or_default().to_string(),
        url,
        result: observations.into_iter().collect(),
        unrecognized,
    }))
}

pub fn run_survey(args: &Args) -> Result<SurveyReport> {
    let start_time = Instant::now();
    info!(action = "start", component = "survey", output_dir = ?args.output_dir, "Starting noscript survey");

    let paths = SurveyPaths::from_output_dir(&args.output_dir);
    let classifier = Classifier::new(ClassifierOptions {
        img_gate: if args.strict_images {
            ImgGate::Strict
        } else {
            ImgGate::Legacy
        },
    });

    let pages = benchmark::pair_captures(benchmark::read_benchmark(&paths.benchmark)?);

    let max_workers = args.workers.unwrap_or_else(|| {
        let cpu_count = num_cpus::get();
        std::cmp::min(cpu_count, 8)
    });
    info!(action = "configure", component = "survey", worker_count = max_workers, page_count = pages.len(), "Using workers for processing");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()
        .context("Failed to build worker pool")?;

    let outcomes: Vec<Result<Option<PageScan>, SkippedPage>> = pool.install(|| {
        pages
            .into_par_iter()
            .map(|page| {
                let capture = page?;
                scan_page(&classifier, &capture, &paths.noscript).map_err(|e| SkippedPage {
                    url: capture.js.url.clone(),
                    reason: format!("{:#}", e),
                })
            })
            .collect()
    });

    // Counts commute, so partial aggregates can merge in any order.
    let aggregate = pool.install(|| {
        outcomes
            .par_iter()
            .filter_map(|outcome| outcome.as_ref().ok().and_then(Option::as_ref))
            .fold(Aggregate::new, |mut acc, scan| {
                acc.record(&scan.result);
                acc
            })
            .reduce(Aggregate::new, Aggregate::merge)
    });

    let mut processed_hosts = Vec::new();
    let mut skipped_pages = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(Some(scan)) => {
                classifier::report_unrecognized(&scan.unrecognized, &scan.url);
                processed_hosts.push(scan.host);
            }
            Ok(None) => {}
            Err(skip) => {
                warn!(action = "skip", component = "survey", url = %skip.url, reason = %skip.reason, "Skipping page");
                skipped_pages.push(skip);
            }
        }
    }

    info!(
        action = "complete",
        component = "survey",
        pages_scanned = aggregate.pages_scanned,
        pages_skipped = skipped_pages.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Survey completed"
    );

    Ok(SurveyReport {
        processed_hosts,
        skipped_pages,
        aggregate,
    })
}

pub fn write_survey_report<W: Write>(
    out: &mut W,
    report: &SurveyReport,
    top: Option<usize>,
) -> io::Result<()> {
    for host in &report.processed_hosts {
        writeln!(out, "Processing {}", host)?;
    }

    writeln!(out)?;
    writeln!(out, "Pages scanned: {}", report.aggregate.pages_scanned)?;
    writeln!(out, "Results:")?;

    for category in report.aggregate.categories() {
        writeln!(out, "\t{}", category)?;
        let ranked = report.aggregate.ranked(category);
        let shown = top.unwrap_or(ranked.len());
        for (label, count) in ranked.into_iter().take(shown) {
            writeln!(out, "\t\t{} ({})", label, count)?;
        }
    }

    Ok(())
}

pub fn print_survey_report(report: &SurveyReport, top: Option<usize>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_survey_report(&mut out, report, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Observation;

    #[test]
    fn test_write_survey_report() {
        let mut aggregate = Aggregate::new();
        aggregate.record(
            &[
                Observation::tracking("google_tag_manager"),
                Observation::alternative("text"),
            ]
            .into_iter()
            .collect(),
        );
        aggregate.record(
            &[
                Observation::tracking("facebook"),
                Observation::tracking("google_tag_manager"),
            ]
            .into_iter()
            .collect(),
        );
        let report = SurveyReport {
            processed_hosts: vec!["a.com".to_string(), "b.com".to_string()],
            skipped_pages: Vec::new(),
            aggregate,
        };

        let mut out = Vec::new();
        write_survey_report(&mut out, &report, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Processing a.com\nProcessing b.com\n\nPages scanned: 2\nResults:\n\
             \talternative_content\n\t\ttext (1)\n\
             \ttracking_metrics\n\t\tgoogle_tag_manager (2)\n\t\tfacebook (1)\n"
        );

        let mut out = Vec::new();
        write_survey_report(&mut out, &report, Some(1)).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("facebook"));
    }

    #[test]
    fn test_report_prints_plain_integers() {
        let mut aggregate = Aggregate::new();
        let page: PageResult = [Observation::other("refresh")].into_iter().collect();
        for _ in 0..1234 {
            aggregate.record(&page);
        }
        let report = SurveyReport {
            processed_hosts: Vec::new(),
            skipped_pages: Vec::new(),
            aggregate,
        };

        let mut out = Vec::new();
        write_survey_report(&mut out, &report, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Pages scanned: 1234\n"));
        assert!(text.contains("\t\trefresh (1234)\n"));
    }
}
