//! Statistics and run summaries
//!
//! This module renders page-store statistics and the summary of a finished
//! crawl for the command line.

use crate::crawler::CrawlReport;
use crate::storage::{PageStatistics, Storage};
use crate::SitewalkError;
use std::fmt::Write;

/// Number of pages listed at the end of a run summary
pub const SUMMARY_PAGE_LIMIT: usize = 5;

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(PageStatistics)` - Successfully loaded statistics
/// * `Err(SitewalkError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<PageStatistics, SitewalkError> {
    Ok(storage.get_statistics()?)
}

/// Renders page-store statistics
pub fn format_statistics(stats: &PageStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "  Total pages: {}", stats.total_pages);
    let _ = writeln!(out, "  Total characters: {}", stats.total_characters);

    let average = if stats.total_pages > 0 {
        stats.total_characters as f64 / stats.total_pages as f64
    } else {
        0.0
    };
    let _ = writeln!(out, "  Average page length: {:.0} characters", average);
    let _ = writeln!(
        out,
        "  First crawl: {}",
        stats.first_crawl_time.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "  Last crawl: {}",
        stats.last_crawl_time.as_deref().unwrap_or("-")
    );
    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &PageStatistics) {
    print!("{}", format_statistics(stats));
}

/// Renders the outcome of a crawl, listing the first few pages
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl {} ===\n", report.state);
    let _ = writeln!(out, "  Pages crawled: {}", report.pages.len());
    let _ = writeln!(out, "  Failures: {}", report.failures.len());
    if !report.interrupted.is_empty() {
        let _ = writeln!(out, "  Interrupted: {}", report.interrupted.len());
    }
    let _ = writeln!(out, "  URLs visited: {}", report.visited_count);
    let _ = writeln!(out, "  URLs left in queue: {}", report.pending.len());
    let _ = writeln!(out, "  Session: {}", report.auth_state);
    let _ = writeln!(out, "  Elapsed: {:.1}s", report.elapsed.as_secs_f64());

    if !report.pages.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "First pages:");
        for page in report.pages.iter().take(SUMMARY_PAGE_LIMIT) {
            let title = if page.title.is_empty() {
                "(untitled)"
            } else {
                page.title.as_str()
            };
            let _ = writeln!(
                out,
                "  - {} [{}] ({} chars, {} links)",
                title, page.url, page.full_text_length, page.extracted_link_count
            );
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failures:");
        for failure in report.failures.iter().take(SUMMARY_PAGE_LIMIT) {
            let _ = writeln!(out, "  - {}: {}", failure.url, failure.error);
        }
        if report.failures.len() > SUMMARY_PAGE_LIMIT {
            let _ = writeln!(
                out,
                "  ... and {} more",
                report.failures.len() - SUMMARY_PAGE_LIMIT
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchFailure, PageResult};
    use crate::state::{AuthState, CrawlState};
    use crate::storage::SqliteStorage;
    use crate::FetchError;
    use std::time::Duration;

    #[test]
    fn test_load_and_format_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .save_page("https://example.com/", "Home", "abcd", 0, None)
            .unwrap();
        storage
            .save_page("https://example.com/a", "A", "ef", 0, None)
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        let text = format_statistics(&stats);

        assert!(text.contains("Total pages: 2"));
        assert!(text.contains("Total characters: 6"));
        assert!(text.contains("Average page length: 3 characters"));
    }

    #[test]
    fn test_format_statistics_empty_store() {
        let text = format_statistics(&PageStatistics::default());
        assert!(text.contains("Total pages: 0"));
        assert!(text.contains("First crawl: -"));
    }

    #[test]
    fn test_format_report_lists_first_pages() {
        let pages = (0..7)
            .map(|i| PageResult {
                url: format!("https://example.com/{}", i),
                title: if i == 0 { String::new() } else { format!("Page {}", i) },
                text: String::new(),
                full_text_length: 10,
                extracted_link_count: 2,
            })
            .collect();
        let report = CrawlReport {
            state: CrawlState::Completed,
            pages,
            failures: vec![FetchFailure {
                url: "https://example.com/gone".to_string(),
                error: FetchError::HttpStatus { status: 404 },
            }],
            visited_count: 9,
            pending: Vec::new(),
            interrupted: vec![url::Url::parse("https://example.com/slow").unwrap()],
            auth_state: AuthState::Unauthenticated,
            elapsed: Duration::from_millis(1500),
        };

        let text = format_report(&report);

        assert!(text.contains("=== Crawl completed ==="));
        assert!(text.contains("Pages crawled: 7"));
        assert!(text.contains("Interrupted: 1"));
        assert!(text.contains("(untitled) [https://example.com/0]"));
        assert!(text.contains("Page 4"));
        assert!(!text.contains("Page 5"));
        assert!(text.contains("https://example.com/gone: HTTP status 404"));
    }
}
