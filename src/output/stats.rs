//! Console statistics for a finished crawl

use crate::output::traits::CrawlSummary;

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The crawl summary to display
pub fn print_statistics(summary: &CrawlSummary) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Seed: {}", summary.seed);
    println!("  Status: {}", summary.status);
    println!("  Repositories exported: {}", summary.total_repositories);
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!();

    println!("Fetches:");
    println!("  Pages fetched: {}", summary.pages_fetched);
    println!("  Listing pages: {}", summary.listing_pages);
    println!("  Failures: {}", summary.fetch_failures);
    println!("  Retries: {}", summary.retries);
    println!();

    if summary.duplicates_dropped > 0 || summary.degraded_records > 0 || summary.abandoned > 0 {
        println!("Anomalies:");
        println!("  Duplicates dropped: {}", summary.duplicates_dropped);
        println!("  Degraded records: {}", summary.degraded_records);
        println!("  Abandoned on stop: {}", summary.abandoned);
        println!();
    }

    if !summary.language_breakdown.is_empty() {
        println!("Top Languages:");
        for (lang, count) in summary.language_breakdown.iter().take(10) {
            let percentage = share(*count, summary.total_repositories);
            println!("  {}: {} ({:.1}%)", lang, count, percentage);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        summary.success_rate(),
        summary.pages_fetched,
        summary.pages_fetched + summary.fetch_failures
    );
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64) * 100.0
}
