use davmirror_core::{MirrorReport, TraversalResult};

/// Format a byte size into a human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1}G", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1}M", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1}K", b as f64 / KB as f64),
        b => format!("{b}B"),
    }
}

/// One-line summary of a finished run
pub fn format_report(report: &MirrorReport) -> String {
    let mut line = format!(
        "{} downloaded ({}), {} skipped, {}",
        plural(report.files_downloaded, "file"),
        format_size(report.bytes_downloaded),
        report.files_skipped,
        plural(report.directories, "directory"),
    );
    if report.has_failures() {
        line.push_str(&format!(
            "; {} failed, {} unlisted",
            plural(report.files_failed, "download"),
            plural(report.listings_failed, "directory"),
        ));
    }
    line
}

/// Dry-run listing: one line per directory and file, then a summary
pub fn format_plan(plan: &TraversalResult) -> String {
    let mut out = String::new();
    for directory in &plan.directories {
        out.push_str(&format!("d {directory}/\n"));
    }
    let mut total = 0;
    for file in &plan.files {
        total += file.size;
        out.push_str(&format!("- {} ({})\n", file.path, format_size(file.size)));
    }
    out.push_str(&format!(
        "{} to download ({}), {} skipped",
        plural(plan.files.len() as u64, "file"),
        format_size(total),
        plan.skipped,
    ));
    if plan.failed_listings > 0 {
        out.push_str(&format!(
            ", {} could not be listed",
            plural(plan.failed_listings, "directory")
        ));
    }
    out
}

fn plural(count: u64, noun: &str) -> String {
    match (count, noun) {
        (1, _) => format!("1 {noun}"),
        (_, "directory") => format!("{count} directories"),
        _ => format!("{count} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use davmirror_core::{RemoteFile, RemotePath};

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0M");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0G");
    }

    #[test]
    fn test_format_report_clean() {
        let report = MirrorReport {
            directories: 2,
            files_downloaded: 2,
            bytes_downloaded: 30,
            ..Default::default()
        };
        assert_eq!(
            format_report(&report),
            "2 files downloaded (30B), 0 skipped, 2 directories"
        );
    }

    #[test]
    fn test_format_report_with_failures() {
        let report = MirrorReport {
            directories: 1,
            files_downloaded: 1,
            bytes_downloaded: 2048,
            files_failed: 1,
            listings_failed: 3,
            ..Default::default()
        };
        assert_eq!(
            format_report(&report),
            concat!(
                "1 file downloaded (2.0K), 0 skipped, 1 directory; ",
                "1 download failed, 3 directories unlisted"
            )
        );
    }

    #[test]
    fn test_format_plan() {
        let plan = TraversalResult {
            directories: vec![RemotePath::new("docs/notes")],
            files: vec![RemoteFile {
                path: RemotePath::new("docs/a.txt"),
                size: 10,
                modified: Utc::now(),
            }],
            skipped: 1,
            failed_listings: 0,
        };
        assert_eq!(
            format_plan(&plan),
            "d docs/notes/\n- docs/a.txt (10B)\n1 file to download (10B), 1 skipped"
        );
    }
}
