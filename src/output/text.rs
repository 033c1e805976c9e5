//! Human-readable text output

use super::DrawReport;
use crate::whitelist::Item;

/// Print a draw report to stdout
pub fn print_report(report: &DrawReport) {
    print!("{}", format_report(report));
}

/// Render a draw report
///
/// Drawn numbers come one per line, so the output can be piped straight into other
/// tools; the header and footer carry the context.
pub fn format_report(report: &DrawReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Mode: {} | Eligible: {} of {} ({})\n",
        report.mode,
        report.whitelist.len(),
        report.universe_size,
        format_items(&report.whitelist)
    ));
    for item in &report.draws {
        out.push_str(&format!("{}\n", item));
    }
    if report.refreshes_applied > 0 {
        out.push_str(&format!("Remote refreshes applied: {}\n", report.refreshes_applied));
    }
    out
}

/// Collapse sorted items into ranges, e.g. `1-3,5`
pub fn format_items(items: &[Item]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }

    let mut parts = Vec::new();
    let mut start = items[0];
    let mut end = items[0];
    for &item in &items[1..] {
        if item == end + 1 {
            end = item;
            continue;
        }
        parts.push(format_run(start, end));
        start = item;
        end = item;
    }
    parts.push(format_run(start, end));
    parts.join(",")
}

fn format_run(start: Item, end: Item) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::DrawMode;
    use crate::whitelist::Whitelist;

    #[test]
    fn test_format_items() {
        assert_eq!(format_items(&[]), "none");
        assert_eq!(format_items(&[4]), "4");
        assert_eq!(format_items(&[1, 2, 3, 5, 7, 8]), "1-3,5,7-8");
    }

    #[test]
    fn test_format_report() {
        let whitelist = Whitelist::from_items(10, [1, 2, 3, 7]).unwrap();
        let mut report = DrawReport::new(DrawMode::Regular, &whitelist, None);
        report.record(3);
        report.record(7);

        let text = format_report(&report);
        assert_eq!(text, "Mode: regular | Eligible: 4 of 10 (1-3,7)\n3\n7\n");

        report.refreshes_applied = 2;
        assert!(format_report(&report).ends_with("Remote refreshes applied: 2\n"));
    }
}
