use std::path::Path;

use anstyle::{AnsiColor, Color, Style};
use gnucash_split::{Compression, OpeningBalances, SplitJob, SplitReport};

/// Human-readable account of a finished run, one line per entry.
pub fn summary_lines(job: &SplitJob, report: &SplitReport) -> Vec<String> {
    let compression = match job.compression {
        Compression::Gzip => "gzipped",
        Compression::None => "not gzipped",
    };
    let output = job.output.display();

    let [book] = report.books.as_slice() else {
        let kept: usize = report.books.iter().map(|book| book.kept).sum();
        return vec![
            format!("Processed {} books", report.books.len()),
            format!("Wrote {kept} transactions to {output} ({compression})"),
        ];
    };

    let mut lines = vec![
        format!(
            "Wrote {} transactions to {output} ({compression})",
            book.kept
        ),
        format!(
            "Skipped {} prior transactions and {} later transactions",
            book.prior, book.later
        ),
    ];
    if book.opening_balances > 0 {
        let destination = match job.options.opening_balances {
            OpeningBalances::Statements => {
                let files: Vec<String> = report
                    .statements
                    .iter()
                    .map(|statement| statement_path(&job.statement_dir, &statement.file_name()))
                    .collect();
                format!("written to {}", files.join(", "))
            }
            _ => "written as a starting balance transaction".to_string(),
        };
        lines.push(format!(
            "Prior balance for {} accounts {destination}",
            book.opening_balances
        ));
    }
    lines
}

fn statement_path(dir: &Path, file_name: &str) -> String {
    dir.join(file_name).display().to_string()
}

pub fn print_summary(job: &SplitJob, report: &SplitReport) {
    let done = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let reset = Style::new();

    println!("{}━━━ Summary ━━━{}", Style::new().bold(), reset);
    for line in summary_lines(job, report) {
        println!("  {done}✓{reset} {line}");
    }
}
