use super::Cell;
use std::io::{self, Write};

fn widths(header: Option<&[String]>, rows: &[&[Cell]]) -> Vec<usize> {
    let columns = header
        .map(|h| h.len())
        .or_else(|| rows.first().map(|r| r.len()))
        .unwrap_or(0);
    let mut widths = vec![0; columns];

    if let Some(header) = header {
        for (w, title) in widths.iter_mut().zip(header) {
            *w = (*w).max(title.chars().count());
        }
    }
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.text().chars().count());
        }
    }
    widths
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{:>width$}", text, width = width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}

fn separator<W: Write>(out: &mut W, widths: &[usize]) -> io::Result<()> {
    let line: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    writeln!(out, "+{}+", line.join("+"))
}

fn cells_line(cells: &[Cell], widths: &[usize]) -> Vec<String> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| pad(&cell.text(), w, cell.is_numeric()))
        .collect()
}

/// Boxed ASCII table; numbers right-aligned, text left-aligned
pub(super) fn write_plain<W: Write>(
    out: &mut W,
    header: Option<&[String]>,
    body: &[Vec<Cell>],
    footer: Option<&[Cell]>,
) -> io::Result<()> {
    let all: Vec<&[Cell]> = body.iter().map(Vec::as_slice).chain(footer).collect();
    let widths = widths(header, &all);

    separator(out, &widths)?;
    if let Some(header) = header {
        let titles: Vec<String> = header
            .iter()
            .zip(&widths)
            .map(|(t, &w)| pad(t, w, false))
            .collect();
        writeln!(out, "| {} |", titles.join(" | "))?;
        separator(out, &widths)?;
    }
    for cells in body {
        writeln!(out, "| {} |", cells_line(cells, &widths).join(" | "))?;
    }
    separator(out, &widths)?;
    if let Some(footer) = footer {
        writeln!(out, "| {} |", cells_line(footer, &widths).join(" | "))?;
        separator(out, &widths)?;
    }
    Ok(())
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
}

/// GitHub-flavored markdown table. Without a header the alignment row is
/// still written so the body parses as a table.
pub(super) fn write_markdown<W: Write>(
    out: &mut W,
    header: Option<&[String]>,
    body: &[Vec<Cell>],
    footer: Option<&[Cell]>,
) -> io::Result<()> {
    let escaped: Vec<Vec<(String, bool)>> = body
        .iter()
        .map(Vec::as_slice)
        .chain(footer)
        .map(|cells| {
            cells
                .iter()
                .map(|c| (escape_markdown(&c.text()), c.is_numeric()))
                .collect()
        })
        .collect();

    let columns = header
        .map(|h| h.len())
        .or_else(|| escaped.first().map(|r| r.len()))
        .unwrap_or(0);
    let mut widths = vec![3; columns];
    if let Some(header) = header {
        for (w, title) in widths.iter_mut().zip(header) {
            *w = (*w).max(title.chars().count());
        }
    }
    for row in &escaped {
        for (w, (text, _)) in widths.iter_mut().zip(row) {
            *w = (*w).max(text.chars().count());
        }
    }

    let numeric: Vec<bool> = (0..columns)
        .map(|i| {
            escaped
                .first()
                .and_then(|row| row.get(i))
                .is_some_and(|(_, n)| *n)
        })
        .collect();

    if let Some(header) = header {
        let titles: Vec<String> = header
            .iter()
            .zip(&widths)
            .map(|(t, &w)| pad(t, w, false))
            .collect();
        writeln!(out, "| {} |", titles.join(" | "))?;
    }
    let rule: Vec<String> = widths
        .iter()
        .zip(&numeric)
        .map(|(&w, &right)| {
            if right {
                format!("{}:", "-".repeat(w - 1))
            } else {
                "-".repeat(w)
            }
        })
        .collect();
    writeln!(out, "| {} |", rule.join(" | "))?;

    for row in &escaped {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|((text, right), &w)| pad(text, w, *right))
            .collect();
        writeln!(out, "| {} |", cells.join(" | "))?;
    }
    Ok(())
}
