//! Grid detection over layout-preserving text (`pdftotext -layout`).
//!
//! Cells are runs of text separated by at least `column_gap` spaces. Columns
//! are the union of overlapping cell spans across the page's tabular lines,
//! so every line's cells land on the same column positions.

use tabtrack_config::StrategyParams;

use crate::error::DetectError;
use crate::grid::PageGrid;
use crate::strategy::GridSource;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Clone)]
pub struct LayoutTextSource {
    text: String,
}

impl LayoutTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Pages are separated by form feeds.
    pub fn pages(&self, column_gap: usize) -> Vec<PageGrid> {
        let gap = column_gap.max(1);
        let mut pages: Vec<PageGrid> = self
            .text
            .split('\u{000C}')
            .enumerate()
            .map(|(i, page)| layout_page(i + 1, page, gap))
            .collect();
        while pages.last().is_some_and(PageGrid::is_blank) {
            pages.pop();
        }
        pages
    }
}

impl GridSource for LayoutTextSource {
    fn detect(&self, params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError> {
        if self.text.trim().is_empty() {
            return Err(DetectError::Failed("no text layer".into()));
        }
        Ok(self.pages(params.column_gap))
    }
}

fn layout_page(number: usize, text: &str, gap: usize) -> PageGrid {
    let lines: Vec<Vec<Span>> = text.lines().map(|l| split_spans(l, gap)).collect();
    let columns = column_bounds(&lines);

    let rows = lines
        .iter()
        .map(|spans| {
            if spans.is_empty() {
                return Vec::new();
            }
            let mut row = vec![String::new(); columns.len().max(1)];
            for span in spans {
                let c = column_for(span, &columns);
                if row[c].is_empty() {
                    row[c] = span.text.clone();
                } else {
                    row[c].push(' ');
                    row[c].push_str(&span.text);
                }
            }
            row
        })
        .collect();
    PageGrid::new(number, rows)
}

/// Cells of one line, positioned by character column.
fn split_spans(line: &str, gap: usize) -> Vec<Span> {
    let chars: Vec<char> = line
        .chars()
        .flat_map(|c| {
            let n = if c == '\t' { gap } else { 1 };
            std::iter::repeat(if c == '\t' { ' ' } else { c }).take(n)
        })
        .collect();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ' ' {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while i < chars.len() {
            if chars[i] != ' ' {
                i += 1;
                end = i;
                continue;
            }
            let run = chars[i..].iter().take_while(|c| **c == ' ').count();
            if run >= gap || i + run == chars.len() {
                break;
            }
            i += run;
        }
        spans.push(Span {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });
        i = end;
    }
    spans
}

/// Merge overlapping spans of the tabular lines into column intervals.
/// Lines with fewer than half the page's widest span count (titles,
/// wrapped fragments) are placed but do not shape the columns.
fn column_bounds(lines: &[Vec<Span>]) -> Vec<(usize, usize)> {
    let widest = lines.iter().map(Vec::len).max().unwrap_or(0);
    let threshold = (widest / 2).max(2);

    let mut intervals: Vec<(usize, usize)> = lines
        .iter()
        .filter(|spans| spans.len() >= threshold)
        .flatten()
        .map(|s| (s.start, s.end))
        .collect();
    intervals.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Column with the largest overlap, else the nearest one.
fn column_for(span: &Span, columns: &[(usize, usize)]) -> usize {
    let overlap = |&(s, e): &(usize, usize)| span.end.min(e).saturating_sub(span.start.max(s));
    let distance = |&(s, e): &(usize, usize)| {
        if span.end <= s {
            s - span.end
        } else {
            span.start.saturating_sub(e)
        }
    };

    let best = columns
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| overlap(c))
        .filter(|(_, c)| overlap(c) > 0)
        .map(|(i, _)| i);
    best.or_else(|| {
        columns
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| distance(c))
            .map(|(i, _)| i)
    })
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[Span]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn spans_split_on_wide_gaps_only() {
        let spans = split_spans("FL  61D 729000018669   Biscayne Bay", 2);
        assert_eq!(texts(&spans), vec!["FL", "61D 729000018669", "Biscayne Bay"]);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[1].start, 4);

        let spans = split_spans("FL  61D 729000018669   Biscayne Bay", 3);
        assert_eq!(texts(&spans), vec!["FL  61D 729000018669", "Biscayne Bay"]);
    }

    #[test]
    fn trailing_spaces_do_not_extend_cells() {
        let spans = split_spans("  abc   ", 2);
        assert_eq!(texts(&spans), vec!["abc"]);
        assert_eq!((spans[0].start, spans[0].end), (2, 5));
    }

    #[test]
    fn lines_align_to_shared_columns() {
        let text = "\
Returns report
Slip           Tablets        Total
729000018669   1662, 1674     2
729000018670                  0
";
        let pages = LayoutTextSource::new(text).pages(2);
        assert_eq!(pages.len(), 1);
        let rows = &pages[0].rows;
        assert_eq!(rows[1], vec!["Slip", "Tablets", "Total"]);
        assert_eq!(rows[2], vec!["729000018669", "1662, 1674", "2"]);
        assert_eq!(rows[3], vec!["729000018670", "", "0"]);
        assert_eq!(rows[0][0], "Returns report");
    }

    #[test]
    fn form_feed_splits_pages() {
        let text = "a   b\n1   2\n\u{000C}c   d\n\u{000C}";
        let pages = LayoutTextSource::new(text).pages(2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].rows[0], vec!["c", "d"]);
    }

    #[test]
    fn empty_text_fails_detection() {
        let err = LayoutTextSource::new("  \n ")
            .detect(&StrategyParams::named("tight"))
            .unwrap_err();
        assert!(matches!(err, DetectError::Failed(_)));
    }
}
