//! Terminal rendering for human output.

use std::io::{self, Write};

use colored::Colorize;

use faldone_store::{DocumentSummary, SearchResult};

/// Header line in green, then the snippet indented by a tab with matched
/// terms in bold.
pub fn search_result(out: &mut impl Write, result: &SearchResult) -> io::Result<()> {
    let header = format!(
        "{}. {} (relevancy {:.2}):",
        result.id, result.title, result.score
    );
    writeln!(out, "{}", header.bright_green())?;

    let mut body = String::from("\t");
    for segment in result.snippet.segments() {
        let text = segment.text.replace('\n', "\n\t");
        if segment.matched {
            body.push_str(&text.bold().to_string());
        } else {
            body.push_str(&text);
        }
    }
    writeln!(out, "{}", body)
}

pub fn summary(out: &mut impl Write, doc: &DocumentSummary) -> io::Result<()> {
    if doc.labels.is_empty() {
        writeln!(out, "{}. {} [{}]", doc.id, doc.title, doc.mime)
    } else {
        writeln!(
            out,
            "{}. {} [{}] {}",
            doc.id,
            doc.title,
            doc.mime,
            doc.labels.dimmed()
        )
    }
}
