use std::fmt::Write;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{RankedPeer, Ranking, RespondentRanking};

/// Peer slots in each respondent block of the printed document.
pub const REPORT_SLOTS: usize = 10;

pub const DEFAULT_PAGE_TEMPLATE: &str = include_str!("../templates/report.tex");

const REPLACE_MARKER: &str = "% REPLACE ME";

const BLOCK_TEMPLATE: &str = r"    \begin{minipage}[b][0.19\textheight][t]{\textwidth}
        \textbf{XX_NAME}

        XX_COHORT Grade

        \bigskip

        \begin{tabularx}{\textwidth}{|| Y | Y || Y | Y ||}
            Student & Compatibility & Student & Compatibility \\
            \hline
            XX_STUDENT_1 & XX_COMPATIBILITY_1 & XX_STUDENT_6 & XX_COMPATIBILITY_6 \\
            XX_STUDENT_2 & XX_COMPATIBILITY_2 & XX_STUDENT_7 & XX_COMPATIBILITY_7 \\
            XX_STUDENT_3 & XX_COMPATIBILITY_3 & XX_STUDENT_8 & XX_COMPATIBILITY_8 \\
            XX_STUDENT_4 & XX_COMPATIBILITY_4 & XX_STUDENT_9 & XX_COMPATIBILITY_9 \\
            XX_STUDENT_5 & XX_COMPATIBILITY_5 & XX_STUDENT_10 & XX_COMPATIBILITY_10 \\
        \end{tabularx}

    \end{minipage}";

/// Drops `@domain` from an id when it carries that suffix.
pub fn display_name<'a>(id: &'a str, strip_domain: Option<&str>) -> &'a str {
    strip_domain
        .and_then(|domain| id.strip_suffix(domain))
        .and_then(|name| name.strip_suffix('@'))
        .unwrap_or(id)
}

pub fn escape_tex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_console(rankings: &[Ranking], limit: usize, strip_domain: Option<&str>) -> String {
    let mut output = String::new();

    for ranking in rankings {
        let _ = writeln!(output, "== {} ({} respondents) ==", ranking.cohort, ranking.len());

        if ranking.is_empty() {
            let _ = writeln!(output, "No respondents in this cohort.");
            continue;
        }

        for entry in &ranking.entries {
            let _ = writeln!(output, "{}", display_name(&entry.respondent_id, strip_domain));
            if entry.peers.is_empty() {
                let _ = writeln!(output, "    no peers to compare");
            }
            for peer in entry.peers.iter().take(limit) {
                let _ = writeln!(
                    output,
                    "    {:<40} similarity {:>7.2}%  difference {:.3}  identical {}",
                    display_name(&peer.peer_id, strip_domain),
                    peer.score.similarity,
                    peer.score.difference,
                    peer.score.identical
                );
            }
        }
        let _ = writeln!(output);
    }

    output
}

pub fn render_json(rankings: &[Ranking]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rankings)
}

fn render_block(name: &str, cohort: &str, peers: &[RankedPeer], strip_domain: Option<&str>) -> String {
    let mut block = BLOCK_TEMPLATE
        .replace("XX_NAME", &escape_tex(name))
        .replace("XX_COHORT", &escape_tex(cohort));

    // Highest slot first so XX_STUDENT_1 is never replaced inside XX_STUDENT_10.
    for slot in (1..=REPORT_SLOTS).rev() {
        let (student, compatibility) = match peers.get(slot - 1) {
            Some(peer) => (
                escape_tex(display_name(&peer.peer_id, strip_domain)),
                format!("{:.2}\\%", peer.score.similarity),
            ),
            None => (String::new(), String::new()),
        };
        block = block
            .replace(&format!("XX_STUDENT_{slot}"), &student)
            .replace(&format!("XX_COMPATIBILITY_{slot}"), &compatibility);
    }

    block
}

fn log_listing(ranking: &Ranking, entry: &RespondentRanking, strip_domain: Option<&str>) {
    let respondent = display_name(&entry.respondent_id, strip_domain);
    debug!(cohort = %ranking.cohort, respondent, peers = entry.peers.len(), "respondent listing");
    for peer in &entry.peers {
        debug!(
            respondent,
            peer = display_name(&peer.peer_id, strip_domain),
            similarity = peer.score.similarity,
            "peer listed"
        );
    }
}

/// Fills the page template with one block per respondent, `per_page`
/// blocks to a page.
pub fn build_document(
    ranking: &Ranking,
    page_template: &str,
    strip_domain: Option<&str>,
    per_page: usize,
    generated_on: NaiveDate,
) -> String {
    let blocks: Vec<String> = ranking
        .entries
        .iter()
        .map(|entry| {
            log_listing(ranking, entry, strip_domain);
            render_block(
                display_name(&entry.respondent_id, strip_domain),
                &ranking.cohort,
                &entry.peers,
                strip_domain,
            )
        })
        .collect();

    let pages: Vec<String> = blocks
        .chunks(per_page.max(1))
        .map(|page| page.join(" \\\\\n"))
        .collect();

    let mut output = String::new();
    let _ = writeln!(
        output,
        "% Compatibility report for cohort {} generated {}",
        ranking.cohort, generated_on
    );
    output.push_str(&page_template.replace(REPLACE_MARKER, &pages.join("\n\\newpage\n")));
    output
}

pub fn document_file_name(cohort: &str) -> String {
    format!("{cohort}-output.tex")
}
