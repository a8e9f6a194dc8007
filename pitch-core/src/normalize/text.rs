//! Free-text pitch extraction.
//!
//! Recognizes section labels emphasized anywhere (`**Problem:**`), at the start
//! of a line (`- Problem:`), or as a markdown heading (`## Problem`). A label may
//! carry a qualifier (`The Problem`, `Target Audience`). A section runs until the
//! next label.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{PitchContent, NOT_SPECIFIED};

const LABELS: &str = r"problem[ \t]+statement|target[ \t]*market|revenue[ \t]*model|business[ \t]*model|call[ \t]*to[ \t]*action|next[ \t]*steps|get[ \t]*started|monetization|audience|problem|issue|solution|answer|market|cta";

/// Optional words in front of a label, e.g. `Target Audience`.
const QUALIFIER: &str = r"(?:(?:the|target|key|our)[ \t]+)?";
const QUALIFIER_WORDS: [&str; 4] = ["the", "target", "key", "our"];

/// Length of the description excerpt when no plain paragraph exists.
const EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Problem,
    Solution,
    TargetMarket,
    RevenueModel,
    CallToAction,
}

impl Section {
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug)]
struct LabelHit {
    section: Section,
    start: usize,
    end: usize,
}

fn label_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            concat!(
                r"(?im)\*\*[ \t]*{q}(?P<emph>{labels})[ \t]*:?[ \t]*\*\*(?:[ \t]*:)?",
                r"|^[ \t]*#{{1,6}}[ \t]*(?:\*\*)?[ \t]*{q}(?P<head>{labels})[ \t]*:?[ \t]*(?:\*\*)?[ \t]*$",
                r"|^[ \t]*(?:[-*#>]+[ \t]*)*{q}(?P<plain>{labels})[ \t]*:",
            ),
            q = QUALIFIER,
            labels = LABELS
        ))
        .ok()
    })
    .as_ref()
}

fn emphasis_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").ok()).as_ref()
}

fn section_for(label: &str) -> Option<Section> {
    let key: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    section_for_key(&key).or_else(|| {
        QUALIFIER_WORDS
            .iter()
            .find_map(|q| key.strip_prefix(q))
            .and_then(section_for_key)
    })
}

fn section_for_key(key: &str) -> Option<Section> {
    match key {
        "problem" | "problemstatement" | "issue" => Some(Section::Problem),
        "solution" | "answer" => Some(Section::Solution),
        "targetmarket" | "audience" | "market" => Some(Section::TargetMarket),
        "revenuemodel" | "businessmodel" | "monetization" => Some(Section::RevenueModel),
        "calltoaction" | "cta" | "nextsteps" | "getstarted" => Some(Section::CallToAction),
        _ => None,
    }
}

fn label_hits(text: &str) -> Vec<LabelHit> {
    let Some(re) = label_re() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps
                .name("emph")
                .or_else(|| caps.name("head"))
                .or_else(|| caps.name("plain"))?;
            Some(LabelHit {
                section: section_for(label.as_str())?,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

fn is_label_line(line: &str) -> bool {
    label_re()
        .and_then(|re| re.find(line.trim()))
        .is_some_and(|m| m.start() == 0)
}

fn clean_section(raw: &str) -> String {
    raw.replace("**", "")
        .trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == '*' || c == ':')
        .trim()
        .to_string()
}

fn extract_title(text: &str) -> Option<String> {
    if let Some(re) = emphasis_re() {
        let emphasized = re.captures_iter(text).find_map(|caps| {
            let inner = caps.get(1)?.as_str().trim().trim_end_matches(':').trim();
            if inner.is_empty() || section_for(inner).is_some() {
                None
            } else {
                Some(inner.to_string())
            }
        });
        if emphasized.is_some() {
            return emphasized;
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_label_line(line))
        .find_map(|line| {
            let heading = line.trim_start_matches('#').replace("**", "");
            let heading = heading.trim();
            (!heading.is_empty()).then(|| heading.to_string())
        })
}

fn extract_description(text: &str) -> Option<String> {
    let paragraph = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with(&['#', '-', '*'][..]) && !is_label_line(p))
        .find_map(|p| {
            let cleaned = p.replace("**", "");
            let cleaned = cleaned
                .trim_start_matches(|c: char| c.is_whitespace() || "#-*".contains(c))
                .trim();
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        });
    if paragraph.is_some() {
        return paragraph;
    }

    let stripped: String = text.chars().filter(|c| !"#*_-".contains(*c)).collect();
    let excerpt: String = stripped.trim().chars().take(EXCERPT_CHARS).collect();
    let excerpt = excerpt.trim();
    (!excerpt.is_empty()).then(|| format!("{}...", excerpt))
}

/// Extract a pitch from natural-language text. Returns `None` for blank text.
pub fn extract(text: &str) -> Option<PitchContent> {
    let text = text.replace("\r\n", "\n");
    if text.trim().is_empty() {
        return None;
    }

    let hits = label_hits(&text);
    let mut sections: [Option<String>; 5] = Default::default();
    for (i, hit) in hits.iter().enumerate() {
        let stop = hits.get(i + 1).map_or(text.len(), |next| next.start);
        let body = clean_section(&text[hit.end..stop]);
        let slot = &mut sections[hit.section.index()];
        if slot.is_none() && !body.is_empty() {
            *slot = Some(body);
        }
    }

    let or_default = |v: Option<String>| v.unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let [problem, solution, target_market, revenue_model, call_to_action] = sections.map(or_default);

    Some(PitchContent {
        title: or_default(extract_title(&text)),
        description: or_default(extract_description(&text)),
        problem,
        solution,
        target_market,
        revenue_model,
        call_to_action,
    })
}
