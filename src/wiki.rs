//! Wiki page model.
//! Turns "Tabby Plans Description.txt" into headings, lists and paragraphs.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WikiBlock {
    Title(String),
    Section(String),
    Subsection(String),
    SubSubsection(String),
    List(Vec<String>),
    Paragraph(String),
    Break,
}

const SECTIONS: [&str; 3] = ["Overview", "Key Differences Summary", "Feature Details"];
const SUBSECTIONS: [&str; 4] = [
    "Free Plan",
    "Tabby+ Plan (AED 49/month)",
    "Free Plan Limitations",
    "Tabby+ Advantages",
];
const SUB_SUBSECTION_HINTS: [&str; 4] = ["Instalment", "Rewards", "Advanced", "Delights"];
const LIST_MARKERS: [char; 3] = ['✓', '✗', '*'];

pub fn parse_wiki(text: &str) -> Vec<WikiBlock> {
    let mut blocks = Vec::new();
    let mut list: Option<Vec<String>> = None;

    for raw in text.split('\n') {
        let line = raw.trim();

        let block = if line.is_empty() {
            WikiBlock::Break
        } else if line == "TABBY PLANS COMPARISON" {
            WikiBlock::Title("Tabby Plans Comparison".to_string())
        } else if SECTIONS.contains(&line) {
            WikiBlock::Section(line.to_string())
        } else if SUBSECTIONS.contains(&line) {
            WikiBlock::Subsection(line.to_string())
        } else if line.contains("Plan") && SUB_SUBSECTION_HINTS.iter().any(|h| line.contains(h)) {
            WikiBlock::SubSubsection(line.to_string())
        } else if let Some(rest) = line.strip_prefix(LIST_MARKERS) {
            list.get_or_insert_with(Vec::new).push(rest.trim_start().to_string());
            continue;
        } else {
            WikiBlock::Paragraph(line.to_string())
        };

        if let Some(items) = list.take() {
            blocks.push(WikiBlock::List(items));
        }
        blocks.push(block);
    }

    if let Some(items) = list {
        blocks.push(WikiBlock::List(items));
    }
    blocks
}
