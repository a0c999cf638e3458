//! Render module.
//! Maps the data models into a small element tree and serializes it to HTML.
//! No knowledge of any UI toolkit; callers decide where the markup goes.

use std::fmt::Write as _;
use std::mem::take;

use crate::benefits::BenefitRow;
use crate::comparison::{modal_content, Badge, ComparisonRow};
use crate::wiki::WikiBlock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Text(String),
}

impl Node {
    pub fn el(tag: &'static str, children: Vec<Node>) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(&escape(s)),
            Node::Element { tag, attrs, children } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {}=\"{}\"", name, escape(value));
                }
                out.push('>');
                if *tag == "br" {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn cell(text: &str) -> Node {
    Node::el("td", vec![Node::text(text)])
}

pub fn benefits_table(rows: &[BenefitRow]) -> Node {
    let head = ["Type", "Features", "Free Plan", "Tabby+ (AED 49/month)", "Description"]
        .iter()
        .map(|h| Node::el("th", vec![Node::text(*h)]))
        .collect();

    let body = rows
        .iter()
        .map(|row| {
            Node::el(
                "tr",
                vec![
                    cell(&row.kind),
                    cell(&row.features),
                    cell(&row.free_plan),
                    cell(&row.tabby_plan),
                    cell(&row.description),
                ],
            )
        })
        .collect();

    Node::el(
        "div",
        vec![Node::el(
            "table",
            vec![
                Node::el("thead", vec![Node::el("tr", head)]),
                Node::el("tbody", body),
            ],
        )
        .class("benefits-table")],
    )
    .class("benefits-table-container")
}

fn plan_cell(content: &str) -> Node {
    if content.is_empty() {
        return Node::el("td", Vec::new());
    }
    let badge = Badge::classify(content);
    let inner = match (badge.css_class(), badge.suffix()) {
        (Some(class), Some(suffix)) => {
            Node::el("span", vec![Node::text(format!("{} {}", content, suffix))]).class(class)
        }
        (Some(class), None) => Node::el("span", vec![Node::text(content)]).class(class),
        _ => Node::text(content),
    };
    Node::el("td", vec![inner])
}

fn comparison_row(row: &ComparisonRow, show_hidden: bool) -> Node {
    let mut classes = Vec::new();
    if row.hidden && !show_hidden {
        classes.push("hidden-row");
    }

    let tr = if row.is_section_divider() {
        classes.push("section-divider");
        Node::el(
            "tr",
            vec![Node::el("td", vec![Node::text(&row.features)]).attr("colspan", "3")],
        )
    } else {
        let mut feature = vec![Node::el("div", vec![Node::text(&row.features)]).class("feature-name")];
        if !row.subline.is_empty() {
            feature.push(Node::el("div", vec![Node::text(&row.subline)]).class("feature-subline"));
        }
        Node::el(
            "tr",
            vec![
                Node::el("td", feature),
                plan_cell(&row.free_plan),
                plan_cell(&row.tabby_plan),
            ],
        )
    };

    if classes.is_empty() {
        tr
    } else {
        tr.class(&classes.join(" "))
    }
}

/// Table body for a comparison CSV. Hidden rows stay in the tree with the
/// `hidden-row` class unless `show_hidden` is set.
pub fn comparison_body(rows: &[ComparisonRow], show_hidden: bool) -> Node {
    Node::el(
        "tbody",
        rows.iter().map(|r| comparison_row(r, show_hidden)).collect(),
    )
}

fn flush_text(nodes: &mut Vec<Node>, plain: &mut String) {
    if !plain.is_empty() {
        nodes.push(Node::Text(take(plain)));
    }
}

/// `**strong**` and `*em*` within one line.
fn inline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                flush_text(&mut nodes, &mut plain);
                nodes.push(Node::el("strong", vec![Node::text(&after[..end])]));
                rest = &after[end + 2..];
                continue;
            }
        }
        if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*') {
                flush_text(&mut nodes, &mut plain);
                nodes.push(Node::el("em", vec![Node::text(&after[..end])]));
                rest = &after[end + 1..];
                continue;
            }
        }
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush_text(&mut nodes, &mut plain);
    nodes
}

/// Body of the feature details modal. Lines starting with `- ` become list
/// items; one `<ul>` spans from the first item to the last. Every line break
/// becomes a `<br>`.
pub fn modal_body(rows: &[ComparisonRow], feature: &str) -> Option<Node> {
    let content = modal_content(rows, feature)?;
    let lines: Vec<&str> = content.split('\n').collect();
    let first = lines.iter().position(|l| l.starts_with("- "));
    let last = lines.iter().rposition(|l| l.starts_with("- "));

    let mut body = Vec::new();
    let mut items = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let inside = matches!((first, last), (Some(f), Some(l)) if i >= f && i <= l);
        if i > 0 {
            let br = Node::el("br", Vec::new());
            if inside && first.is_some_and(|f| i > f) {
                items.push(br);
            } else {
                body.push(br);
            }
        }

        let nodes = match line.strip_prefix("- ") {
            Some(item) => vec![Node::el("li", inline(item))],
            None => inline(line),
        };
        if inside {
            items.extend(nodes);
        } else {
            body.extend(nodes);
        }

        if last == Some(i) {
            body.push(Node::el("ul", take(&mut items)));
        }
    }
    Some(Node::el("div", body).class("modal-body"))
}

pub fn wiki_page(blocks: &[WikiBlock]) -> Vec<Node> {
    blocks
        .iter()
        .map(|block| match block {
            WikiBlock::Title(s) => Node::el("h1", vec![Node::text(s)]),
            WikiBlock::Section(s) => Node::el("h2", vec![Node::text(s)]),
            WikiBlock::Subsection(s) => Node::el("h3", vec![Node::text(s)]),
            WikiBlock::SubSubsection(s) => Node::el("h4", vec![Node::text(s)]),
            WikiBlock::Paragraph(s) => Node::el("p", vec![Node::text(s)]),
            WikiBlock::Break => Node::el("br", Vec::new()),
            WikiBlock::List(items) => Node::el(
                "ul",
                items.iter().map(|i| Node::el("li", vec![Node::text(i)])).collect(),
            ),
        })
        .collect()
}

pub fn to_html(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let node = Node::el("p", vec![Node::text("<b>&\"")]).attr("title", "a\"b");
        assert_eq!(node.to_html(), "<p title=\"a&quot;b\">&lt;b&gt;&amp;&quot;</p>");
    }

    #[test]
    fn test_benefits_table_rows() {
        let rows = vec![BenefitRow {
            kind: "Rewards".to_string(),
            features: "Cashback".to_string(),
            free_plan: "Basic".to_string(),
            tabby_plan: "5%".to_string(),
            description: "Monthly".to_string(),
            ..BenefitRow::default()
        }];
        let html = benefits_table(&rows).to_html();
        assert!(html.starts_with("<div class=\"benefits-table-container\"><table class=\"benefits-table\">"));
        assert!(html.contains(
            "<tr><td>Rewards</td><td>Cashback</td><td>Basic</td><td>5%</td><td>Monthly</td></tr>"
        ));
    }

    #[test]
    fn test_comparison_divider_and_hidden() {
        let rows = vec![
            ComparisonRow {
                features: "Payments".to_string(),
                ..ComparisonRow::default()
            },
            ComparisonRow {
                features: "Split in 12".to_string(),
                free_plan: "Paid".to_string(),
                tabby_plan: "Free".to_string(),
                hidden: true,
                ..ComparisonRow::default()
            },
        ];
        let html = comparison_body(&rows, false).to_html();
        assert!(html.contains("<tr class=\"section-divider\"><td colspan=\"3\">Payments</td></tr>"));
        assert!(html.contains("<tr class=\"hidden-row\">"));
        assert!(html.contains("<span class=\"paid-text\">Paid ✗</span>"));
        assert!(html.contains("<span class=\"free-text\">Free ✓</span>"));

        let shown = comparison_body(&rows, true).to_html();
        assert!(!shown.contains("hidden-row"));
    }

    #[test]
    fn test_subline_and_plain_cell() {
        let row = ComparisonRow {
            features: "Support".to_string(),
            subline: "24/7".to_string(),
            tabby_plan: "Priority".to_string(),
            ..ComparisonRow::default()
        };
        let html = comparison_row(&row, false).to_html();
        assert_eq!(
            html,
            "<tr><td><div class=\"feature-name\">Support</div><div class=\"feature-subline\">24/7</div></td><td></td><td>Priority</td></tr>"
        );
    }

    fn modal_row(feature: &str, modal: &str) -> ComparisonRow {
        ComparisonRow {
            features: feature.to_string(),
            free_plan: "Free".to_string(),
            modal_content: modal.to_string(),
            ..ComparisonRow::default()
        }
    }

    #[test]
    fn test_inline_emphasis() {
        assert_eq!(
            to_html(&inline("Pay **later** or *now*, 5 * 2")),
            "Pay <strong>later</strong> or <em>now</em>, 5 * 2"
        );
    }

    #[test]
    fn test_modal_body_list_and_breaks() {
        let rows = vec![modal_row(
            "Cashback",
            "Earn **5%** back\n- on *groceries*\n- on travel\nPaid monthly",
        )];
        let html = modal_body(&rows, "cashback").unwrap().to_html();
        assert_eq!(
            html,
            "<div class=\"modal-body\">Earn <strong>5%</strong> back<br>\
             <ul><li>on <em>groceries</em></li><br><li>on travel</li></ul>\
             <br>Paid monthly</div>"
        );
    }

    #[test]
    fn test_modal_body_missing() {
        let rows = vec![modal_row("Cashback", "")];
        assert_eq!(modal_body(&rows, "Cashback"), None);
        assert_eq!(modal_body(&rows, "Lounge"), None);
    }

    #[test]
    fn test_wiki_page() {
        let blocks = vec![
            WikiBlock::Section("Overview".to_string()),
            WikiBlock::List(vec!["a".to_string(), "b".to_string()]),
            WikiBlock::Break,
        ];
        assert_eq!(
            to_html(&wiki_page(&blocks)),
            "<h2>Overview</h2><ul><li>a</li><li>b</li></ul><br>"
        );
    }
}
