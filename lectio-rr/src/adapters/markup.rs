//! HTML flattening for provider pages
//!
//! Pages are parsed with `scraper` and read back as text blocks: each run of
//! text inside the same block element (heading, paragraph, list item, cell,
//! div) is one block, and `<br>` starts a new one. Script and style bodies are
//! skipped; html5ever has already decoded character references.

use scraper::Html;

/// Elements whose text forms its own block
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "main", "article", "section", "header", "footer", "nav", "aside", "div",
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "table", "tr",
    "td", "th", "blockquote", "pre", "figure", "figcaption",
];

/// Elements whose text is never page content
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Flatten an HTML document to text, one block per line
pub fn html_to_text(html: &str) -> String {
    text_blocks(html).join("\n")
}

/// Non-empty text blocks of an HTML document, in document order
///
/// Whitespace inside a block (including non-breaking spaces) collapses to a
/// single space.
pub fn text_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut current_block = None;

    for node in document.tree.root().descendants() {
        if let Some(element) = node.value().as_element() {
            if element.name() == "br" {
                flush(&mut current, &mut blocks);
            }
            continue;
        }
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let mut skipped = false;
        let mut block = None;
        for ancestor in node.ancestors() {
            let Some(element) = ancestor.value().as_element() else {
                continue;
            };
            if SKIPPED_TAGS.contains(&element.name()) {
                skipped = true;
                break;
            }
            if block.is_none() && BLOCK_TAGS.contains(&element.name()) {
                block = Some(ancestor.id());
            }
        }
        if skipped {
            continue;
        }

        if block != current_block {
            flush(&mut current, &mut blocks);
            current_block = block;
        }
        current.push(' ');
        current.push_str(text);
    }
    flush(&mut current, &mut blocks);

    blocks
}

fn flush(current: &mut String, blocks: &mut Vec<String>) {
    let compact = compact_ws(current);
    if !compact.is_empty() {
        blocks.push(compact);
    }
    current.clear();
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
